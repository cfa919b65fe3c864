mod common;

use cadtris_core::{ConsumerPump, DrainReport, ExecutionRouter, Hook, Submission, WakeupSignal};
use common::ChannelWakeup;
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn funnel() -> (Arc<ExecutionRouter>, ConsumerPump, Arc<ChannelWakeup>, Receiver<String>) {
    let (wakeup, wake_rx) = ChannelWakeup::new();
    let router = Arc::new(ExecutionRouter::new(WakeupSignal::new(
        "cadtris_custom_event",
        wakeup.clone(),
    )));
    let pump = ConsumerPump::new(router.clone());
    (router, pump, wakeup, wake_rx)
}

fn record(log: &Arc<Mutex<Vec<String>>>, name: &str) -> impl FnOnce() -> anyhow::Result<()> + Send + 'static {
    let log = log.clone();
    let name = name.to_string();
    move || {
        log.lock().unwrap().push(name);
        Ok(())
    }
}

#[test]
fn test_single_pump_preserves_submission_order() {
    let (router, pump, _, _) = funnel();
    router.enter(Hook::InputChanged);
    let log = Arc::new(Mutex::new(Vec::new()));

    let names: Vec<String> = (0..20).map(|i| format!("a{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        if i % 2 == 0 {
            router.submit(record(&log, name)).unwrap();
        } else {
            let remote = router.clone();
            let action = record(&log, name);
            thread::spawn(move || remote.submit(action).unwrap())
                .join()
                .unwrap();
        }
    }
    assert_eq!(router.pending(), 20);

    let report = pump.pump();
    assert_eq!(report.executed, 20);
    assert_eq!(*log.lock().unwrap(), names);
}

#[test]
fn test_created_on_main_runs_inline_and_skips_queue() {
    let (router, _pump, wakeup, wake_rx) = funnel();
    let log = Arc::new(Mutex::new(Vec::new()));

    let outcome = router.submit(record(&log, "inline")).unwrap();

    assert_eq!(outcome, Submission::Inline);
    assert_eq!(*log.lock().unwrap(), vec!["inline"]);
    assert_eq!(router.pending(), 0);
    assert_eq!(wakeup.count(), 0);
    assert!(wake_rx.try_recv().is_err());
}

#[test]
fn test_repeated_wakeups_are_safe() {
    let (router, pump, wakeup, wake_rx) = funnel();
    router.enter(Hook::KeyDown);

    // Empty pump before anything was queued.
    assert_eq!(pump.pump(), DrainReport::default());

    let log = Arc::new(Mutex::new(Vec::new()));
    for i in 0..5 {
        router.submit(record(&log, &format!("k{i}"))).unwrap();
    }
    // Coalesced: one request for five submissions.
    assert_eq!(wakeup.count(), 1);

    // The host may still call the pump as many times as it likes.
    let mut total = 0;
    for _ in 0..5 {
        total += pump.pump().executed;
    }
    assert_eq!(total, 5);
    assert_eq!(wake_rx.try_iter().count(), 1);
    assert_eq!(log.lock().unwrap().len(), 5);
}

#[test]
fn test_no_action_starves_under_concurrent_producers() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 500;

    let (router, pump, _, wake_rx) = funnel();
    router.enter(Hook::Execute);
    let log = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let router = router.clone();
            let log = log.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let log = log.clone();
                    router
                        .submit(move || {
                            log.lock().unwrap().push((p, i));
                            Ok(())
                        })
                        .unwrap();
                    if i % 50 == 0 {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    // Main context: pump only when the host delivers a wakeup.
    let expected = PRODUCERS * PER_PRODUCER;
    let mut executed = 0;
    while executed < expected {
        wake_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("an action was left in the queue without a pending wakeup");
        executed += pump.pump().executed;
    }
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(executed, expected);
    assert_eq!(router.pending(), 0);

    let log = log.lock().unwrap();
    for p in 0..PRODUCERS {
        let seen: Vec<usize> = log.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
        assert_eq!(seen, (0..PER_PRODUCER).collect::<Vec<_>>(), "producer {p}");
    }
}

#[test]
fn test_teardown_discards_queued_actions() {
    let (router, pump, _, _) = funnel();
    router.enter(Hook::KeyDown);
    let log = Arc::new(Mutex::new(Vec::new()));
    router.submit(record(&log, "stale-1")).unwrap();
    router.submit(record(&log, "stale-2")).unwrap();

    router.enter(Hook::Destroy);
    router.close();
    assert_eq!(router.reset_queue(), 2);

    // Stale wakeup delivered after teardown.
    assert_eq!(pump.pump(), DrainReport::default());

    let remote = router.clone();
    let late = record(&log, "late");
    let outcome = thread::spawn(move || remote.submit(late).unwrap())
        .join()
        .unwrap();
    assert_eq!(outcome, Submission::Rejected);
    assert_eq!(router.submit(record(&log, "late-main")).unwrap(), Submission::Rejected);

    assert_eq!(pump.pump(), DrainReport::default());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_failed_action_does_not_stop_drain() {
    let (router, pump, _, _) = funnel();
    router.enter(Hook::Execute);
    let log = Arc::new(Mutex::new(Vec::new()));

    let background = {
        let router = router.clone();
        let a = record(&log, "A");
        let b_log = log.clone();
        let c = record(&log, "C");
        thread::spawn(move || {
            router.submit(a).unwrap();
            router
                .submit(move || {
                    b_log.lock().unwrap().push("B".to_string());
                    anyhow::bail!("B failed")
                })
                .unwrap();
            router.submit(c).unwrap();
        })
    };
    background.join().unwrap();
    assert_eq!(router.pending(), 3);

    let report = pump.pump();

    assert_eq!(report, DrainReport { executed: 3, failed: 1 });
    assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);
    assert_eq!(router.pending(), 0);
}
