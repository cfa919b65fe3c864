use super::Display;
use crate::error::Result;
use crate::funnel::Submission;
use cadtris_signals::{Cell, Snapshot};
use std::sync::Mutex;

/// Renders a snapshot as text, top row first. Occupied cells are `#`.
pub fn render_ascii(snapshot: &Snapshot) -> String {
    let width = snapshot.width as usize;
    let mut out = String::with_capacity((width + 3) * (snapshot.height as usize + 1));
    for y in 0..snapshot.height as i32 {
        out.push('|');
        for x in 0..snapshot.width as i32 {
            let occupied = snapshot
                .get(Cell::new(x, y))
                .map(|v| v.opacity > 0)
                .unwrap_or(false);
            out.push(if occupied { '#' } else { '.' });
        }
        out.push_str("|\n");
    }
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push_str("+\n");
    out
}

/// Headless display; keeps the latest frame in memory.
#[derive(Default)]
pub struct AsciiDisplay {
    state: Mutex<AsciiState>,
}

#[derive(Default)]
struct AsciiState {
    frame: String,
    frames: usize,
}

impl AsciiDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> String {
        self.state
            .lock()
            .map(|s| s.frame.clone())
            .unwrap_or_default()
    }

    pub fn frames_rendered(&self) -> usize {
        self.state.lock().map(|s| s.frames).unwrap_or(0)
    }
}

impl Display for AsciiDisplay {
    fn update(&self, snapshot: Snapshot) -> Result<Submission> {
        let frame = render_ascii(&snapshot);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.frame = frame;
        state.frames += 1;
        Ok(Submission::Inline)
    }
}
