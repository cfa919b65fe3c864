use cadtris_signals::Hook;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum CadtrisError {
    /// A privileged host call was attempted outside creation/teardown or off
    /// the main context. Always a bug in the calling code.
    #[error("privileged call during '{hook}' hook (only legal during created/destroy on the main context)")]
    RoutingViolation { hook: Hook },

    #[error("action failed during '{hook}' hook: {source}")]
    ActionFailed {
        hook: Hook,
        #[source]
        source: BoxError,
    },

    #[error("action panicked during '{hook}' hook: {message}")]
    ActionPanicked { hook: Hook, message: String },

    #[error("failed to spawn ticker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("command has not been created")]
    NotCreated,

    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CadtrisError>;
