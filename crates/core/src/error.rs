use thiserror::Error;

/// Errors surfaced while bringing a media session bridge up.
///
/// Steady-state bridge calls never return these; they are reserved for
/// construction and configuration loading.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The platform runtime the session depends on could not be initialized
    #[error("failed to initialize platform runtime: {0}")]
    RuntimeInit(String),

    /// The OS media session object could not be created or configured
    #[error("failed to create media session: {0}")]
    SessionCreate(String),

    /// Another bridge is already alive in this process
    #[error("a media session bridge is already active in this process")]
    AlreadyActive,

    /// No OS media session exists for the current target
    #[error("media sessions are not supported on {0}")]
    Unsupported(&'static str),

    /// A single call into the OS session failed
    #[error("media session call failed: {0}")]
    Backend(String),

    #[error("invalid bridge configuration: {0}")]
    Config(String),
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
