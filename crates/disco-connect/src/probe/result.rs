//! Probe verdicts.

use std::fmt;

use disco_discovery::StartupError;

/// Terminal outcome of one probe run.
#[derive(Debug)]
pub enum ProbeResult {
    /// The target completed the handshake.
    Success,
    /// The deadline passed first.
    Timeout,
    /// The run was cancelled; carries the reason (`interrupt`, `terminated`).
    Interrupted(String),
    /// No probe was attempted.
    StartupFailure(StartupError),
}

impl ProbeResult {
    /// Process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success => 0,
            _ => 1,
        }
    }

    /// True for [`ProbeResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Successfully initiated connection with remote!"),
            Self::Timeout => f.write_str("Timeout: failed to connect to remote"),
            Self::Interrupted(reason) => write!(f, "Received exit signal: {reason}"),
            Self::StartupFailure(err) => write!(f, "startup failed: {err}"),
        }
    }
}
