use thiserror::Error;

/// OS capabilities the reminder depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ExactTimer,
    PostNotifications,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::ExactTimer => write!(f, "exact timer scheduling"),
            Capability::PostNotifications => write!(f, "post notifications"),
        }
    }
}

/// Everything here degrades to "reminder does not fire"; nothing is fatal to
/// the process.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("the {0} capability has not been granted")]
    PermissionDenied(Capability),
    #[error("break interval must be at least one minute")]
    InvalidInterval,
    #[error("alert playback failed: {0:#}")]
    Playback(anyhow::Error),
    #[error("wake timer registration was refused: {0:#}")]
    Scheduling(anyhow::Error),
}
