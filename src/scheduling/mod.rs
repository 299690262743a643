mod scheduler;
mod service;

pub use scheduler::{ALERT_SOUND_CAP, BreakScheduler, WAKE_GUARD_TIMEOUT};
pub use service::{ControlCommand, ReminderService};
