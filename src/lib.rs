//! Posture break reminders on top of the host's alarm and notification
//! facilities. The core is the re-arming [`scheduling::BreakScheduler`] and
//! the permission-gated [`gate::EnablementGate`]; everything else is wiring.

pub mod appsettings;
pub mod error;
pub mod gate;
pub mod platform;
pub mod reminder;
pub mod scheduling;
