//! External collaborators the core consumes: the OS wake timer, permission
//! query/request flows, notification presentation and alert playback. All of
//! them are given primitives behind trait seams; the host implementations
//! live in `host.rs`.

mod host;

pub use host::{CommandAlertSound, DesktopNotifier, DesktopPermissions, TokioWakeTimer};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type RegistrationId = u64;

/// Carried by a registered timer and read back at fire time: no persistent
/// config store exists, so the interval travels with the firing itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmPayload {
    pub interval_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPriority {
    Default,
    High,
}

/// One-shot wake-capable timer registration with fire-even-in-low-power
/// semantics.
#[async_trait]
pub trait WakeTimer: Send + Sync {
    async fn register(
        &self,
        trigger_at: DateTime<Utc>,
        payload: AlarmPayload,
    ) -> anyhow::Result<RegistrationId>;

    /// Removes a pending registration. Must tolerate ids that already fired
    /// or were cancelled before.
    async fn cancel(&self, id: RegistrationId);
}

/// Capability queries plus the mediated request flows. Requests return
/// immediately; outcomes land later as a recomputed
/// [`PermissionState`](crate::gate::PermissionState).
#[async_trait]
pub trait PermissionProbe: Send + Sync {
    async fn can_schedule_exact(&self) -> bool;
    async fn can_post_notifications(&self) -> bool;
    async fn request_exact_permission(&self);
    async fn request_notification_permission(&self);
}

#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// One-time channel setup; must be idempotent.
    async fn ensure_channel(&self);
    async fn post(
        &self,
        title: &str,
        body: &str,
        priority: NotificationPriority,
    ) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AlertSound: Send + Sync {
    /// Plays the system alert with alarm-class attributes, stopping once
    /// `cap` elapses.
    async fn play(&self, cap: std::time::Duration) -> anyhow::Result<()>;
}
