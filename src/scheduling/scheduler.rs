use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::appsettings;
use crate::error::ReminderError;
use crate::platform::{
    AlarmPayload, AlertSound, NotificationPresenter, NotificationPriority, PermissionProbe,
    RegistrationId, WakeTimer,
};
use crate::reminder::{ReminderConfig, ReminderSession};

/// Hard cap on the audible alert.
pub const ALERT_SOUND_CAP: Duration = Duration::from_secs(5);

/// Scoped wake guard around the firing side effects. The timeout is the
/// release guarantee; no explicit release exists.
pub const WAKE_GUARD_TIMEOUT: Duration = Duration::from_secs(6);

/// The repeating-alarm scheduler. Periodicity comes from re-arming a
/// one-shot wake timer on every firing rather than from a native periodic
/// timer, trading minor drift for resilience against process death.
pub struct BreakScheduler {
    timer: Arc<dyn WakeTimer>,
    permissions: Arc<dyn PermissionProbe>,
    notifier: Arc<dyn NotificationPresenter>,
    sound: Arc<dyn AlertSound>,
    pending: Option<RegistrationId>,
    session: ReminderSession,
}

impl BreakScheduler {
    pub fn new(
        timer: Arc<dyn WakeTimer>,
        permissions: Arc<dyn PermissionProbe>,
        notifier: Arc<dyn NotificationPresenter>,
        sound: Arc<dyn AlertSound>,
    ) -> Self {
        Self {
            timer,
            permissions,
            notifier,
            sound,
            pending: None,
            session: ReminderSession::default(),
        }
    }

    pub fn session(&self) -> &ReminderSession {
        &self.session
    }

    /// Registers a one-shot wake timer at `now + interval`, replacing any
    /// previously pending registration (idempotent re-arm, never additive).
    /// Silently does nothing when the exact-timer capability is gone or the
    /// backend refuses the registration; the cycle stops until the next
    /// user-initiated toggle.
    pub async fn arm(&mut self, config: &ReminderConfig) {
        if !self.permissions.can_schedule_exact().await {
            log::warn!("exact timer capability unavailable, not arming");
            self.session.disarmed();
            return;
        }

        if let Some(id) = self.pending.take() {
            self.timer.cancel(id).await;
        }

        let trigger_at = next_trigger_at(Utc::now(), config);
        let payload = AlarmPayload {
            interval_minutes: config.interval_minutes(),
        };

        match self.timer.register(trigger_at, payload).await {
            Ok(id) => {
                self.pending = Some(id);
                self.session.armed(trigger_at);
                log::info!("break reminder armed, next trigger at {trigger_at}");
            }
            Err(error) => {
                self.session.disarmed();
                log::warn!("{}", ReminderError::Scheduling(error));
            }
        }
    }

    /// Timer elapsed. Runs the alert side effects under the wake guard, then
    /// immediately re-arms with the interval carried in the payload.
    pub async fn on_fire(&mut self, payload: AlarmPayload) {
        self.session.fired();
        self.pending = None;

        if tokio::time::timeout(WAKE_GUARD_TIMEOUT, self.run_alert())
            .await
            .is_err()
        {
            log::warn!("alert side effects hit the wake guard timeout");
        }

        match ReminderConfig::from_minutes(payload.interval_minutes) {
            Ok(config) => self.arm(&config).await,
            Err(_) => {
                self.session.disarmed();
                log::warn!("fired payload carried an invalid interval, not re-arming");
            }
        }
    }

    /// Removes any pending registration; idempotent when none exists. An
    /// already-dispatched firing cannot be interrupted.
    pub async fn cancel(&mut self) {
        if let Some(id) = self.pending.take() {
            self.timer.cancel(id).await;
        }
        self.session.disarmed();
    }

    async fn run_alert(&self) {
        let settings = appsettings::get();

        self.notifier.ensure_channel().await;
        if let Err(error) = self
            .notifier
            .post(
                &settings.notification.title,
                &settings.notification.body,
                NotificationPriority::High,
            )
            .await
        {
            log::warn!("could not post the break notification: {error:#}");
        }

        if let Err(error) = self.sound.play(ALERT_SOUND_CAP).await {
            log::warn!("{}", ReminderError::Playback(error));
        }
    }
}

pub(crate) fn next_trigger_at(now: DateTime<Utc>, config: &ReminderConfig) -> DateTime<Utc> {
    now + config.interval()
}
