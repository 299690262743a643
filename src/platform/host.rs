use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notify_rust::{Notification, Urgency};
use tokio::process::Command;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    AlarmPayload, AlertSound, NotificationPresenter, NotificationPriority, PermissionProbe,
    RegistrationId, WakeTimer,
};

const CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

struct PendingTimer {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Wake timer backed by one spawned sleep task per registration. Firings are
/// delivered over the channel handed in at construction, so the consumer
/// sees them as independent asynchronous activations.
pub struct TokioWakeTimer {
    fired: mpsc::Sender<AlarmPayload>,
    pending: Mutex<HashMap<RegistrationId, PendingTimer>>,
    next_id: AtomicU64,
}

impl TokioWakeTimer {
    pub fn new(fired: mpsc::Sender<AlarmPayload>) -> Self {
        Self {
            fired,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl WakeTimer for TokioWakeTimer {
    async fn register(
        &self,
        trigger_at: DateTime<Utc>,
        payload: AlarmPayload,
    ) -> anyhow::Result<RegistrationId> {
        let delay = (trigger_at - Utc::now()).to_std().unwrap_or_default();
        let token = CancellationToken::new();
        let task_token = token.child_token();
        let fired = self.fired.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if fired.send(payload).await.is_err() {
                        log::warn!("timer fired but nobody is listening");
                    }
                }
            }
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut pending = self.pending.lock().await;
        pending.retain(|_, timer| !timer.task.is_finished());
        pending.insert(id, PendingTimer { token, task });

        Ok(id)
    }

    async fn cancel(&self, id: RegistrationId) {
        let Some(timer) = self.pending.lock().await.remove(&id) else {
            return;
        };
        timer.token.cancel();
        let _ = tokio::time::timeout(CANCEL_TIMEOUT, timer.task).await;
    }
}

/// Desktop hosts have no runtime-revocable grants, so both capabilities are
/// always reported present and the request flows are immediate no-ops. This
/// mirrors OS versions that predate mediated consent.
pub struct DesktopPermissions;

#[async_trait]
impl PermissionProbe for DesktopPermissions {
    async fn can_schedule_exact(&self) -> bool {
        true
    }

    async fn can_post_notifications(&self) -> bool {
        true
    }

    async fn request_exact_permission(&self) {
        log::info!("exact timer capability is implicitly granted on this host");
    }

    async fn request_notification_permission(&self) {
        log::info!("notification capability is implicitly granted on this host");
    }
}

/// Notification presentation over the desktop notification daemon.
pub struct DesktopNotifier {
    channel_ready: AtomicBool,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            channel_ready: AtomicBool::new(false),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPresenter for DesktopNotifier {
    async fn ensure_channel(&self) {
        // The daemon needs no channel object; remember the setup anyway so
        // repeated calls stay cheap and observable.
        if !self.channel_ready.swap(true, Ordering::SeqCst) {
            log::debug!("posture reminder notification channel ready");
        }
    }

    async fn post(
        &self,
        title: &str,
        body: &str,
        priority: NotificationPriority,
    ) -> anyhow::Result<()> {
        let mut notification = Notification::new();
        notification
            .summary(title)
            .body(body)
            .appname("posture-pal")
            .icon("alarm-clock");
        if priority == NotificationPriority::High {
            notification.urgency(Urgency::Critical);
        }
        notification
            .show()
            .context("notification daemon rejected the post")?;

        Ok(())
    }
}

/// System alert playback via whichever command-line player is available,
/// killed once the cap elapses.
pub struct CommandAlertSound;

const SOUND_CANDIDATES: &[(&str, &str)] = &[
    (
        "paplay",
        "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
    ),
    (
        "paplay",
        "/usr/share/sounds/freedesktop/stereo/complete.oga",
    ),
    ("aplay", "/usr/share/sounds/alsa/Front_Center.wav"),
];

#[async_trait]
impl AlertSound for CommandAlertSound {
    async fn play(&self, cap: Duration) -> anyhow::Result<()> {
        let (player, file) = SOUND_CANDIDATES
            .iter()
            .find(|(_, file)| std::path::Path::new(file).exists())
            .ok_or_else(|| anyhow::anyhow!("no system alert sound available"))?;

        let mut child = Command::new(player)
            .arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("could not start {player}"))?;

        if tokio::time::timeout(cap, child.wait()).await.is_err() {
            child.kill().await.ok();
        }

        Ok(())
    }
}
