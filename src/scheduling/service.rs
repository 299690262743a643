use std::sync::Arc;

use tokio::sync::mpsc;

use super::scheduler::BreakScheduler;
use crate::error::{Capability, ReminderError};
use crate::gate::{EnablementGate, GateEffect, GateState, PermissionState};
use crate::platform::{AlarmPayload, PermissionProbe};
use crate::reminder::IntervalFields;

/// Presentation-layer input. Async permission callbacks and lifecycle
/// transitions arrive as messages too, never as blocking calls into the
/// state machine.
#[derive(Debug)]
pub enum ControlCommand {
    ToggleOn,
    ToggleOff,
    SetHours(String),
    SetMinutes(String),
    /// App came back to the foreground; recompute the permission snapshot.
    Resume,
    Status,
    Shutdown,
}

/// Owns the gate, the scheduler and the interval entry, and serializes every
/// input through one loop: control commands on one channel, timer firings on
/// the other. No concurrent firings are possible for the single reminder.
pub struct ReminderService {
    gate: EnablementGate,
    scheduler: BreakScheduler,
    permissions: Arc<dyn PermissionProbe>,
    fields: IntervalFields,
}

impl ReminderService {
    pub async fn new(
        scheduler: BreakScheduler,
        permissions: Arc<dyn PermissionProbe>,
        fields: IntervalFields,
    ) -> Self {
        let snapshot = query_permissions(permissions.as_ref()).await;

        Self {
            gate: EnablementGate::new(snapshot),
            scheduler,
            permissions,
            fields,
        }
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ControlCommand>,
        mut fired: mpsc::Receiver<AlarmPayload>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(ControlCommand::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                Some(payload) = fired.recv() => {
                    self.scheduler.on_fire(payload).await;
                }
            }
        }

        self.scheduler.cancel().await;
        log::info!("reminder service stopped");
    }

    pub(crate) async fn handle_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::ToggleOn => {
                self.refresh_permissions().await;
                let effect = self.gate.toggle_on(&self.fields);
                self.apply(effect).await;
            }
            ControlCommand::ToggleOff => {
                if let Some(effect) = self.gate.toggle_off() {
                    self.apply(effect).await;
                }
            }
            ControlCommand::SetHours(input) => {
                if !self.accepts_edits() || !self.fields.set_hours(&input) {
                    log::warn!("rejected hours input {input:?}");
                }
            }
            ControlCommand::SetMinutes(input) => {
                if !self.accepts_edits() || !self.fields.set_minutes(&input) {
                    log::warn!("rejected minutes input {input:?}");
                }
            }
            ControlCommand::Resume => self.refresh_permissions().await,
            ControlCommand::Status => self.report_status(),
            ControlCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    async fn apply(&mut self, effect: GateEffect) {
        match effect {
            GateEffect::RequestExactPermission => {
                log::warn!(
                    "{}",
                    ReminderError::PermissionDenied(Capability::ExactTimer)
                );
                self.permissions.request_exact_permission().await;
                // The flow returned; the grant itself may still be pending.
                self.refresh_permissions().await;
            }
            GateEffect::RequestNotificationPermission => {
                log::warn!(
                    "{}",
                    ReminderError::PermissionDenied(Capability::PostNotifications)
                );
                self.permissions.request_notification_permission().await;
                self.refresh_permissions().await;
            }
            GateEffect::Arm(config) => self.scheduler.arm(&config).await,
            GateEffect::Cancel => self.scheduler.cancel().await,
            GateEffect::Reject(error) => log::warn!("{error}"),
        }
    }

    async fn refresh_permissions(&mut self) {
        let snapshot = query_permissions(self.permissions.as_ref()).await;
        self.gate.permissions_changed(snapshot);
    }

    /// Interval entry is frozen while armed or while the exact-timer grant
    /// is missing, matching the disabled input widgets.
    fn accepts_edits(&self) -> bool {
        self.gate.state() != GateState::Armed && self.gate.controls_enabled()
    }

    fn report_status(&self) {
        let session = self.scheduler.session();
        match (session.enabled(), self.fields.to_config()) {
            (true, Ok(config)) => {
                log::info!(
                    "reminder active, every {config}, next trigger {}",
                    session
                        .pending_trigger_at()
                        .map(|at| at.to_string())
                        .unwrap_or_else(|| "pending".to_string())
                );
            }
            _ => {
                log::info!(
                    "reminder inactive, interval fields {}:{}, gate {:?}",
                    self.fields.hours(),
                    self.fields.minutes(),
                    self.gate.state()
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn gate(&self) -> &EnablementGate {
        &self.gate
    }

    #[cfg(test)]
    pub(crate) fn scheduler(&self) -> &BreakScheduler {
        &self.scheduler
    }
}

async fn query_permissions(probe: &dyn PermissionProbe) -> PermissionState {
    PermissionState {
        can_schedule_exact: probe.can_schedule_exact().await,
        can_post_notifications: probe.can_post_notifications().await,
    }
}
