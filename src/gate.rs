use crate::error::ReminderError;
use crate::reminder::{IntervalFields, ReminderConfig};

/// Snapshot of the OS capability grants. Recomputed by querying the
/// [`PermissionProbe`](crate::platform::PermissionProbe) on every relevant
/// lifecycle event: service start, resume, after a request flow returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionState {
    pub can_schedule_exact: bool,
    pub can_post_notifications: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    NoPermissions,
    NeedsExactPermission,
    NeedsNotificationPermission,
    Ready,
    Armed,
}

/// Side effect the service must execute in response to a gate input. The
/// gate itself never touches the scheduler or the OS, which keeps the
/// "second click required" behavior an explicit, testable transition.
#[derive(Debug)]
pub enum GateEffect {
    /// Surface the mediated settings flow for the exact-timer grant. The
    /// toggle is not applied; the user must toggle again after granting,
    /// since the grant is asynchronous and externally mediated.
    RequestExactPermission,
    /// Surface the mediated notification-consent dialog. Arming waits for
    /// the next user action after the async callback lands.
    RequestNotificationPermission,
    Arm(ReminderConfig),
    Cancel,
    /// Surfaced as a transient user message; gate state is unchanged.
    Reject(ReminderError),
}

/// The permission/enablement state machine governing whether the reminder
/// loop may be armed.
pub struct EnablementGate {
    state: GateState,
    permissions: PermissionState,
}

impl EnablementGate {
    pub fn new(permissions: PermissionState) -> Self {
        Self {
            state: Self::idle_state(permissions),
            permissions,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn permissions(&self) -> PermissionState {
        self.permissions
    }

    /// Whether the presentation layer should accept input. While armed with
    /// the exact-timer grant revoked the controls freeze but the state stays
    /// `Armed`: the underlying OS registration may keep firing until the OS
    /// itself refuses re-arming. Accepted race, not corrected
    /// transactionally.
    pub fn controls_enabled(&self) -> bool {
        self.permissions.can_schedule_exact
    }

    pub fn toggle_on(&mut self, fields: &IntervalFields) -> GateEffect {
        if !self.permissions.can_schedule_exact {
            return GateEffect::RequestExactPermission;
        }
        if !self.permissions.can_post_notifications {
            return GateEffect::RequestNotificationPermission;
        }

        match fields.to_config() {
            Ok(config) => {
                self.state = GateState::Armed;
                GateEffect::Arm(config)
            }
            Err(error) => GateEffect::Reject(error),
        }
    }

    pub fn toggle_off(&mut self) -> Option<GateEffect> {
        if self.state != GateState::Armed {
            return None;
        }
        self.state = Self::idle_state(self.permissions);
        Some(GateEffect::Cancel)
    }

    /// Applies a fresh permission snapshot, delivered as a message (resume
    /// or an async grant callback). An armed session stays armed even if a
    /// grant was revoked.
    pub fn permissions_changed(&mut self, permissions: PermissionState) {
        self.permissions = permissions;
        if self.state != GateState::Armed {
            self.state = Self::idle_state(permissions);
        }
    }

    fn idle_state(permissions: PermissionState) -> GateState {
        match (
            permissions.can_schedule_exact,
            permissions.can_post_notifications,
        ) {
            (false, false) => GateState::NoPermissions,
            (false, true) => GateState::NeedsExactPermission,
            (true, false) => GateState::NeedsNotificationPermission,
            (true, true) => GateState::Ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_granted() -> PermissionState {
        PermissionState {
            can_schedule_exact: true,
            can_post_notifications: true,
        }
    }

    fn fields(hours: &str, minutes: &str) -> IntervalFields {
        IntervalFields::new(hours, minutes)
    }

    #[test]
    fn toggle_on_without_exact_grant_requests_the_flow_and_never_arms() {
        let mut gate = EnablementGate::new(PermissionState {
            can_schedule_exact: false,
            can_post_notifications: true,
        });

        let effect = gate.toggle_on(&fields("1", "30"));

        assert!(matches!(effect, GateEffect::RequestExactPermission));
        assert_eq!(gate.state(), GateState::NeedsExactPermission);
    }

    #[test]
    fn toggle_on_without_notification_consent_requests_the_dialog() {
        let mut gate = EnablementGate::new(PermissionState {
            can_schedule_exact: true,
            can_post_notifications: false,
        });

        let effect = gate.toggle_on(&fields("1", "30"));

        assert!(matches!(effect, GateEffect::RequestNotificationPermission));
        assert_eq!(gate.state(), GateState::NeedsNotificationPermission);
    }

    #[test]
    fn toggle_on_with_all_grants_arms_with_the_derived_interval() {
        let mut gate = EnablementGate::new(all_granted());

        let effect = gate.toggle_on(&fields("1", "30"));

        match effect {
            GateEffect::Arm(config) => assert_eq!(config.interval_minutes(), 90),
            other => panic!("expected Arm, got {other:?}"),
        }
        assert_eq!(gate.state(), GateState::Armed);
    }

    #[test]
    fn zero_interval_rejection_leaves_state_unchanged_and_is_idempotent() {
        let mut gate = EnablementGate::new(all_granted());

        for _ in 0..3 {
            let effect = gate.toggle_on(&fields("0", "0"));
            assert!(matches!(
                effect,
                GateEffect::Reject(ReminderError::InvalidInterval)
            ));
            assert_eq!(gate.state(), GateState::Ready);
        }
    }

    #[test]
    fn toggle_off_cancels_only_from_armed() {
        let mut gate = EnablementGate::new(all_granted());
        assert!(gate.toggle_off().is_none());

        gate.toggle_on(&fields("0", "30"));
        assert_eq!(gate.state(), GateState::Armed);

        assert!(matches!(gate.toggle_off(), Some(GateEffect::Cancel)));
        assert_eq!(gate.state(), GateState::Ready);
        assert!(gate.toggle_off().is_none());
    }

    #[test]
    fn second_toggle_after_grant_arms() {
        let mut gate = EnablementGate::new(PermissionState {
            can_schedule_exact: false,
            can_post_notifications: false,
        });
        assert_eq!(gate.state(), GateState::NoPermissions);

        assert!(matches!(
            gate.toggle_on(&fields("0", "45")),
            GateEffect::RequestExactPermission
        ));

        // Grant callbacks arrive as recomputed snapshots.
        gate.permissions_changed(PermissionState {
            can_schedule_exact: true,
            can_post_notifications: false,
        });
        assert_eq!(gate.state(), GateState::NeedsNotificationPermission);

        assert!(matches!(
            gate.toggle_on(&fields("0", "45")),
            GateEffect::RequestNotificationPermission
        ));

        gate.permissions_changed(all_granted());
        assert_eq!(gate.state(), GateState::Ready);

        assert!(matches!(
            gate.toggle_on(&fields("0", "45")),
            GateEffect::Arm(_)
        ));
    }

    #[test]
    fn revocation_while_armed_freezes_controls_but_keeps_the_session() {
        let mut gate = EnablementGate::new(all_granted());
        gate.toggle_on(&fields("0", "30"));

        gate.permissions_changed(PermissionState {
            can_schedule_exact: false,
            can_post_notifications: true,
        });

        assert_eq!(gate.state(), GateState::Armed);
        assert!(!gate.controls_enabled());
    }
}
