//! Organization onboarding status.
//!
//! Status is derived from the organization's current data until every step
//! holds at once. At that point the caller persists a one-way `completed`
//! flag and the derivation is skipped from then on.

use serde::Serialize;

/// Onboarding step keys, in the order the setup flow presents them.
pub const STEP_AGENCY_NAME: &str = "agency_name";
pub const STEP_NOTIFICATION_EMAIL: &str = "notification_email";
pub const STEP_FIRST_TOUR: &str = "first_tour";

/// Raw facts the status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OnboardingSteps {
    pub agency_name_set: bool,
    pub notification_email_set: bool,
    pub tour_count: i64,
}

impl OnboardingSteps {
    /// Build from the organization's current fields.
    pub fn from_fields(name: Option<&str>, notification_email: Option<&str>, tour_count: i64) -> Self {
        let present = |v: Option<&str>| v.is_some_and(|s| !s.trim().is_empty());
        Self {
            agency_name_set: present(name),
            notification_email_set: present(notification_email),
            tour_count,
        }
    }

    pub fn all_done(&self) -> bool {
        self.agency_name_set && self.notification_email_set && self.tour_count >= 1
    }

    /// Keys of the steps still outstanding, in flow order.
    pub fn pending(&self) -> Vec<&'static str> {
        let mut pending = Vec::new();
        if !self.agency_name_set {
            pending.push(STEP_AGENCY_NAME);
        }
        if !self.notification_email_set {
            pending.push(STEP_NOTIFICATION_EMAIL);
        }
        if self.tour_count < 1 {
            pending.push(STEP_FIRST_TOUR);
        }
        pending
    }
}

/// Status returned to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingStatus {
    pub is_complete: bool,
    pub steps: OnboardingSteps,
    pub pending_steps: Vec<&'static str>,
}

/// Outcome of evaluating the latch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatchOutcome {
    pub status: OnboardingStatus,
    /// `true` exactly when the `completed` flag must now be written.
    pub persist_completion: bool,
}

/// Evaluate onboarding against the persisted flag.
///
/// Once `persisted_complete` is set the status is complete no matter what
/// the steps say now.
pub fn evaluate(persisted_complete: bool, steps: OnboardingSteps) -> LatchOutcome {
    let derived = steps.all_done();
    let is_complete = persisted_complete || derived;

    LatchOutcome {
        status: OnboardingStatus {
            is_complete,
            steps,
            pending_steps: if is_complete { Vec::new() } else { steps.pending() },
        },
        persist_completion: derived && !persisted_complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_set() -> OnboardingSteps {
        OnboardingSteps {
            agency_name_set: true,
            notification_email_set: true,
            tour_count: 1,
        }
    }

    #[test]
    fn complete_iff_all_three_hold() {
        let outcome = evaluate(false, all_set());
        assert!(outcome.status.is_complete);
        assert!(outcome.persist_completion);
    }

    #[test]
    fn any_missing_step_blocks_completion() {
        let variants = [
            OnboardingSteps {
                agency_name_set: false,
                ..all_set()
            },
            OnboardingSteps {
                notification_email_set: false,
                ..all_set()
            },
            OnboardingSteps {
                tour_count: 0,
                ..all_set()
            },
        ];
        for steps in variants {
            let outcome = evaluate(false, steps);
            assert!(!outcome.status.is_complete, "{steps:?}");
            assert!(!outcome.persist_completion);
            assert_eq!(outcome.status.pending_steps.len(), 1);
        }
    }

    #[test]
    fn persisted_completion_is_a_one_way_latch() {
        let regressed = OnboardingSteps {
            tour_count: 0,
            ..all_set()
        };
        let outcome = evaluate(true, regressed);
        assert!(outcome.status.is_complete);
        assert!(!outcome.persist_completion, "already persisted");
        assert!(outcome.status.pending_steps.is_empty());
    }

    #[test]
    fn from_fields_treats_blank_as_unset() {
        let steps = OnboardingSteps::from_fields(Some("  "), Some("ops@agency.test"), 3);
        assert!(!steps.agency_name_set);
        assert!(steps.notification_email_set);
        assert_eq!(steps.pending(), vec![STEP_AGENCY_NAME]);
    }
}
