//! Application lifecycle rules. Pure functions; the handlers own all IO.
//!
//! `pending → shortlisted → interview → {selected | rejected}`, with
//! `rejected` reachable from every non-terminal state. Selection happens
//! only through an interview's final-decision write-back, never through the
//! status-update endpoint.

use crate::models::application::ApplicationStatus;
use crate::models::interview::InterviewResult;

/// Transitions a recruiter may perform through the status-update endpoint.
/// Re-applying the current status is allowed and is a no-op.
pub fn can_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    use ApplicationStatus::*;

    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Pending, Shortlisted)
            | (Shortlisted, Interview)
            | (Pending, Rejected)
            | (Shortlisted, Rejected)
            | (Interview, Rejected)
    )
}

/// Only pending applications may be withdrawn by the student.
pub fn is_withdrawable(status: ApplicationStatus) -> bool {
    status == ApplicationStatus::Pending
}

/// An interview may be scheduled until the application reaches a terminal
/// state.
pub fn is_schedulable(status: ApplicationStatus) -> bool {
    !matches!(
        status,
        ApplicationStatus::Selected | ApplicationStatus::Rejected
    )
}

/// Application status written back by an interview's final decision.
/// `None` leaves the application where it is: an on-hold or still-pending
/// result keeps the application at `interview`.
pub fn decision_write_back(result: InterviewResult) -> Option<ApplicationStatus> {
    match result {
        InterviewResult::Selected => Some(ApplicationStatus::Selected),
        InterviewResult::Rejected => Some(ApplicationStatus::Rejected),
        InterviewResult::OnHold | InterviewResult::Pending => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus::*;

    const ALL: [ApplicationStatus; 5] = [Pending, Shortlisted, Interview, Selected, Rejected];

    #[test]
    fn test_same_state_is_always_allowed() {
        for status in ALL {
            assert!(can_transition(status, status), "{status:?} -> {status:?}");
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(can_transition(Pending, Shortlisted));
        assert!(can_transition(Shortlisted, Interview));
        assert!(can_transition(Pending, Rejected));
        assert!(can_transition(Shortlisted, Rejected));
        assert!(can_transition(Interview, Rejected));
    }

    #[test]
    fn test_selection_is_never_reachable_via_status_update() {
        for from in [Pending, Shortlisted, Interview, Rejected] {
            assert!(!can_transition(from, Selected), "{from:?} -> Selected");
        }
    }

    #[test]
    fn test_terminal_states_admit_no_exit() {
        for to in [Pending, Shortlisted, Interview] {
            assert!(!can_transition(Selected, to), "Selected -> {to:?}");
            assert!(!can_transition(Rejected, to), "Rejected -> {to:?}");
        }
    }

    #[test]
    fn test_no_skipping_to_interview_from_pending() {
        assert!(!can_transition(Pending, Interview));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!can_transition(Shortlisted, Pending));
        assert!(!can_transition(Interview, Shortlisted));
        assert!(!can_transition(Interview, Pending));
    }

    #[test]
    fn test_withdrawable_only_from_pending() {
        assert!(is_withdrawable(Pending));
        for status in [Shortlisted, Interview, Selected, Rejected] {
            assert!(!is_withdrawable(status), "{status:?}");
        }
    }

    #[test]
    fn test_schedulable_until_terminal() {
        assert!(is_schedulable(Pending));
        assert!(is_schedulable(Shortlisted));
        assert!(is_schedulable(Interview));
        assert!(!is_schedulable(Selected));
        assert!(!is_schedulable(Rejected));
    }

    #[test]
    fn test_decision_write_back_mapping() {
        assert_eq!(
            decision_write_back(InterviewResult::Selected),
            Some(Selected)
        );
        assert_eq!(
            decision_write_back(InterviewResult::Rejected),
            Some(Rejected)
        );
        assert_eq!(decision_write_back(InterviewResult::OnHold), None);
        assert_eq!(decision_write_back(InterviewResult::Pending), None);
    }
}
