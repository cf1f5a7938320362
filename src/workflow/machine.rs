use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::WorkflowError;
use crate::model::leave_application::LeaveStatus;
use crate::model::role::Role;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// The authenticated user attempting a transition.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
    pub department_id: Option<u64>,
}

/// The slice of an application the machine reasons about.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationView {
    pub id: u64,
    pub applicant_id: u64,
    pub applicant_department_id: Option<u64>,
    pub status: LeaveStatus,
}

/// Where a fresh application enters the workflow.
///
/// An HOD cannot review their own request, so HOD applications skip straight
/// to the principal secretary; so do principal-secretary applications and
/// those of staff without a department (there is no HOD to review them).
pub fn initial_status(applicant_role: Role, has_department: bool) -> LeaveStatus {
    match applicant_role {
        Role::Staff if has_department => LeaveStatus::PendingHodApproval,
        Role::Staff | Role::Hod | Role::PrincipalSecretary => {
            LeaveStatus::PendingPrincipalSecretaryApproval
        }
    }
}

/// Pure transition function: authorizes the actor for the application's
/// current stage and returns the successor status. Never mutates anything.
pub fn next_status(
    app: &ApplicationView,
    actor: &Actor,
    decision: Decision,
) -> Result<LeaveStatus, WorkflowError> {
    match app.status {
        LeaveStatus::Approved | LeaveStatus::Rejected => {
            Err(WorkflowError::InvalidStateTransition { status: app.status })
        }
        LeaveStatus::PendingHodApproval => {
            if actor.role != Role::Hod
                || actor.department_id.is_none()
                || actor.department_id != app.applicant_department_id
            {
                return Err(WorkflowError::UnauthorizedAction(
                    "only the head of the applicant's department may act on this application",
                ));
            }
            if actor.user_id == app.applicant_id {
                return Err(WorkflowError::UnauthorizedAction(
                    "reviewers cannot act on their own application",
                ));
            }
            Ok(match decision {
                Decision::Approve => LeaveStatus::PendingPrincipalSecretaryApproval,
                Decision::Reject => LeaveStatus::Rejected,
            })
        }
        LeaveStatus::PendingPrincipalSecretaryApproval => {
            if actor.role != Role::PrincipalSecretary {
                return Err(WorkflowError::UnauthorizedAction(
                    "only a principal secretary may act on this application",
                ));
            }
            Ok(match decision {
                Decision::Approve => LeaveStatus::Approved,
                Decision::Reject => LeaveStatus::Rejected,
            })
        }
    }
}

/// Visibility rule for single-application reads: the applicant, the HOD of
/// the applicant's department, or any principal secretary.
pub fn can_view(app: &ApplicationView, actor: &Actor) -> bool {
    actor.user_id == app.applicant_id
        || actor.role == Role::PrincipalSecretary
        || (actor.role == Role::Hod
            && actor.department_id.is_some()
            && actor.department_id == app.applicant_department_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_application(status: LeaveStatus) -> ApplicationView {
        ApplicationView {
            id: 1,
            applicant_id: 10,
            applicant_department_id: Some(2),
            status,
        }
    }

    fn hod_of(department_id: u64) -> Actor {
        Actor {
            user_id: 20,
            role: Role::Hod,
            department_id: Some(department_id),
        }
    }

    fn principal_secretary() -> Actor {
        Actor {
            user_id: 30,
            role: Role::PrincipalSecretary,
            department_id: None,
        }
    }

    #[test]
    fn staff_route_runs_both_stages() {
        assert_eq!(
            initial_status(Role::Staff, true),
            LeaveStatus::PendingHodApproval
        );

        let app = staff_application(LeaveStatus::PendingHodApproval);
        let after_hod = next_status(&app, &hod_of(2), Decision::Approve).unwrap();
        assert_eq!(after_hod, LeaveStatus::PendingPrincipalSecretaryApproval);

        let app = staff_application(after_hod);
        let after_ps = next_status(&app, &principal_secretary(), Decision::Approve).unwrap();
        assert_eq!(after_ps, LeaveStatus::Approved);
    }

    #[test]
    fn hod_and_ps_applications_skip_the_hod_stage() {
        assert_eq!(
            initial_status(Role::Hod, true),
            LeaveStatus::PendingPrincipalSecretaryApproval
        );
        assert_eq!(
            initial_status(Role::PrincipalSecretary, false),
            LeaveStatus::PendingPrincipalSecretaryApproval
        );
        // No department means no HOD exists to review.
        assert_eq!(
            initial_status(Role::Staff, false),
            LeaveStatus::PendingPrincipalSecretaryApproval
        );
    }

    #[test]
    fn reject_is_terminal_at_either_stage() {
        let app = staff_application(LeaveStatus::PendingHodApproval);
        assert_eq!(
            next_status(&app, &hod_of(2), Decision::Reject).unwrap(),
            LeaveStatus::Rejected
        );

        let rejected = staff_application(LeaveStatus::Rejected);
        assert!(matches!(
            next_status(&rejected, &principal_secretary(), Decision::Approve),
            Err(WorkflowError::InvalidStateTransition {
                status: LeaveStatus::Rejected
            })
        ));
    }

    #[test]
    fn approved_accepts_no_further_action() {
        let approved = staff_application(LeaveStatus::Approved);
        for decision in [Decision::Approve, Decision::Reject] {
            assert!(matches!(
                next_status(&approved, &principal_secretary(), decision),
                Err(WorkflowError::InvalidStateTransition { .. })
            ));
        }
    }

    #[test]
    fn hod_stage_requires_the_department_hod() {
        let app = staff_application(LeaveStatus::PendingHodApproval);

        // HOD of a different department.
        assert!(matches!(
            next_status(&app, &hod_of(9), Decision::Approve),
            Err(WorkflowError::UnauthorizedAction(_))
        ));

        // A principal secretary cannot act at the HOD stage.
        assert!(matches!(
            next_status(&app, &principal_secretary(), Decision::Approve),
            Err(WorkflowError::UnauthorizedAction(_))
        ));

        // Plain staff cannot act at all.
        let staff = Actor {
            user_id: 11,
            role: Role::Staff,
            department_id: Some(2),
        };
        assert!(matches!(
            next_status(&app, &staff, Decision::Approve),
            Err(WorkflowError::UnauthorizedAction(_))
        ));
    }

    #[test]
    fn hod_cannot_review_their_own_request() {
        let app = ApplicationView {
            id: 1,
            applicant_id: 20,
            applicant_department_id: Some(2),
            status: LeaveStatus::PendingHodApproval,
        };
        assert!(matches!(
            next_status(&app, &hod_of(2), Decision::Approve),
            Err(WorkflowError::UnauthorizedAction(_))
        ));
    }

    #[test]
    fn ps_stage_only_accepts_principal_secretaries() {
        let app = staff_application(LeaveStatus::PendingPrincipalSecretaryApproval);
        assert!(matches!(
            next_status(&app, &hod_of(2), Decision::Approve),
            Err(WorkflowError::UnauthorizedAction(_))
        ));
        assert_eq!(
            next_status(&app, &principal_secretary(), Decision::Reject).unwrap(),
            LeaveStatus::Rejected
        );
    }

    #[test]
    fn visibility_covers_applicant_hod_and_ps() {
        let app = staff_application(LeaveStatus::PendingHodApproval);
        let applicant = Actor {
            user_id: 10,
            role: Role::Staff,
            department_id: Some(2),
        };
        let other_staff = Actor {
            user_id: 11,
            role: Role::Staff,
            department_id: Some(2),
        };
        assert!(can_view(&app, &applicant));
        assert!(can_view(&app, &hod_of(2)));
        assert!(!can_view(&app, &hod_of(9)));
        assert!(can_view(&app, &principal_secretary()));
        assert!(!can_view(&app, &other_staff));
    }
}
