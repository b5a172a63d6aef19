use crate::error::EngineError;
use crate::model::role::{Actor, Role};
use crate::model::status::ApprovalStatus;

/// Gate for `pending -> approved | rejected` transitions. The status
/// compare-and-set itself happens in the record store; this is the
/// role check that precedes it.
pub fn authorize_transition(actor: &Actor, owner_role: Role) -> Result<(), EngineError> {
    if actor.role.can_transition(owner_role) {
        Ok(())
    } else {
        Err(EngineError::Forbidden(format!(
            "{} role may not approve or reject records owned by {} role",
            actor.role, owner_role
        )))
    }
}

/// Only `approved` and `rejected` are valid transition targets; both are
/// terminal, there is no un-approve or re-submit.
pub fn validate_target(target: ApprovalStatus) -> Result<(), EngineError> {
    match target {
        ApprovalStatus::Approved | ApprovalStatus::Rejected => Ok(()),
        ApprovalStatus::Pending => Err(EngineError::Validation(
            "records cannot transition back to pending".into(),
        )),
    }
}
