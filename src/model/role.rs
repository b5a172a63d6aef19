use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Approval gate: admins transition anything, managers only records
    /// owned by plain employees, employees nothing (their own included).
    pub fn can_transition(self, owner: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::Manager => owner == Role::Employee,
            Role::Employee => false,
        }
    }
}

/// The acting user, as supplied by the identity/role provider.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub name: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl Actor {
    pub fn new(user_id: u64, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
            employee_id: None,
        }
    }

    pub fn with_employee(mut self, employee_id: u64) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn require_supervisor(&self) -> Result<(), EngineError> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(EngineError::Forbidden("Admin/Manager only".into()))
        }
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    /// True when the actor is the employee the record belongs to.
    pub fn owns(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id)
    }
}
