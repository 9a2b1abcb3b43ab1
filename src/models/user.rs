//! # Users, Roles and Assignees
//!
//! The session's current user, the role hierarchy used by the approval
//! workflow, and the assignee references bound to a task.
//!
//! Roles arrive from the dashboard API in several spellings (`"branch_manager"`,
//! `"Branch Manager"`, `"BranchManager"`). They are normalized once at parse time
//! so the rest of the crate compares typed values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Position of a user in the pharmacy organization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Staff,
    Pharmacist,
    BranchManager,
    AreaManager,
    Auditor,
    Management,
    /// A role the service knows about that this crate does not model
    Other(String),
}

impl Role {
    /// Roles allowed to approve or reject a submitted task
    pub const REVIEWERS: [Role; 4] = [
        Role::BranchManager,
        Role::AreaManager,
        Role::Auditor,
        Role::Management,
    ];

    /// Check whether this role may review (approve/reject) tasks
    pub fn is_reviewer(&self) -> bool {
        Self::REVIEWERS.contains(self)
    }

    pub fn is_management(&self) -> bool {
        matches!(self, Self::Management)
    }

    /// Canonical snake_case name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Staff => "staff",
            Self::Pharmacist => "pharmacist",
            Self::BranchManager => "branch_manager",
            Self::AreaManager => "area_manager",
            Self::Auditor => "auditor",
            Self::Management => "management",
            Self::Other(name) => name,
        }
    }

    /// Human readable label, e.g. "Branch Manager"
    pub fn display_name(&self) -> String {
        self.as_str()
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalize any of the spellings the service uses into snake_case
fn normalize_role_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len() + 4);
    let mut previous_lower = false;

    for ch in raw.trim().chars() {
        if ch == ' ' || ch == '-' || ch == '_' {
            if !normalized.ends_with('_') && !normalized.is_empty() {
                normalized.push('_');
            }
            previous_lower = false;
        } else if ch.is_uppercase() {
            if previous_lower {
                normalized.push('_');
            }
            normalized.extend(ch.to_lowercase());
            previous_lower = false;
        } else {
            normalized.push(ch);
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }

    normalized.trim_end_matches('_').to_string()
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_role_name(s);
        let role = match normalized.as_str() {
            "" => return Err(format!("Invalid role: {s:?}")),
            "staff" => Self::Staff,
            "pharmacist" => Self::Pharmacist,
            "branch_manager" => Self::BranchManager,
            "area_manager" => Self::AreaManager,
            "auditor" => Self::Auditor,
            "management" => Self::Management,
            _ => Self::Other(normalized),
        };
        Ok(role)
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user operating the dashboard session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }
}

/// A user bound to a task as one of the people responsible for doing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for Assignee {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Check whether `user_id` is among the task's assignees
pub fn is_assignee(user_id: Uuid, assignees: &[Assignee]) -> bool {
    assignees.iter().any(|assignee| assignee.id == user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_service_spellings() {
        assert_eq!("branch_manager".parse::<Role>().unwrap(), Role::BranchManager);
        assert_eq!("Branch Manager".parse::<Role>().unwrap(), Role::BranchManager);
        assert_eq!("BranchManager".parse::<Role>().unwrap(), Role::BranchManager);
        assert_eq!("area-manager".parse::<Role>().unwrap(), Role::AreaManager);
        assert_eq!("AUDITOR".parse::<Role>().unwrap(), Role::Auditor);
        assert_eq!(
            "Regional_Director".parse::<Role>().unwrap(),
            Role::Other("regional_director".to_string())
        );
        assert!("  ".parse::<Role>().is_err());
    }

    #[test]
    fn test_reviewer_roles() {
        assert!(Role::BranchManager.is_reviewer());
        assert!(Role::Management.is_reviewer());
        assert!(!Role::Staff.is_reviewer());
        assert!(!Role::Pharmacist.is_reviewer());
        assert!(!Role::Other("auditor_assistant".into()).is_reviewer());
    }

    #[test]
    fn test_role_display_name() {
        assert_eq!(Role::AreaManager.display_name(), "Area Manager");
        assert_eq!(Role::Auditor.display_name(), "Auditor");
    }

    #[test]
    fn test_role_serde_uses_canonical_name() {
        let json = serde_json::to_string(&Role::BranchManager).unwrap();
        assert_eq!(json, "\"branch_manager\"");

        let parsed: Role = serde_json::from_str("\"Area Manager\"").unwrap();
        assert_eq!(parsed, Role::AreaManager);
    }
}
