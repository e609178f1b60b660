// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles carried in tokens and session metadata.

use serde::{Deserialize, Serialize};

/// Account roles.
///
/// ## Roles
///
/// - `Admin` - Platform staff, full access
/// - `Enterprise` - Paying organisation accounts
/// - `Developer` - API developer accounts
/// - `Visitor` - Signed-up accounts without a product plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Enterprise customer
    Enterprise,
    /// API developer
    Developer,
    /// Signed-up visitor
    Visitor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Enterprise => write!(f, "enterprise"),
            Role::Developer => write!(f, "developer"),
            Role::Visitor => write!(f, "visitor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_name() {
        for role in [Role::Admin, Role::Enterprise, Role::Developer, Role::Visitor] {
            let wire = serde_json::to_string(&role).unwrap();
            assert_eq!(wire, format!("\"{role}\""));
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Role::Enterprise).unwrap();
        assert_eq!(json, "\"enterprise\"");
        let back: Role = serde_json::from_str("\"developer\"").unwrap();
        assert_eq!(back, Role::Developer);
        assert!(serde_json::from_str::<Role>("\"client\"").is_err());
    }
}
