//! Query filter for student searches.

use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::student::TransactionKind;

/// Query parameter names the student search understands.
pub const RECOGNISED_PARAMS: &[&str] = &[
    "id",
    "matriculationNumber",
    "firstName",
    "lastName",
    "email",
    "semester",
    "art",
];

/// Conjunctive filter over the student list.
///
/// Built from raw query parameters; unset fields do not constrain the result.
/// Text fields match case-insensitive substrings, typed fields match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub id: Option<i32>,
    pub matriculation_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub semester: Option<i32>,
    /// Keeps students having at least one transaction of this kind.
    ///
    /// Fed by the `art` query parameter.
    pub kind: Option<TransactionKind>,
}

impl StudentFilter {
    /// True when `name` is a query parameter the search understands.
    pub fn recognises(name: &str) -> bool {
        RECOGNISED_PARAMS.contains(&name)
    }

    /// Builds a filter from raw query parameters.
    ///
    /// Values that fail to parse for the typed fields (`id`, `semester`,
    /// `art`) leave the field unset, so `id=abc` degrades to a match-all
    /// filter rather than an error.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            id: params.get("id").and_then(|raw| raw.parse().ok()),
            matriculation_number: params.get("matriculationNumber").cloned(),
            first_name: params.get("firstName").cloned(),
            last_name: params.get("lastName").cloned(),
            email: params.get("email").cloned(),
            semester: params.get("semester").and_then(|raw| raw.parse().ok()),
            kind: params
                .get("art")
                .and_then(|raw| TransactionKind::from_str(raw).ok()),
        }
    }

    /// True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
