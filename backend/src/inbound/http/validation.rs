//! Request payload validation for inbound HTTP adapters.
//!
//! Create and update payloads are checked field by field into a [`Violations`]
//! collector, so clients receive every problem in a single `400` response
//! instead of one failure at a time. Parse helpers record a violation and
//! return a placeholder value; the placeholder is discarded when the collector
//! turns out non-empty.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::domain::{Error, TransactionKind};

/// A single field violation: the dotted field path and what is wrong with it.
///
/// Paths follow the request body shape, e.g. `wallet.balance` or
/// `transactions[2].amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// Collects field violations across a request payload.
#[derive(Debug, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one violation against a field path.
    pub fn record(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// True when no violations were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Succeed when empty, otherwise fail with one `invalid_request` error
    /// listing every recorded violation under a `violations` details key.
    pub fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(Error::invalid_request("request validation failed")
            .with_details(json!({ "violations": self.0 })))
    }
}

/// Record a violation when `value` is blank.
pub fn check_required(violations: &mut Violations, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.record(field, "must not be blank");
    }
}

/// Record a violation unless `value` is 4 to 8 ASCII digits.
pub fn check_matriculation_number(violations: &mut Violations, field: &str, value: &str) {
    let well_formed =
        (4..=8).contains(&value.len()) && value.bytes().all(|byte| byte.is_ascii_digit());
    if !well_formed {
        violations.record(field, "must be 4 to 8 digits");
    }
}

/// Record a violation unless `value` looks like `local@domain.tld`.
pub fn check_email(violations: &mut Violations, field: &str, value: &str) {
    let well_formed = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !well_formed {
        violations.record(field, "must be a valid email address");
    }
}

/// Record a violation when the semester is below 1.
pub fn check_semester(violations: &mut Violations, field: &str, value: i32) {
    if value < 1 {
        violations.record(field, "must be at least 1");
    }
}

/// Record a violation when a monetary amount is negative.
pub fn check_non_negative(violations: &mut Violations, field: &str, value: &BigDecimal) {
    if value < &BigDecimal::default() {
        violations.record(field, "must not be negative");
    }
}

/// Record a violation when a monetary amount is zero.
pub fn check_non_zero(violations: &mut Violations, field: &str, value: &BigDecimal) {
    if value.is_zero() {
        violations.record(field, "must not be zero");
    }
}

/// Parse a decimal amount, recording a violation and yielding zero when the
/// text is not a number.
pub fn parse_money(violations: &mut Violations, field: &str, raw: &str) -> BigDecimal {
    BigDecimal::from_str(raw.trim()).unwrap_or_else(|_| {
        violations.record(field, "must be a decimal amount");
        BigDecimal::default()
    })
}

/// Parse a transaction kind, recording a violation and yielding `LOAD` when
/// the text names no known kind.
pub fn parse_kind(violations: &mut Violations, field: &str, raw: &str) -> TransactionKind {
    TransactionKind::from_str(raw).unwrap_or_else(|_| {
        violations.record(field, "must be one of LOAD, SPEND, or REFUND");
        TransactionKind::Load
    })
}

/// Parse an RFC 3339 timestamp, recording a violation and yielding the
/// current instant when the text does not parse.
pub fn parse_timestamp(violations: &mut Violations, field: &str, raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            violations.record(field, "must be an RFC 3339 timestamp");
            Utc::now()
        })
}
