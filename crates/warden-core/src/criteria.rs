//! Per-field inclusion decisions.
//!
//! Gates are evaluated in a fixed order and the first one that fails decides:
//!
//! 1. omit marker
//! 2. requested version below `since` (inclusive bound)
//! 3. requested version at or above `until` (exclusive bound)
//! 4. each selector in turn: a field that declares values for the selector's
//!    dimension must share at least one of them with the selector
//!
//! Fields that declare nothing for a dimension pass it. Without a requested
//! version the version gates are skipped.

use crate::options::Options;
use crate::tag::FieldDescriptor;
use std::fmt;

/// Outcome of evaluating one field against the criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Include,
    /// The field carries the omit marker.
    Omitted,
    /// The requested version is lower than the field's `since` bound.
    BeforeSince,
    /// The requested version is at or past the field's `until` bound.
    AtOrAfterUntil,
    /// None of the field's values match the named dimension's selector.
    OutsideDimension(String),
}

impl Verdict {
    pub fn is_included(&self) -> bool {
        matches!(self, Verdict::Include)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Include => f.write_str("included"),
            Verdict::Omitted => f.write_str("omit marker"),
            Verdict::BeforeSince => f.write_str("before since"),
            Verdict::AtOrAfterUntil => f.write_str("at or after until"),
            Verdict::OutsideDimension(name) if name.is_empty() => f.write_str("outside groups"),
            Verdict::OutsideDimension(name) => write!(f, "outside dimension {name:?}"),
        }
    }
}

/// Evaluate `field` against `options`.
pub fn evaluate(field: &FieldDescriptor, options: &Options) -> Verdict {
    if field.is_omitted() {
        return Verdict::Omitted;
    }

    if let Some(requested) = options.version() {
        if field.since().is_some_and(|since| requested < since) {
            return Verdict::BeforeSince;
        }
        if field.until().is_some_and(|until| requested >= until) {
            return Verdict::AtOrAfterUntil;
        }
    }

    for selector in options.selectors() {
        if let Some(declared) = field.values(selector.name()) {
            if !selector.accepts_any(declared) {
                return Verdict::OutsideDimension(selector.name().to_string());
            }
        }
    }

    Verdict::Include
}

/// `true` when `field` is visible under `options`.
pub fn should_include(field: &FieldDescriptor, options: &Options) -> bool {
    evaluate(field, options).is_included()
}
