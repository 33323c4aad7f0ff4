//! Per-call request context: which dimension values are accepted and which
//! API version was requested.

use crate::version::Version;
use std::collections::BTreeSet;

/// Reserved name of the default "groups" dimension.
pub const GROUPS: &str = "";

/// Accepted values for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    name: String,
    values: BTreeSet<String>,
}

impl Selector {
    /// Dimension name; [`GROUPS`] for the default dimension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// `true` when any of `declared` is accepted by this selector.
    pub fn accepts_any(&self, declared: &BTreeSet<String>) -> bool {
        !self.values.is_disjoint(declared)
    }
}

/// Criteria for one marshal call.
///
/// ```
/// use warden_core::{Options, Version};
///
/// let options = Options::new()
///     .groups(["api", "personal"])
///     .dimension("type", ["read"])
///     .api_version(Version::new(2, 0, 0));
/// assert_eq!(options.selectors().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    selectors: Vec<Selector>,
    api_version: Option<Version>,
}

impl Options {
    /// Empty criteria: every field without the omit marker is visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept these values in the default group dimension.
    pub fn groups<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimension(GROUPS, values)
    }

    /// Accept these values in a named dimension. An empty value set adds no
    /// selector, so the dimension is not filtered at all.
    pub fn dimension<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.selectors.push(Selector {
                name: name.to_string(),
                values,
            });
        }
        self
    }

    /// Requested API version.
    pub fn api_version(mut self, version: Version) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Selectors in the order they were added.
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn version(&self) -> Option<&Version> {
        self.api_version.as_ref()
    }
}
