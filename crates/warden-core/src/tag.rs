//! Field metadata: the declarative tags attached to a type's fields and the
//! parsed descriptors the evaluator works with.
//!
//! A [`FieldTag`] is the raw, unvalidated metadata for one field, written with
//! a small builder:
//!
//! ```
//! use warden_core::tag;
//!
//! let roles = tag("roles").groups("api").dimension("type", "read").since("2");
//! let descriptor = roles.parse("User").unwrap();
//! assert_eq!(descriptor.key(), "roles");
//! assert!(descriptor.values("type").unwrap().contains("read"));
//! ```
//!
//! Value lists are comma separated. Parsing is pure; a malformed version bound
//! is a [`WardenError::Configuration`] raised when the descriptor is built.

use crate::error::{Result, WardenError};
use crate::options::GROUPS;
use crate::version::Version;
use std::collections::BTreeSet;

/// Output key that marks a field as always excluded.
pub const OMIT: &str = "-";

/// Start a tag for the field named `field`.
pub fn tag(field: &str) -> FieldTag {
    FieldTag::new(field)
}

/// Unparsed metadata for one field.
#[derive(Debug, Clone, Default)]
pub struct FieldTag {
    field: String,
    key: Option<String>,
    dimensions: Vec<(String, String)>,
    since: Option<String>,
    until: Option<String>,
    omit_empty: bool,
    embedded: bool,
}

impl FieldTag {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ..Self::default()
        }
    }

    /// Output key. Defaults to the field name; `"-"` omits the field.
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Always exclude this field.
    pub fn omit(self) -> Self {
        self.key(OMIT)
    }

    /// Comma-separated values in the default group dimension.
    pub fn groups(self, values: &str) -> Self {
        self.dimension(GROUPS, values)
    }

    /// Comma-separated values in a named dimension. Repeated calls for the
    /// same dimension accumulate.
    pub fn dimension(mut self, name: &str, values: &str) -> Self {
        self.dimensions.push((name.to_string(), values.to_string()));
        self
    }

    /// First version (inclusive) in which the field is visible.
    pub fn since(mut self, version: &str) -> Self {
        self.since = Some(version.to_string());
        self
    }

    /// First version (exclusive) in which the field is no longer visible.
    pub fn until(mut self, version: &str) -> Self {
        self.until = Some(version.to_string());
        self
    }

    /// Drop the field when it renders to an empty value.
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Flatten the field's object into the parent, unless an explicit key
    /// is also given.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Validate the tag and produce its descriptor. `type_name` is only used
    /// in error messages.
    pub fn parse(&self, type_name: &str) -> Result<FieldDescriptor> {
        if self.field.is_empty() {
            return Err(WardenError::configuration(
                type_name,
                "<unnamed>",
                "field name must not be empty",
            ));
        }
        let fail = |message: String| WardenError::configuration(type_name, &self.field, message);

        let since = self
            .since
            .as_deref()
            .map(|s| Version::parse(s).map_err(|_| fail(format!("invalid since version {s:?}"))))
            .transpose()?;
        let until = self
            .until
            .as_deref()
            .map(|s| Version::parse(s).map_err(|_| fail(format!("invalid until version {s:?}"))))
            .transpose()?;
        if let (Some(since), Some(until)) = (&since, &until) {
            if since >= until {
                return Err(fail(format!(
                    "since {since} must be lower than until {until}"
                )));
            }
        }

        let mut dimensions: Vec<(String, BTreeSet<String>)> = Vec::new();
        for (name, raw) in &self.dimensions {
            let values = split_values(raw);
            match dimensions.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => existing.extend(values),
                None => dimensions.push((name.clone(), values.collect())),
            }
        }
        // A dimension with no values leaves the field unconstrained in it.
        dimensions.retain(|(_, values)| !values.is_empty());

        let explicit_key = self.key.is_some();
        let key = self.key.clone().unwrap_or_else(|| self.field.clone());

        Ok(FieldDescriptor {
            field: self.field.clone(),
            omitted: key == OMIT,
            key,
            dimensions,
            since,
            until,
            omit_empty: self.omit_empty,
            flatten: self.embedded && !explicit_key,
        })
    }
}

fn split_values(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parsed, immutable metadata for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    field: String,
    key: String,
    omitted: bool,
    dimensions: Vec<(String, BTreeSet<String>)>,
    since: Option<Version>,
    until: Option<Version>,
    omit_empty: bool,
    flatten: bool,
}

impl FieldDescriptor {
    /// Source field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Output key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `true` when the field carries the omit marker.
    pub fn is_omitted(&self) -> bool {
        self.omitted
    }

    /// Declared values for a dimension, or `None` when the field is
    /// unconstrained in it.
    pub fn values(&self, dimension: &str) -> Option<&BTreeSet<String>> {
        self.dimensions
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, values)| values)
    }

    /// All constrained dimensions, in declaration order.
    pub fn dimensions(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.dimensions.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn since(&self) -> Option<&Version> {
        self.since.as_ref()
    }

    pub fn until(&self) -> Option<&Version> {
        self.until.as_ref()
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// `true` when the field's object is merged into its parent.
    pub fn flatten(&self) -> bool {
        self.flatten
    }
}

/// The descriptors of every field of one type, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Parse every tag of a type. Fails on the first malformed tag.
    ///
    /// Several fields may share an output key, typically one per version range
    /// or group. When more than one of them is included, the last one wins.
    pub fn build(type_name: &str, tags: &[FieldTag]) -> Result<Self> {
        let fields = tags
            .iter()
            .map(|t| t.parse(type_name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            type_name: type_name.to_string(),
            fields,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}
