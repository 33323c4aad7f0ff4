//! Recursive descent from a typed value graph to a pruned `serde_json::Value`.
//!
//! Values take part in the walk by implementing [`Marshal`]. Struct-like types
//! implement [`Fields`] as well (usually through the [`crate::fields!`] macro),
//! which gives the walker their static field tags and their field values in
//! declaration order. A struct may additionally expose a [`MarshalHook`] that
//! sees the filtered object before it is emitted.
//!
//! Every rendering step returns `Option<Value>`; `None` means the value chose
//! to be omitted (only hooks do this) and the surrounding container drops it.

use crate::criteria;
use crate::error::{BoxError, Result, WardenError};
use crate::options::Options;
use crate::registry;
use crate::tag::{FieldTag, TypeDescriptor};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use tracing::trace;

/// A value that can be rendered by the [`Walker`].
pub trait Marshal {
    /// Render `self`, or return `Ok(None)` to be omitted from the parent.
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>>;
}

/// Static field metadata and field access for a struct-like type.
///
/// `field_tags` and `field_values` must list the same fields in the same
/// order; a length mismatch is reported as a configuration error.
pub trait Fields: 'static {
    /// Name used in error messages and logs.
    fn type_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn field_tags() -> Vec<FieldTag>;

    fn field_values(&self) -> Vec<&dyn Marshal>;

    /// Capability query for the post-processing hook.
    fn hook(&self) -> Option<&dyn MarshalHook> {
        None
    }
}

/// Post-processing for a struct after its fields have been filtered.
pub trait MarshalHook {
    /// Receives the already-filtered object. Return a replacement value, or
    /// `None` to omit the whole value.
    fn after_filter(
        &self,
        rendered: Map<String, Value>,
        options: &Options,
    ) -> std::result::Result<Option<Value>, BoxError>;
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// State for one marshal call: the criteria, the current location and the
/// shared pointers currently being rendered.
pub struct Walker<'o> {
    options: &'o Options,
    path: Vec<Segment>,
    active: Vec<usize>,
}

impl<'o> Walker<'o> {
    pub fn new(options: &'o Options) -> Self {
        Self {
            options,
            path: Vec::new(),
            active: Vec::new(),
        }
    }

    pub fn options(&self) -> &'o Options {
        self.options
    }

    /// Current location, e.g. `$.users[1].roles`.
    pub fn path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                Segment::Key(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                Segment::Index(i) => {
                    let _ = write!(out, "[{i}]");
                }
            }
        }
        out
    }

    /// Build an [`WardenError::UnsupportedValue`] for the current location.
    pub fn unsupported(&self, reason: impl Into<String>) -> WardenError {
        WardenError::UnsupportedValue {
            path: self.path(),
            reason: reason.into(),
        }
    }

    /// Render each element in order. Empty input renders as `[]`.
    pub fn sequence<'a, T, I>(&mut self, items: I) -> Result<Option<Value>>
    where
        T: Marshal + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut out = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            self.path.push(Segment::Index(i));
            let rendered = item.marshal(self);
            self.path.pop();
            if let Some(value) = rendered? {
                out.push(value);
            }
        }
        Ok(Some(Value::Array(out)))
    }

    /// Render map entries. Keys pass through unchanged; only values are
    /// walked.
    pub fn mapping<'a, V, I>(&mut self, entries: I) -> Result<Option<Value>>
    where
        V: Marshal + ?Sized + 'a,
        I: IntoIterator<Item = (String, &'a V)>,
    {
        let mut out = Map::new();
        for (key, value) in entries {
            self.path.push(Segment::Key(key.clone()));
            let rendered = value.marshal(self);
            self.path.pop();
            if let Some(value) = rendered? {
                out.insert(key, value);
            }
        }
        Ok(Some(Value::Object(out)))
    }

    /// Render a struct-like value through its cached descriptor.
    pub fn object<T: Fields>(&mut self, value: &T) -> Result<Option<Value>> {
        let descriptor = registry::describe::<T>()?;
        let values = value.field_values();
        if values.len() != descriptor.fields().len() {
            return Err(WardenError::configuration(
                descriptor.type_name(),
                "<fields>",
                format!(
                    "{} field tags but {} field values",
                    descriptor.fields().len(),
                    values.len()
                ),
            ));
        }
        let slots = values.into_iter().map(Some).collect();
        self.object_with(&descriptor, slots, value.hook())
    }

    /// Render a struct-like value given its descriptor and one slot per
    /// declared field. A `None` slot is a field absent from the input and is
    /// skipped like an excluded one.
    pub fn object_with(
        &mut self,
        descriptor: &TypeDescriptor,
        values: Vec<Option<&dyn Marshal>>,
        hook: Option<&dyn MarshalHook>,
    ) -> Result<Option<Value>> {
        let mut out = Map::new();

        for (field, value) in descriptor.fields().iter().zip(values) {
            let Some(value) = value else {
                continue;
            };
            let verdict = criteria::evaluate(field, self.options);
            if !verdict.is_included() {
                trace!(
                    type_name = descriptor.type_name(),
                    field = field.field(),
                    %verdict,
                    "field excluded"
                );
                continue;
            }

            self.path.push(Segment::Key(field.key().to_string()));
            let rendered = value.marshal(self);
            self.path.pop();
            let Some(rendered) = rendered? else {
                continue;
            };
            if field.omit_empty() && is_empty(&rendered) {
                continue;
            }

            if !field.flatten() {
                out.insert(field.key().to_string(), rendered);
                continue;
            }
            match rendered {
                // Keys declared on the outer type take precedence.
                Value::Object(inner) => {
                    for (key, value) in inner {
                        out.entry(key).or_insert(value);
                    }
                }
                // An absent embedded value contributes no keys.
                Value::Null => {}
                _ => {
                    self.path.push(Segment::Key(field.key().to_string()));
                    let err = self.unsupported("embedded field did not render to an object");
                    self.path.pop();
                    return Err(err);
                }
            }
        }

        match hook {
            Some(hook) => {
                hook.after_filter(out, self.options)
                    .map_err(|source| WardenError::Hook {
                        type_name: descriptor.type_name().to_string(),
                        path: self.path(),
                        source,
                    })
            }
            None => Ok(Some(Value::Object(out))),
        }
    }

    /// Render the target of a shared pointer at `address`. Re-entering an
    /// address that is still being rendered is a [`WardenError::CyclicGraph`].
    ///
    /// Detection follows the current path only. A pointer reached again from a
    /// sibling branch (a shared node in an acyclic graph) is not an error and
    /// renders once per branch.
    pub fn shared<F>(&mut self, address: usize, render: F) -> Result<Option<Value>>
    where
        F: FnOnce(&mut Self) -> Result<Option<Value>>,
    {
        if self.active.contains(&address) {
            return Err(WardenError::CyclicGraph { path: self.path() });
        }
        self.active.push(address);
        let result = render(self);
        self.active.pop();
        result
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// `my_crate::model::User<T>` -> `User<T>`.
fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

/// Filter `value` by `options` into a generic JSON tree.
///
/// A root value omitted by its hook becomes `null`.
pub fn marshal<T: Marshal + ?Sized>(options: &Options, value: &T) -> Result<Value> {
    let mut walker = Walker::new(options);
    Ok(value.marshal(&mut walker)?.unwrap_or(Value::Null))
}

/// [`marshal`] followed by compact JSON encoding.
pub fn to_string<T: Marshal + ?Sized>(options: &Options, value: &T) -> Result<String> {
    Ok(serde_json::to_string(&marshal(options, value)?)?)
}

/// [`marshal`] followed by pretty-printed JSON encoding.
pub fn to_string_pretty<T: Marshal + ?Sized>(options: &Options, value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(&marshal(options, value)?)?)
}
