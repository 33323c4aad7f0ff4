//! # warden-core
//!
//! Field-visibility filtering for serialization. Given a tagged value graph and
//! per-call [`Options`] (permission groups, an API version and any number of
//! secondary dimensions such as a "type" view mode), [`marshal`] produces a
//! `serde_json::Value` containing only the fields that pass every criterion,
//! in declared field order.
//!
//! ## Quick start
//!
//! ```rust
//! use warden_core::{fields, marshal, Options, Version};
//!
//! struct User {
//!     username: String,
//!     email: String,
//!     roles: Vec<String>,
//! }
//!
//! fields! {
//!     User {
//!         username.groups("api").dimension("type", "read,list"),
//!         email.groups("personal").dimension("type", "read"),
//!         roles.groups("api").dimension("type", "read").since("2"),
//!     }
//! }
//!
//! let alice = User {
//!     username: "alice".into(),
//!     email: "alice@example.org".into(),
//!     roles: vec!["user".into(), "admin".into()],
//! };
//!
//! let options = Options::new()
//!     .groups(["api"])
//!     .dimension("type", ["read"])
//!     .api_version(Version::new(1, 0, 0));
//! let out = marshal(&options, &alice).unwrap();
//! assert_eq!(out, serde_json::json!({"username": "alice"}));
//! ```
//!
//! ## Modules
//!
//! - [`tag`] — field tags and parsed descriptors
//! - [`options`] — per-call criteria
//! - [`criteria`] — per-field inclusion decisions
//! - [`walker`] — recursive rendering and the `Marshal` / `Fields` / `MarshalHook` traits
//! - [`registry`] — process-wide descriptor cache
//! - [`schema`] — runtime schemas for untyped JSON documents
//! - [`version`] — semantic version numbers
//! - [`error`] — error types

pub mod criteria;
pub mod error;
mod impls;
mod macros;
pub mod options;
pub mod registry;
pub mod schema;
pub mod tag;
pub mod version;
pub mod walker;

pub use criteria::{evaluate, should_include, Verdict};
pub use error::{BoxError, Result, WardenError};
pub use impls::{MapKey, Verbatim};
pub use options::{Options, Selector, GROUPS};
pub use schema::{Document, Schema};
pub use tag::{tag, FieldDescriptor, FieldTag, TypeDescriptor, OMIT};
pub use version::Version;
pub use walker::{marshal, to_string, to_string_pretty, Fields, Marshal, MarshalHook, Walker};

#[doc(hidden)]
pub use serde_json;
