/// Graph walker behavior: null vs excluded, nesting, embedding, maps, hooks,
/// cycles and configuration errors.
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use warden_core::{
    fields, marshal, registry, tag, BoxError, FieldTag, Fields, Marshal, MarshalHook, Options,
    Version, WardenError,
};

// ============================================================================
// Fixtures
// ============================================================================

struct Profile {
    nickname: Option<String>,
    phone: Option<String>,
    secret: String,
}

fields! {
    Profile {
        nickname.groups("api"),
        phone.groups("personal"),
        secret.omit(),
    }
}

struct Audit {
    created_by: String,
    revision: u32,
}

fields! {
    Audit {
        created_by.groups("admin"),
        revision,
    }
}

struct Account {
    id: u64,
    audit: Audit,
    profile: Profile,
    labels: BTreeMap<String, Profile>,
    tags: Vec<String>,
    note: Option<String>,
}

fields! {
    Account {
        id,
        audit.embedded(),
        profile.groups("api"),
        labels.omit_empty(),
        tags,
        note.omit_empty(),
    }
}

fn profile(nick: Option<&str>) -> Profile {
    Profile {
        nickname: nick.map(str::to_string),
        phone: Some("555-0100".into()),
        secret: "s3cret".into(),
    }
}

fn account() -> Account {
    Account {
        id: 7,
        audit: Audit {
            created_by: "root".into(),
            revision: 3,
        },
        profile: profile(None),
        labels: BTreeMap::new(),
        tags: Vec::new(),
        note: None,
    }
}

fn api() -> Options {
    Options::new().groups(["api"])
}

// ============================================================================
// Null vs excluded
// ============================================================================

#[test]
fn included_none_is_explicit_null_and_excluded_field_has_no_key() {
    let out = marshal(&api(), &profile(None)).unwrap();
    assert_eq!(out, json!({"nickname": null}));
    assert!(out.get("phone").is_none());
    assert!(out.get("secret").is_none());
}

#[test]
fn omit_marker_applies_without_criteria() {
    let out = marshal(&Options::new(), &profile(Some("al"))).unwrap();
    assert_eq!(out, json!({"nickname": "al", "phone": "555-0100"}));
}

// ============================================================================
// Nesting, embedding, empty values
// ============================================================================

#[test]
fn embedded_struct_is_flattened_and_filtered() {
    let out = marshal(&api(), &account()).unwrap();
    let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["id", "revision", "profile", "tags"]);
    assert_eq!(out["profile"], json!({"nickname": null}));

    let admin = Options::new().groups(["api", "admin"]);
    let out = marshal(&admin, &account()).unwrap();
    assert_eq!(out["created_by"], json!("root"));
}

#[test]
fn empty_sequence_stays_array_but_omit_empty_drops_it() {
    let out = marshal(&api(), &account()).unwrap();
    assert_eq!(out["tags"], json!([]));
    assert!(out.get("labels").is_none());
    assert!(out.get("note").is_none());
}

#[test]
fn map_keys_are_not_filtered_but_values_are() {
    let mut acct = account();
    acct.labels.insert("phone".into(), profile(Some("home")));
    acct.labels.insert("secret".into(), profile(Some("work")));

    let out = marshal(&api(), &acct).unwrap();
    assert_eq!(
        out["labels"],
        json!({"phone": {"nickname": "home"}, "secret": {"nickname": "work"}})
    );
}

#[test]
fn excluded_container_field_is_dropped_regardless_of_contents() {
    let out = marshal(&Options::new().groups(["personal"]), &account()).unwrap();
    assert!(out.get("profile").is_none());
}

struct Outer {
    id: u32,
    inner: Inner,
}

struct Inner {
    id: u32,
    extra: u32,
}

fields! {
    Inner {
        id,
        extra,
    }
}

fields! {
    Outer {
        id,
        inner.embedded(),
    }
}

#[test]
fn outer_keys_win_over_flattened_keys() {
    let value = Outer {
        id: 1,
        inner: Inner { id: 2, extra: 3 },
    };
    assert_eq!(
        marshal(&Options::new(), &value).unwrap(),
        json!({"id": 1, "extra": 3})
    );
}

struct Wrapper {
    inner: Inner,
}

fields! {
    Wrapper {
        inner.embedded().key("inner"),
    }
}

#[test]
fn embedded_with_explicit_key_nests() {
    let value = Wrapper {
        inner: Inner { id: 2, extra: 3 },
    };
    assert_eq!(
        marshal(&Options::new(), &value).unwrap(),
        json!({"inner": {"id": 2, "extra": 3}})
    );
}

struct Doc {
    id: u32,
    audit: Option<Audit>,
}

fields! {
    Doc {
        id,
        audit.embedded(),
    }
}

#[test]
fn absent_embedded_value_contributes_no_keys() {
    let value = Doc { id: 1, audit: None };
    assert_eq!(marshal(&Options::new(), &value).unwrap(), json!({"id": 1}));

    let value = Doc {
        id: 1,
        audit: Some(Audit {
            created_by: "root".into(),
            revision: 2,
        }),
    };
    assert_eq!(
        marshal(&Options::new(), &value).unwrap(),
        json!({"id": 1, "created_by": "root", "revision": 2})
    );
}

struct Scalar {
    count: u32,
}

fields! {
    Scalar {
        count.embedded(),
    }
}

#[test]
fn embedded_scalar_is_unsupported() {
    let err = marshal(&Options::new(), &Scalar { count: 3 }).unwrap_err();
    match err {
        WardenError::UnsupportedValue { path, .. } => assert_eq!(path, "$.count"),
        other => panic!("expected UnsupportedValue, got {other:?}"),
    }
}

// ============================================================================
// Shared output keys
// ============================================================================

struct Versioned {
    roles_v1: String,
    roles_v2: Vec<String>,
}

fields! {
    Versioned {
        roles_v1.key("roles").until("2"),
        roles_v2.key("roles").since("2"),
    }
}

#[test]
fn version_disjoint_fields_share_a_key() {
    let value = Versioned {
        roles_v1: "user,admin".into(),
        roles_v2: vec!["user".into(), "admin".into()],
    };
    let v1 = Options::new().api_version(Version::new(1, 0, 0));
    let v2 = Options::new().api_version(Version::new(2, 0, 0));
    assert_eq!(marshal(&v1, &value).unwrap(), json!({"roles": "user,admin"}));
    assert_eq!(marshal(&v2, &value).unwrap(), json!({"roles": ["user", "admin"]}));
}

struct Contact {
    email_public: String,
    email_full: String,
}

fields! {
    Contact {
        email_public.key("email").groups("api"),
        email_full.key("email").groups("personal"),
    }
}

#[test]
fn group_disjoint_fields_share_a_key() {
    let value = Contact {
        email_public: "a***@example.org".into(),
        email_full: "alice@example.org".into(),
    };
    assert_eq!(
        marshal(&Options::new().groups(["api"]), &value).unwrap(),
        json!({"email": "a***@example.org"})
    );
    assert_eq!(
        marshal(&Options::new().groups(["personal"]), &value).unwrap(),
        json!({"email": "alice@example.org"})
    );
    // Both included: the later declaration wins.
    assert_eq!(
        marshal(&Options::new(), &value).unwrap(),
        json!({"email": "alice@example.org"})
    );
}

// ============================================================================
// Hooks
// ============================================================================

struct Card {
    number: String,
    holder: String,
    hidden: bool,
}

fields! {
    Card with hook {
        number.groups("billing"),
        holder,
        hidden,
    }
}

impl MarshalHook for Card {
    fn after_filter(
        &self,
        mut rendered: Map<String, Value>,
        options: &Options,
    ) -> Result<Option<Value>, BoxError> {
        if self.hidden {
            return Ok(None);
        }
        if self.holder.is_empty() {
            return Err("card without holder".into());
        }
        rendered.remove("hidden");
        if let Some(Value::String(number)) = rendered.get_mut("number") {
            let masked = format!("****{}", &number[number.len().saturating_sub(4)..]);
            *number = masked;
        }
        if options.version().is_some() {
            rendered.insert("masked".into(), Value::Bool(true));
        }
        Ok(Some(Value::Object(rendered)))
    }
}

fn card(holder: &str, hidden: bool) -> Card {
    Card {
        number: "4111111111111111".into(),
        holder: holder.into(),
        hidden,
    }
}

#[test]
fn hook_sees_only_permitted_fields() {
    let out = marshal(&Options::new().groups(["other"]), &card("Alice", false)).unwrap();
    assert_eq!(out, json!({"holder": "Alice"}));

    let out = marshal(&Options::new().groups(["billing"]), &card("Alice", false)).unwrap();
    assert_eq!(out, json!({"number": "****1111", "holder": "Alice"}));
}

#[test]
fn hook_receives_options() {
    let options = Options::new().api_version(Version::new(1, 0, 0));
    let out = marshal(&options, &card("Alice", false)).unwrap();
    assert_eq!(out["masked"], json!(true));
}

#[test]
fn hook_can_omit_value() {
    let cards = vec![card("Alice", false), card("Bob", true)];
    let out = marshal(&Options::new(), &cards).unwrap();
    assert_eq!(out.as_array().unwrap().len(), 1);
    assert_eq!(marshal(&Options::new(), &card("Bob", true)).unwrap(), Value::Null);
}

#[test]
fn hook_failure_aborts_the_call() {
    let cards = vec![card("Alice", false), card("", false)];
    let err = marshal(&Options::new(), &cards).unwrap_err();
    match err {
        WardenError::Hook {
            type_name, path, ..
        } => {
            assert_eq!(type_name, "Card");
            assert_eq!(path, "$[1]");
        }
        other => panic!("expected hook error, got {other:?}"),
    }
}

// ============================================================================
// Cycles and shared references
// ============================================================================

struct Node {
    name: String,
    left: RefCell<Option<Rc<Node>>>,
    right: RefCell<Option<Rc<Node>>>,
}

fields! {
    Node {
        name,
        left,
        right,
    }
}

fn node(name: &str) -> Rc<Node> {
    Rc::new(Node {
        name: name.into(),
        left: RefCell::new(None),
        right: RefCell::new(None),
    })
}

#[test]
fn self_reference_through_two_paths_is_cyclic() {
    let root = node("root");
    *root.left.borrow_mut() = Some(Rc::clone(&root));
    *root.right.borrow_mut() = Some(Rc::clone(&root));

    let err = marshal(&Options::new(), &root).unwrap_err();
    match err {
        WardenError::CyclicGraph { path } => assert_eq!(path, "$.left"),
        other => panic!("expected cyclic graph, got {other:?}"),
    }

    // Break the cycle so the test does not leak.
    root.left.borrow_mut().take();
    root.right.borrow_mut().take();
}

#[test]
fn shared_acyclic_reference_renders_twice() {
    let root = node("root");
    let leaf = node("leaf");
    *root.left.borrow_mut() = Some(Rc::clone(&leaf));
    *root.right.borrow_mut() = Some(Rc::clone(&leaf));

    let out = marshal(&Options::new(), &root).unwrap();
    assert_eq!(out["left"], out["right"]);
    assert_eq!(out["left"]["name"], json!("leaf"));
}

#[test]
fn excluded_cycle_edge_is_never_walked() {
    struct Guarded {
        name: String,
        parent: RefCell<Option<Rc<Guarded>>>,
    }
    fields! {
        Guarded {
            name,
            parent.groups("debug"),
        }
    }

    let g = Rc::new(Guarded {
        name: "g".into(),
        parent: RefCell::new(None),
    });
    *g.parent.borrow_mut() = Some(Rc::clone(&g));

    let out = marshal(&api(), &g).unwrap();
    assert_eq!(out, json!({"name": "g"}));
    g.parent.borrow_mut().take();
}

#[test]
fn arc_values_render_through() {
    let shared = Arc::new(profile(Some("al")));
    let list = vec![Arc::clone(&shared), shared];
    let out = marshal(&api(), &list).unwrap();
    assert_eq!(out, json!([{"nickname": "al"}, {"nickname": "al"}]));
}

// ============================================================================
// Configuration errors
// ============================================================================

struct BadVersion {
    roles: Vec<String>,
}

fields! {
    BadVersion {
        roles.since("two"),
    }
}

#[test]
fn malformed_since_is_reported_eagerly() {
    assert!(matches!(
        registry::describe::<BadVersion>(),
        Err(WardenError::Configuration { .. })
    ));
    let value = BadVersion { roles: vec![] };
    assert!(matches!(
        marshal(&Options::new(), &value),
        Err(WardenError::Configuration { .. })
    ));
}

struct Mismatched {
    a: u32,
}

impl Fields for Mismatched {
    fn field_tags() -> Vec<FieldTag> {
        vec![tag("a"), tag("b")]
    }

    fn field_values(&self) -> Vec<&dyn Marshal> {
        vec![&self.a as &dyn Marshal]
    }
}

impl Marshal for Mismatched {
    fn marshal(
        &self,
        walker: &mut warden_core::Walker<'_>,
    ) -> warden_core::Result<Option<Value>> {
        walker.object(self)
    }
}

#[test]
fn field_count_mismatch_is_configuration_error() {
    let err = marshal(&Options::new(), &Mismatched { a: 1 }).unwrap_err();
    assert!(err.to_string().contains("2 field tags but 1 field values"));
}

#[test]
fn descriptors_are_cached_once_per_type() {
    let first = registry::describe::<Profile>().unwrap();
    let second = registry::describe::<Profile>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(registry::cached_types() >= 1);
}

#[test]
fn concurrent_first_use_agrees() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| registry::describe::<Audit>().unwrap()))
        .collect();
    let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for d in &descriptors {
        assert_eq!(**d, *descriptors[0]);
    }
}
