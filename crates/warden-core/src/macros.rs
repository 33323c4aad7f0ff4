//! Declaration macro for struct field metadata.

/// Implement [`Fields`](crate::Fields) and [`Marshal`](crate::Marshal) for a
/// struct by listing its fields with their tag builder calls.
///
/// Each entry is a field name followed by any [`FieldTag`](crate::FieldTag)
/// methods. Fields are emitted in the order listed. Add `with hook` after the
/// type name when the type implements [`MarshalHook`](crate::MarshalHook).
///
/// ```
/// use warden_core::{fields, marshal, Options};
///
/// struct User {
///     username: String,
///     email: String,
///     password: String,
/// }
///
/// fields! {
///     User {
///         username.groups("api"),
///         email.groups("personal"),
///         password.omit(),
///     }
/// }
///
/// let user = User {
///     username: "alice".into(),
///     email: "alice@example.org".into(),
///     password: "hunter2".into(),
/// };
/// let out = marshal(&Options::new().groups(["api"]), &user).unwrap();
/// assert_eq!(out, serde_json::json!({"username": "alice"}));
/// ```
#[macro_export]
macro_rules! fields {
    (@impl $ty:ident [$($hook:tt)*] {
        $( $field:ident $( . $method:ident ( $($arg:expr),* $(,)? ) )* ),* $(,)?
    }) => {
        impl $crate::Fields for $ty {
            fn type_name() -> &'static str {
                ::core::stringify!($ty)
            }

            fn field_tags() -> ::std::vec::Vec<$crate::FieldTag> {
                ::std::vec![
                    $( $crate::tag(::core::stringify!($field)) $( .$method($($arg),*) )* ),*
                ]
            }

            fn field_values(&self) -> ::std::vec::Vec<&dyn $crate::Marshal> {
                ::std::vec![ $( &self.$field as &dyn $crate::Marshal ),* ]
            }

            $($hook)*
        }

        impl $crate::Marshal for $ty {
            fn marshal(
                &self,
                walker: &mut $crate::Walker<'_>,
            ) -> $crate::Result<::core::option::Option<$crate::serde_json::Value>> {
                walker.object(self)
            }
        }
    };
    ($ty:ident with hook { $($body:tt)* }) => {
        $crate::fields!(@impl $ty [
            fn hook(&self) -> ::core::option::Option<&dyn $crate::MarshalHook> {
                ::core::option::Option::Some(self)
            }
        ] { $($body)* });
    };
    ($ty:ident { $($body:tt)* }) => {
        $crate::fields!(@impl $ty [] { $($body)* });
    };
}
