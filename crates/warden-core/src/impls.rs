//! [`Marshal`] implementations for standard library, `serde_json` and
//! `chrono` types.
//!
//! - scalars render as themselves; non-finite floats are unsupported
//! - `None` renders as `null`
//! - sequences render element-wise, maps value-wise with string keys
//! - `Rc` / `Arc` (and upgraded weak pointers) are tracked for cycles
//! - `HashMap` entries are emitted in key order so output is deterministic

use crate::error::Result;
use crate::walker::{Marshal, Walker};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::rc::{self, Rc};
use std::sync::{self, Arc, Mutex, RwLock, TryLockError};

/// Conversion of map keys to output keys. Keys are never filtered.
pub trait MapKey {
    fn map_key(&self) -> String;
}

impl MapKey for str {
    fn map_key(&self) -> String {
        self.to_string()
    }
}

impl MapKey for String {
    fn map_key(&self) -> String {
        self.clone()
    }
}

impl<K: MapKey + ?Sized> MapKey for &K {
    fn map_key(&self) -> String {
        (**self).map_key()
    }
}

macro_rules! display_map_key {
    ($($t:ty),*) => {
        $(
            impl MapKey for $t {
                fn map_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_map_key!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! number_marshal {
    ($($t:ty),*) => {
        $(
            impl Marshal for $t {
                fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
                    Ok(Some(Value::from(*self)))
                }
            }
        )*
    };
}

number_marshal!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Marshal for f64 {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        Number::from_f64(*self)
            .map(|n| Some(Value::Number(n)))
            .ok_or_else(|| walker.unsupported(format!("non-finite number {self}")))
    }
}

impl Marshal for f32 {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        f64::from(*self).marshal(walker)
    }
}

impl Marshal for char {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::String(self.to_string())))
    }
}

impl Marshal for str {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::String(self.to_string())))
    }
}

impl Marshal for String {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::String(self.clone())))
    }
}

impl Marshal for () {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::Null))
    }
}

impl<T: Marshal + ?Sized> Marshal for &T {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        (**self).marshal(walker)
    }
}

impl<T: Marshal + ?Sized> Marshal for Box<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        (**self).marshal(walker)
    }
}

impl<T: Marshal> Marshal for Option<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self {
            Some(inner) => inner.marshal(walker),
            None => Ok(Some(Value::Null)),
        }
    }
}

impl<T: Marshal> Marshal for [T] {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        walker.sequence(self.iter())
    }
}

impl<T: Marshal, const N: usize> Marshal for [T; N] {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        walker.sequence(self.iter())
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        walker.sequence(self.iter())
    }
}

impl<T: Marshal> Marshal for VecDeque<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        walker.sequence(self.iter())
    }
}

impl<T: Marshal> Marshal for BTreeSet<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        walker.sequence(self.iter())
    }
}

impl<K: MapKey, V: Marshal> Marshal for BTreeMap<K, V> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        walker.mapping(self.iter().map(|(k, v)| (k.map_key(), v)))
    }
}

impl<K: MapKey, V: Marshal, S: BuildHasher> Marshal for HashMap<K, V, S> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        let mut entries: Vec<(String, &V)> = self.iter().map(|(k, v)| (k.map_key(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        walker.mapping(entries)
    }
}

impl<T: Marshal + ?Sized> Marshal for Rc<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        let address = Rc::as_ptr(self).cast::<()>() as usize;
        walker.shared(address, |w| (**self).marshal(w))
    }
}

impl<T: Marshal + ?Sized> Marshal for Arc<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        let address = Arc::as_ptr(self).cast::<()>() as usize;
        walker.shared(address, |w| (**self).marshal(w))
    }
}

impl<T: Marshal + ?Sized> Marshal for rc::Weak<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self.upgrade() {
            Some(strong) => strong.marshal(walker),
            None => Ok(Some(Value::Null)),
        }
    }
}

impl<T: Marshal + ?Sized> Marshal for sync::Weak<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self.upgrade() {
            Some(strong) => strong.marshal(walker),
            None => Ok(Some(Value::Null)),
        }
    }
}

impl<T: Marshal + ?Sized> Marshal for RefCell<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self.try_borrow() {
            Ok(inner) => inner.marshal(walker),
            Err(_) => Err(walker.unsupported("value is mutably borrowed")),
        }
    }
}

impl<T: Marshal + ?Sized> Marshal for Mutex<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self.try_lock() {
            Ok(inner) => inner.marshal(walker),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().marshal(walker),
            Err(TryLockError::WouldBlock) => Err(walker.unsupported("mutex is locked")),
        }
    }
}

impl<T: Marshal + ?Sized> Marshal for RwLock<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        match self.try_read() {
            Ok(inner) => inner.marshal(walker),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().marshal(walker),
            Err(TryLockError::WouldBlock) => Err(walker.unsupported("lock is held for writing")),
        }
    }
}

impl Marshal for Value {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(self.clone()))
    }
}

impl Marshal for Map<String, Value> {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::Object(self.clone())))
    }
}

impl Marshal for Number {
    fn marshal(&self, _: &mut Walker<'_>) -> Result<Option<Value>> {
        Ok(Some(Value::Number(self.clone())))
    }
}

/// Renders the wrapped value through its `serde::Serialize` impl, without
/// field filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Verbatim<T>(pub T);

impl<T: Serialize> Marshal for Verbatim<T> {
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        serialized(&self.0, walker)
    }
}

fn serialized<T: Serialize + ?Sized>(value: &T, walker: &Walker<'_>) -> Result<Option<Value>> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| walker.unsupported(e.to_string()))
}

impl<Tz: chrono::TimeZone> Marshal for chrono::DateTime<Tz>
where
    chrono::DateTime<Tz>: Serialize,
{
    fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
        serialized(self, walker)
    }
}

macro_rules! chrono_marshal {
    ($($t:ty),*) => {
        $(
            impl Marshal for $t {
                fn marshal(&self, walker: &mut Walker<'_>) -> Result<Option<Value>> {
                    serialized(self, walker)
                }
            }
        )*
    };
}

chrono_marshal!(chrono::NaiveDate, chrono::NaiveTime, chrono::NaiveDateTime);
