//! Process-wide cache of type descriptors.
//!
//! Descriptors are built on first use of a type and kept for the life of the
//! process. Lookups take a read lock; a miss builds the descriptor without
//! holding any lock and then inserts it, keeping whichever entry landed first.
//! Two threads racing on the same type may both build it; the results are
//! identical. Build failures are not cached.

use crate::error::Result;
use crate::tag::TypeDescriptor;
use crate::walker::Fields;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

type Cache = RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>;

static CACHE: OnceLock<Cache> = OnceLock::new();

fn cache() -> &'static Cache {
    CACHE.get_or_init(Cache::default)
}

/// Descriptor for `T`, built and cached on first call.
///
/// Calling this at startup surfaces malformed field tags before any value of
/// `T` is marshalled.
pub fn describe<T: Fields>() -> Result<Arc<TypeDescriptor>> {
    let id = TypeId::of::<T>();
    if let Some(hit) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return Ok(Arc::clone(hit));
    }

    let built = Arc::new(TypeDescriptor::build(T::type_name(), &T::field_tags())?);
    debug!(
        type_name = built.type_name(),
        fields = built.fields().len(),
        "type descriptor built"
    );

    let mut guard = cache().write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(guard.entry(id).or_insert(built)))
}

/// Number of types currently cached.
pub fn cached_types() -> usize {
    cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}
