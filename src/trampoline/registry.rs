//! Process-wide trampoline slots.
//!
//! Maps a slot key to the closure currently bound to it. The lock only keeps
//! the map itself consistent; it does not order binds against calls made
//! through previously returned pointers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

type Stored = Arc<dyn Any + Send + Sync>;

static SLOTS: LazyLock<RwLock<HashMap<TypeId, Stored>>> = LazyLock::new(Default::default);

/// Put `value` in slot `key`. Returns true if an earlier binding was replaced.
pub(crate) fn store<F>(key: TypeId, value: F) -> bool
where
    F: Send + Sync + 'static,
{
    let mut slots = SLOTS.write().unwrap_or_else(PoisonError::into_inner);
    slots.insert(key, Arc::new(value)).is_some()
}

/// Fetch the closure bound to `key`, if it is an `F`.
pub(crate) fn load<F>(key: TypeId) -> Option<Arc<F>>
where
    F: Send + Sync + 'static,
{
    let stored = {
        let slots = SLOTS.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(&key).cloned()?
    };
    stored.downcast::<F>().ok()
}

pub(crate) fn is_occupied(key: TypeId) -> bool {
    SLOTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeyA;
    struct KeyB;

    #[test]
    fn test_store_and_load() {
        let key = TypeId::of::<KeyA>();
        assert!(!store(key, 7u32));
        assert_eq!(load::<u32>(key).as_deref(), Some(&7));
        assert!(store(key, 9u32));
        assert_eq!(load::<u32>(key).as_deref(), Some(&9));
    }

    #[test]
    fn test_wrong_type_is_none() {
        let key = TypeId::of::<KeyB>();
        store(key, 1u8);
        assert!(is_occupied(key));
        assert!(load::<u16>(key).is_none());
    }
}
