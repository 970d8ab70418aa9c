//! Callback table: at most one callback per event category.
//!
//! Slots are independent and last write wins. Readers clone the slot's `Arc`
//! under the read lock, so a dispatch pass sees either the old or the new
//! callback, never a half-written slot.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tox4rs_protocol::{EventRecord, TypedEvent};

pub type Callback<Ev> = Arc<dyn Fn(&Ev) + Send + Sync>;

pub struct CallbackTable<Ev: EventRecord> {
    slots: RwLock<HashMap<Ev::Category, Callback<Ev>>>,
}

impl<Ev: EventRecord> CallbackTable<Ev> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Install `callback` for `category`, returning the one it replaced.
    pub fn set(&self, category: Ev::Category, callback: Callback<Ev>) -> Option<Callback<Ev>> {
        tracing::trace!(?category, "callback registered");
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(category, callback)
    }

    /// Empty the slot for `category`.
    pub fn clear(&self, category: Ev::Category) -> Option<Callback<Ev>> {
        tracing::trace!(?category, "callback cleared");
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&category)
    }

    /// Snapshot of the current callback for `category`.
    pub fn get(&self, category: Ev::Category) -> Option<Callback<Ev>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&category)
            .cloned()
    }

    pub fn is_registered(&self, category: Ev::Category) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&category)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typed registration: `f` receives the payload of category `P`.
    pub fn register<P, F>(&self, f: F)
    where
        P: TypedEvent<Ev>,
        F: Fn(&P) + Send + Sync + 'static,
    {
        let callback: Callback<Ev> = Arc::new(move |record: &Ev| {
            if let Some(payload) = P::project(record) {
                f(payload)
            }
        });
        self.set(P::CATEGORY, callback);
    }

    pub fn unregister<P: TypedEvent<Ev>>(&self) {
        self.clear(P::CATEGORY);
    }
}

impl<Ev: EventRecord> Default for CallbackTable<Ev> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tox4rs_protocol::events::session::{FriendMessage, FriendName};
    use tox4rs_protocol::{CoreEvent, EventCategory};

    fn name_event() -> CoreEvent {
        FriendName {
            friend_number: 1,
            name: b"Ann".to_vec(),
        }
        .into()
    }

    #[test]
    fn test_empty_table() {
        let table = CallbackTable::<CoreEvent>::new();
        assert!(table.is_empty());
        assert!(table.get(EventCategory::FriendName).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let table = CallbackTable::<CoreEvent>::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = first.clone();
        table.register::<FriendName, _>(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = second.clone();
        table.register::<FriendName, _>(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        let callback = table.get(EventCategory::FriendName).unwrap();
        callback(&name_event());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_slots_independent() {
        let table = CallbackTable::<CoreEvent>::new();
        table.register::<FriendName, _>(|_| {});
        table.register::<FriendMessage, _>(|_| {});
        table.unregister::<FriendMessage>();
        assert!(table.is_registered(EventCategory::FriendName));
        assert!(!table.is_registered(EventCategory::FriendMessage));
    }

    #[test]
    fn test_typed_callback_receives_fields() {
        let table = CallbackTable::<CoreEvent>::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        table.register::<FriendName, _>(move |e| {
            sink.lock().unwrap().push((e.friend_number, e.name.clone()));
        });
        table.get(EventCategory::FriendName).unwrap()(&name_event());
        assert_eq!(*seen.lock().unwrap(), vec![(1, b"Ann".to_vec())]);
    }

    #[test]
    fn test_set_returns_previous() {
        let table = CallbackTable::<CoreEvent>::new();
        assert!(table.set(EventCategory::FriendName, Arc::new(|_| {})).is_none());
        assert!(table.set(EventCategory::FriendName, Arc::new(|_| {})).is_some());
        assert!(table.clear(EventCategory::FriendName).is_some());
        assert!(table.clear(EventCategory::FriendName).is_none());
    }
}
