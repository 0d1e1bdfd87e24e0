use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifier of a displayable reference handed out by a [`HandleRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(pub u64);

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    live: BTreeSet<u64>,
    created: u64,
    revoked: u64,
}

/// Registry of revocable displayable references (`blob:` style URLs).
///
/// Every [`DisplayHandle`] created here is revoked exactly once, when the handle is dropped.
/// Cloning the registry shares the same underlying state.
#[derive(Clone, Debug, Default)]
pub struct HandleRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl HandleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new displayable reference for `label`.
    pub fn create(&self, label: &str) -> DisplayHandle {
        let mut st = self.lock();
        let id = st.next_id;
        st.next_id += 1;
        st.created += 1;
        st.live.insert(id);
        drop(st);

        DisplayHandle {
            id: HandleId(id),
            url: format!("blob:stills2video/{id}/{label}"),
            registry: self.clone(),
        }
    }

    /// Whether `id` has been created and not yet revoked.
    pub fn is_live(&self, id: HandleId) -> bool {
        self.lock().live.contains(&id.0)
    }

    /// Number of handles currently live.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Total number of handles ever created.
    pub fn created_count(&self) -> u64 {
        self.lock().created
    }

    /// Total number of handles revoked so far.
    pub fn revoked_count(&self) -> u64 {
        self.lock().revoked
    }

    fn revoke(&self, id: HandleId) {
        let mut st = self.lock();
        if st.live.remove(&id.0) {
            st.revoked += 1;
        } else {
            tracing::warn!(handle = id.0, "revoke of a handle that is not live");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Every mutation is a single step, so a poisoned lock still guards consistent state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Owned displayable reference; revoked when dropped.
///
/// Not `Clone`: ownership is what guarantees a single revocation.
#[derive(Debug)]
pub struct DisplayHandle {
    id: HandleId,
    url: String,
    registry: HandleRegistry,
}

impl DisplayHandle {
    /// Registry-assigned id.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The reference a presentation layer would display.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for DisplayHandle {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_revokes_exactly_once() {
        let reg = HandleRegistry::new();
        let a = reg.create("a.png");
        let b = reg.create("b.png");
        assert_ne!(a.id(), b.id());
        assert_eq!(reg.live_count(), 2);

        let a_id = a.id();
        drop(a);
        assert!(!reg.is_live(a_id));
        assert!(reg.is_live(b.id()));
        assert_eq!(reg.revoked_count(), 1);

        drop(b);
        assert_eq!(reg.live_count(), 0);
        assert_eq!(reg.created_count(), 2);
        assert_eq!(reg.revoked_count(), 2);
    }

    #[test]
    fn urls_are_unique_and_labelled() {
        let reg = HandleRegistry::new();
        let a = reg.create("x.png");
        let b = reg.create("x.png");
        assert_ne!(a.url(), b.url());
        assert!(a.url().starts_with("blob:stills2video/"));
        assert!(a.url().ends_with("/x.png"));
    }
}
