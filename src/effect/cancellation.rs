//! Cancellation identities and the per-store registry of in-flight work.
//!
//! Every cancellable effect owns a [`CancelToken`]. The registry maps a
//! [`CancelId`] to the token of the single live registration under that id;
//! installing a new registration cancels the previous token first.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

/// Object-safe view of a hashable key.
trait DynKey: Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<K> DynKey for K
where
    K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other
            .as_any()
            .downcast_ref::<K>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// A type-erased, hashable cancellation identity.
///
/// Two ids are equal when they wrap values of the same type that compare
/// equal, so marker structs declared per feature never collide:
///
/// ```
/// use velostore::CancelId;
///
/// #[derive(Debug, Hash, PartialEq, Eq)]
/// struct SaveDebounce;
///
/// assert_eq!(CancelId::new(SaveDebounce), CancelId::new(SaveDebounce));
/// assert_ne!(CancelId::new(SaveDebounce), CancelId::new("SaveDebounce"));
/// ```
#[derive(Clone)]
pub struct CancelId(Arc<dyn DynKey>);

impl CancelId {
    pub fn new<K>(key: K) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        if let Some(id) = (&key as &dyn Any).downcast_ref::<CancelId>() {
            return id.clone();
        }
        Self(Arc::new(key))
    }

    /// A fresh identity that is equal only to its own clones.
    pub fn unique() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl PartialEq for CancelId {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl Eq for CancelId {}

impl Hash for CancelId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_any().type_id().hash(state);
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CancelId({:?})", self.0)
    }
}

/// Cancellation signal shared between the registry and one running effect.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        // Enable the waiter before reading the flag, otherwise a cancel racing
        // between the check and the await is lost.
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    fn same(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One live registration: the token plus a generation for diagnostics.
struct Registration {
    generation: u64,
    token: CancelToken,
}

/// Table of live cancellable effects for one store.
///
/// Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    entries: Arc<Mutex<HashMap<CancelId, Registration>>>,
    generations: Arc<AtomicU64>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new registration under `id`, cancelling the previous one.
    pub fn register(&self, id: CancelId) -> CancelToken {
        let token = CancelToken::new();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.entries.lock().insert(
            id.clone(),
            Registration {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
            tracing::debug!(
                ?id,
                replaced = previous.generation,
                generation,
                "cancelled in-flight effect"
            );
        } else {
            tracing::trace!(?id, generation, "registered cancellable effect");
        }
        token
    }

    /// Cancels and removes whatever is registered under `id`.
    ///
    /// Returns `true` when something was cancelled.
    pub fn cancel(&self, id: &CancelId) -> bool {
        let removed = self.entries.lock().remove(id);
        match removed {
            Some(registration) => {
                registration.token.cancel();
                tracing::debug!(?id, generation = registration.generation, "cancelled effect");
                true
            }
            None => false,
        }
    }

    /// Removes the registration under `id` if it is still `token`.
    ///
    /// Called when an effect finishes on its own; a newer registration under
    /// the same id is left untouched.
    pub fn complete(&self, id: &CancelId, token: &CancelToken) {
        let mut entries = self.entries.lock();
        if entries.get(id).is_some_and(|r| r.token.same(token)) {
            entries.remove(id);
        }
    }

    /// Cancels every registration.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.entries.lock().drain().collect();
        for (id, registration) in drained {
            registration.token.cancel();
            tracing::trace!(?id, "cancelled during teardown");
        }
    }

    pub fn is_registered(&self, id: &CancelId) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
