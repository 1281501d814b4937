//! Child views onto a store.

use std::sync::Arc;

/// A projection of a [`Store`](super::Store) for one child feature.
///
/// Reads map the parent state through `to_local`; sends wrap the child
/// action and go through the parent store, so the parent reducer sees them.
pub struct ScopedStore<S, A> {
    read: Arc<dyn Fn() -> S + Send + Sync>,
    write: Arc<dyn Fn(A) + Send + Sync>,
}

impl<S, A> Clone for ScopedStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}

impl<S: 'static, A: 'static> ScopedStore<S, A> {
    pub(crate) fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn() -> S + Send + Sync + 'static,
        W: Fn(A) + Send + Sync + 'static,
    {
        Self {
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    pub fn state(&self) -> S {
        (self.read)()
    }

    pub fn send(&self, action: A) {
        (self.write)(action)
    }

    /// Narrows this view further.
    pub fn scope<CS, CA, T, F>(&self, to_local: T, from_local: F) -> ScopedStore<CS, CA>
    where
        CS: 'static,
        CA: 'static,
        T: Fn(&S) -> CS + Send + Sync + 'static,
        F: Fn(CA) -> A + Send + Sync + 'static,
    {
        let read = Arc::clone(&self.read);
        let write = Arc::clone(&self.write);
        ScopedStore::new(
            move || to_local(&read()),
            move |action| write(from_local(action)),
        )
    }
}
