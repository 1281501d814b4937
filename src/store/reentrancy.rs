use std::cell::RefCell;

use uuid::Uuid;

thread_local! {
    static REDUCING: RefCell<Vec<Uuid>> = const { RefCell::new(Vec::new()) };
}

/// Marks the current thread as inside a reducer of one store until dropped.
pub(super) struct ReducingGuard {
    store: Uuid,
}

impl ReducingGuard {
    pub(super) fn enter(store: Uuid) -> Self {
        REDUCING.with(|stack| stack.borrow_mut().push(store));
        Self { store }
    }

    pub(super) fn is_active(store: Uuid) -> bool {
        REDUCING.with(|stack| stack.borrow().contains(&store))
    }
}

impl Drop for ReducingGuard {
    fn drop(&mut self) {
        REDUCING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|id| *id == self.store) {
                stack.remove(pos);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_scoped_to_one_store() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        {
            let _guard = ReducingGuard::enter(a);
            assert!(ReducingGuard::is_active(a));
            assert!(!ReducingGuard::is_active(b));
        }
        assert!(!ReducingGuard::is_active(a));
    }
}
