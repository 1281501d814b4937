//! Unidirectional state container: a [`Store`] owns state, [`Reducer`]s
//! mutate it in response to actions, and [`Effect`]s describe the
//! asynchronous work whose results come back as more actions.

pub mod config;
pub mod effect;
pub mod garage;
pub mod logging;
pub mod reducer;
pub mod store;

pub use effect::{
    settle, CancelId, Effect, EffectShape, Scheduler, SharedScheduler, TestScheduler,
    TokioScheduler,
};
pub use reducer::{from_fn, CasePath, Lens, Reducer, ReducerExt};
pub use store::{ScopedStore, Store, StoreError, StoreOptions};
