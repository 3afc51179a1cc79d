//! The coroutine state machine, the typed record, and the authoring traits.

pub(crate) mod coroutine;
pub(crate) mod raw;
pub(crate) mod runnable;
pub(crate) mod state;
pub(crate) mod yielding;

pub use coroutine::Coroutine;
pub use runnable::Runnable;
pub use state::CoState;
pub use yielding::Yielder;

pub(crate) use coroutine::Schedulable;
pub(crate) use raw::RawCoroutine;
