//! Cooperative stackful coroutines multiplexed onto one shared stack.
//!
//! Every coroutine executes, one at a time, on a single stack region owned
//! by the per-thread [`Scheduler`]. Suspending copies the occupied tail of
//! that stack into the coroutine's private buffer; resuming copies it back
//! and switches in. Many short-lived coroutines thereby share the memory of
//! one stack instead of each owning their own.
//!
//! A unit of work implements [`Runnable`]: a `run` body that may call
//! [`Yielder::yield_with`] any number of times, producing a typed value at
//! each suspension. [`spawn`] registers the body and runs it to its first
//! suspend point; [`resume`] drives it onward, one suspend point per call.
//!
//! # Example
//!
//! ```
//! use costack::{resume, spawn, Runnable, Yielder};
//!
//! #[derive(Default)]
//! struct Digits;
//!
//! impl Runnable for Digits {
//!     type Yield = i32;
//!
//!     fn run(&mut self, y: &mut Yielder<i32>) {
//!         for i in 0..10 {
//!             y.yield_with(i);
//!         }
//!     }
//! }
//!
//! let co = spawn::<Digits>();
//! let mut seen = vec![co.value().unwrap()]; // first yield happened in spawn
//! while resume(co.id()) {
//!     seen.push(co.value().unwrap());
//! }
//! assert_eq!(seen, (0..10).collect::<Vec<_>>());
//! ```

pub(crate) mod arch;
pub mod cfg;
pub mod coroutine;
pub mod handle;
pub mod scheduler;
pub(crate) mod stack;
pub(crate) mod utils;

pub use coroutine::{CoState, Coroutine, Runnable, Yielder};
pub use handle::{spawn, spawn_with, Handle};
pub use scheduler::scheduler::scheduler;
pub use scheduler::{CoroutineId, ResumeError, Scheduler};

/// Advances the coroutine identified by `id`; see [`Scheduler::resume`].
pub fn resume(id: CoroutineId) -> bool {
    scheduler().resume(id)
}

/// Typed-result form of [`resume`]; see [`Scheduler::try_resume`].
pub fn try_resume(id: CoroutineId) -> Result<bool, ResumeError> {
    scheduler().try_resume(id)
}
