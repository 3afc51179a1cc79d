//! The per-thread scheduler owning the shared stack and the registry.

pub(crate) mod scheduler;

pub use scheduler::{scheduler, Scheduler};
pub(crate) use scheduler::try_scheduler;

/// Identity of a registered coroutine.
///
/// Assigned from a monotonically increasing counter starting at 1 and never
/// reused within the runtime's lifetime.
pub type CoroutineId = u64;

/// Why a resume attempt could not advance a coroutine.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResumeError {
    /// No coroutine is registered under this id: never issued, already
    /// removed, or evicted by a [`Scheduler::size`] sweep. Recoverable;
    /// [`resume`](crate::resume) maps it to `false`.
    #[error("no coroutine registered under id {0}")]
    UnknownId(CoroutineId),

    /// The target coroutine is the one currently running, meaning the call
    /// came from inside its own frame. The cooperative invariant has been
    /// violated and the stack state is no longer consistent; this must not
    /// be caught and retried. [`resume`](crate::resume) panics on it.
    #[error("coroutine {0} resumed from inside its own running frame")]
    Reentrant(CoroutineId),
}
