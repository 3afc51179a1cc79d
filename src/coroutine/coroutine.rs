use std::ptr;

use log::trace;

use crate::arch;
use crate::coroutine::{CoState, RawCoroutine, Runnable, Yielder};
use crate::scheduler::{scheduler, ResumeError};
use crate::utils::Ptr;

/// A typed coroutine record: the untyped state machine plus the value slot
/// and the user body.
///
/// The record is owned by its [`Handle`](crate::Handle); the scheduler only
/// holds a non-owning back-reference for as long as the record is
/// registered.
pub struct Coroutine<R: Runnable> {
    raw: RawCoroutine,
    value: Option<R::Yield>,
    body: R,
}

impl<R: Runnable> Coroutine<R> {
    pub(crate) fn new(body: R) -> Self {
        Coroutine {
            raw: RawCoroutine::new(),
            value: None,
            body,
        }
    }

    /// The most recently yielded value, or `None` if the body has not
    /// yielded yet.
    pub fn value(&self) -> Option<&R::Yield> {
        self.value.as_ref()
    }

    pub(crate) fn raw(&self) -> &RawCoroutine {
        &self.raw
    }

    pub(crate) fn raw_mut(&mut self) -> &mut RawCoroutine {
        &mut self.raw
    }

    /// Runs the body to completion. Called from the entry trampoline, on
    /// the shared stack, with the record already Running.
    ///
    /// The [`Yielder`] reaches back into this record through raw field
    /// pointers, so the body holds `&mut` only to itself.
    pub(crate) fn dispatch(&mut self) {
        let raw = Ptr::from_raw(ptr::addr_of_mut!(self.raw));
        let slot = Ptr::from_raw(ptr::addr_of_mut!(self.value));
        let mut yielder = Yielder::new(raw, slot);
        self.body.run(&mut yielder);
    }
}

/// The scheduler's type-erased view of a registered record.
pub(crate) trait Schedulable {
    fn raw_mut(&mut self) -> &mut RawCoroutine;

    fn state(&self) -> CoState;

    /// The resume state machine shared by every coroutine.
    ///
    /// - Free: the body never started or already returned; nothing to do.
    /// - Running: the caller is resuming the coroutine whose frame it is
    ///   currently inside; the stack state is no longer consistent and the
    ///   violation must not be swallowed.
    /// - Suspended: put the captured bytes back on the shared stack, switch
    ///   in, and once control comes back report whether a fresh value was
    ///   produced (Suspended again) or the body finished (Free).
    fn advance(&mut self) -> Result<bool, ResumeError> {
        let raw = self.raw_mut();
        match raw.state() {
            CoState::Free => Ok(false),
            CoState::Running => Err(ResumeError::Reentrant(raw.id())),
            CoState::Suspended => {
                let sched = scheduler();
                trace!(
                    "coroutine {} resuming, restoring {} stack bytes",
                    raw.id(),
                    raw.captured_len()
                );
                raw.restore(sched.stack_bottom());
                raw.set_state(CoState::Running);
                unsafe { arch::context_switch(sched.main_context(), raw.ctx()) };
                Ok(raw.state() == CoState::Suspended)
            }
        }
    }
}

impl<R: Runnable> Schedulable for Coroutine<R> {
    fn raw_mut(&mut self) -> &mut RawCoroutine {
        &mut self.raw
    }

    fn state(&self) -> CoState {
        self.raw.state()
    }
}
