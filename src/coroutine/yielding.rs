use log::trace;

use crate::arch;
use crate::coroutine::{CoState, RawCoroutine};
use crate::scheduler::scheduler;
use crate::utils::Ptr;

/// The suspension half of a coroutine, handed to
/// [`Runnable::run`](crate::Runnable::run).
///
/// Holds non-owning pointers back into the coroutine's own record; it is
/// only alive while the body executes on the shared stack.
pub struct Yielder<T> {
    raw: Ptr<RawCoroutine>,
    slot: Ptr<Option<T>>,
}

impl<T> Yielder<T> {
    pub(crate) fn new(raw: Ptr<RawCoroutine>, slot: Ptr<Option<T>>) -> Self {
        Yielder { raw, slot }
    }

    /// Produces `value` and suspends the coroutine until the next resume.
    ///
    /// Stores the value in the record's slot, captures the occupied tail of
    /// the shared stack into the private buffer, flips the state to
    /// Suspended, and switches back to the scheduler's main context. When
    /// the coroutine is resumed, execution continues right here.
    ///
    /// Legal only while the coroutine is Running; otherwise a no-op.
    pub fn yield_with(&mut self, value: T) {
        let raw = unsafe { self.raw.as_mut() };
        if raw.state() != CoState::Running {
            return;
        }

        *unsafe { self.slot.as_mut() } = Some(value);

        let sched = scheduler();
        trace!("coroutine {} suspending", raw.id());

        // Nothing stack-resident may change between the capture and the
        // switch; the snapshot must match what the saved context sees on
        // resume.
        raw.capture(sched.stack_bottom());
        raw.set_state(CoState::Suspended);
        unsafe { arch::context_switch(raw.ctx_mut(), sched.main_context()) };
    }
}
