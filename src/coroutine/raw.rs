use crate::arch::Context;
use crate::coroutine::CoState;
use crate::scheduler::CoroutineId;
use crate::stack::StackSnapshot;

/// The untyped part of a coroutine record: saved context, snapshot buffer,
/// state, and the registry id assigned at creation.
pub(crate) struct RawCoroutine {
    ctx: Context,
    snapshot: StackSnapshot,
    state: CoState,
    id: CoroutineId,
}

impl RawCoroutine {
    pub(crate) fn new() -> Self {
        RawCoroutine {
            ctx: Context::default(),
            snapshot: StackSnapshot::new(),
            state: CoState::Free,
            id: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> CoState {
        self.state
    }

    #[inline(always)]
    pub(crate) fn set_state(&mut self, state: CoState) {
        self.state = state;
    }

    #[inline(always)]
    pub(crate) fn id(&self) -> CoroutineId {
        self.id
    }

    #[inline(always)]
    pub(crate) fn set_id(&mut self, id: CoroutineId) {
        self.id = id;
    }

    #[inline(always)]
    pub(crate) fn set_ctx(&mut self, ctx: Context) {
        self.ctx = ctx;
    }

    #[inline(always)]
    pub(crate) fn ctx(&self) -> *const Context {
        &self.ctx
    }

    #[inline(always)]
    pub(crate) fn ctx_mut(&mut self) -> *mut Context {
        &mut self.ctx
    }

    /// Captures the occupied tail of the shared stack into the snapshot
    /// buffer.
    ///
    /// The extent is measured from a local anchor in this frame up to
    /// `stack_bottom`. Must run on the shared stack, deeper than every
    /// frame that has to survive the suspension; `inline(never)` keeps the
    /// anchor below the caller's frame.
    #[inline(never)]
    pub(crate) fn capture(&mut self, stack_bottom: *mut u8) {
        let mut anchor = 0u8;
        let top = std::hint::black_box(&mut anchor as *mut u8);
        let used = stack_bottom as usize - top as usize;
        unsafe { self.snapshot.save(top, used) };
    }

    /// Copies the snapshot back into the tail of the shared stack. Must run
    /// off the shared stack (the main flow), before switching in.
    pub(crate) fn restore(&mut self, stack_bottom: *mut u8) {
        unsafe { self.snapshot.restore(stack_bottom) };
    }

    /// Bytes held by the last capture.
    #[inline(always)]
    pub(crate) fn captured_len(&self) -> usize {
        self.snapshot.len()
    }
}
