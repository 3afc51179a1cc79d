use std::cell::UnsafeCell;
use std::collections::BTreeMap;
use std::mem;
use std::ptr;

use log::trace;

use crate::arch::{self, Context};
use crate::cfg::config_stack_size;
use crate::coroutine::{CoState, Coroutine, Runnable, Schedulable};
use crate::scheduler::{CoroutineId, ResumeError};
use crate::stack::SharedStack;
use crate::utils::Ptr;

thread_local! {
    static SCHEDULER: UnsafeCell<Option<Scheduler>> = const { UnsafeCell::new(None) };
}

/// Returns this thread's scheduler, constructing it on first access.
///
/// The instance lives in a thread-local slot and is dropped at thread exit;
/// on the main thread that is effectively the process lifetime.
pub fn scheduler() -> &'static mut Scheduler {
    SCHEDULER.with(|cell| {
        let slot = unsafe { &mut *cell.get() };
        slot.get_or_insert_with(|| Scheduler::new(config_stack_size()))
    })
}

/// Like [`scheduler`], but without constructing: `None` when the slot was
/// never initialized or has already been torn down (thread exit).
pub(crate) fn try_scheduler() -> Option<&'static mut Scheduler> {
    SCHEDULER
        .try_with(|cell| unsafe { (*cell.get()).as_mut().map(|s| &mut *(s as *mut Scheduler)) })
        .ok()
        .flatten()
}

/// The authority driving every coroutine on this thread.
///
/// Owns the shared stack all coroutines execute on, the main flow's saved
/// context, and the registry mapping ids to non-owning record pointers.
/// Records themselves are owned by their [`Handle`](crate::Handle)s; an
/// entry stays valid exactly until the id is removed, which `Handle::drop`
/// guarantees happens no later than record destruction.
///
/// There is a single main-context slot, so [`spawn`](crate::spawn) and
/// [`resume`](crate::resume) are defined only when called from the main
/// flow, never from inside a running body. A body resuming *itself* is
/// detected through its Running state and reported as
/// [`ResumeError::Reentrant`].
pub struct Scheduler {
    stack: SharedStack,
    ctx_main: Context,
    registry: BTreeMap<CoroutineId, Ptr<dyn Schedulable>>,
    next_id: CoroutineId,
    entry_arg: *mut (),
}

impl Scheduler {
    fn new(stack_size: usize) -> Self {
        let sched = Scheduler {
            stack: SharedStack::new(stack_size),
            ctx_main: Context::default(),
            registry: BTreeMap::new(),
            next_id: 0,
            entry_arg: ptr::null_mut(),
        };
        trace!("scheduler created, shared stack of {} bytes", sched.stack.size());
        sched
    }

    /// Registers `co` under a fresh id and immediately switches into it.
    ///
    /// Synchronous and side-effecting: the body executes on the shared
    /// stack until its first yield or completion before this returns.
    pub(crate) fn create<R: Runnable>(&mut self, co: *mut Coroutine<R>) -> CoroutineId {
        self.next_id += 1;
        let id = self.next_id;
        self.registry
            .insert(id, Ptr::from_raw(co as *mut dyn Schedulable));

        let co_ref = unsafe { &mut *co };
        co_ref.raw_mut().set_id(id);
        co_ref
            .raw_mut()
            .set_ctx(Context::new(self.stack.bottom() as usize, co_entry::<R> as usize));

        self.entry_arg = co as *mut ();
        trace!("coroutine {id} created, dispatching to first suspend");
        unsafe { arch::context_switch(self.main_context(), co_ref.raw().ctx()) };
        id
    }

    /// Advances the coroutine registered under `id` to its next suspend
    /// point or completion.
    ///
    /// `Ok(true)` means a fresh value is available, `Ok(false)` that the
    /// body has finished (or never started). See [`ResumeError`] for the
    /// failure split.
    pub fn try_resume(&mut self, id: CoroutineId) -> Result<bool, ResumeError> {
        match self.registry.get(&id) {
            Some(co) => {
                let co = *co;
                unsafe { co.as_mut() }.advance()
            }
            None => Err(ResumeError::UnknownId(id)),
        }
    }

    /// Boolean form of [`try_resume`](Scheduler::try_resume): `true` iff a
    /// new value is available. An unknown id is an expected, recoverable
    /// miss and reports `false`; re-entrant resume is a programming error
    /// and panics.
    pub fn resume(&mut self, id: CoroutineId) -> bool {
        match self.try_resume(id) {
            Ok(produced) => produced,
            Err(ResumeError::UnknownId(_)) => false,
            Err(err @ ResumeError::Reentrant(_)) => {
                panic!("cooperative invariant violated: {err}")
            }
        }
    }

    /// Deregisters `id`. Idempotent; unknown ids are ignored.
    ///
    /// Removal does not unwind or finalize a suspended body; whatever it
    /// holds is released only when the owning handle drops the record.
    pub fn remove(&mut self, id: CoroutineId) {
        if self.registry.remove(&id).is_some() {
            trace!("coroutine {id} deregistered");
        }
    }

    /// Evicts every Free (finished) entry, then returns the live count.
    ///
    /// A combined garbage-collection and query operation; callers must not
    /// assume it is side-effect-free.
    pub fn size(&mut self) -> usize {
        self.registry
            .retain(|_, co| unsafe { co.as_ref() }.state() != CoState::Free);
        self.registry.len()
    }

    /// The address one past the end of the shared stack, used to compute
    /// the occupied extent.
    pub fn stack_bottom(&mut self) -> *mut u8 {
        self.stack.bottom()
    }

    pub(crate) fn main_context(&mut self) -> *mut Context {
        &mut self.ctx_main
    }

    fn take_entry_arg(&mut self) -> *mut () {
        mem::replace(&mut self.entry_arg, ptr::null_mut())
    }
}

/// First dispatch target of every coroutine context.
///
/// Runs on the shared stack: flips Free to Running, executes the body,
/// flips back to Free when it returns, then leaves the shared stack for
/// good. The context saved by the final switch is never resumed.
extern "C" fn co_entry<R: Runnable>() {
    let co = unsafe { &mut *(scheduler().take_entry_arg() as *mut Coroutine<R>) };

    co.raw_mut().set_state(CoState::Running);
    trace!("coroutine {} entered", co.raw().id());

    co.dispatch();

    co.raw_mut().set_state(CoState::Free);
    trace!("coroutine {} finished", co.raw().id());

    unsafe { arch::context_switch(co.raw_mut().ctx_mut(), scheduler().main_context()) };
    unreachable!("finished coroutine context resumed");
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::coroutine::Yielder;
    use crate::{resume, spawn, spawn_with, try_resume};

    #[derive(Default)]
    struct Digits;

    impl Runnable for Digits {
        type Yield = i32;

        fn run(&mut self, y: &mut Yielder<i32>) {
            for i in 0..10 {
                y.yield_with(i);
            }
        }
    }

    #[test]
    fn test_resume_unknown_id_is_false() {
        assert!(!resume(12345));
        assert_eq!(try_resume(12345), Err(ResumeError::UnknownId(12345)));
    }

    #[test]
    fn test_accessor_is_reachable_from_the_crate_root() {
        // The accessor function and its defining module share a name; the
        // root re-export must resolve to the function alone.
        assert_eq!(crate::scheduler().size(), 0);
        let co = spawn::<Digits>();
        assert_eq!(crate::scheduler().size(), 1);
        while resume(co.id()) {}
        assert_eq!(crate::scheduler().size(), 0);
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let a = spawn::<Digits>();
        let b = spawn::<Digits>();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        drop(a);
        let c = spawn::<Digits>();
        assert_eq!(c.id(), 3);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let co = spawn::<Digits>();
        let id = co.id();
        scheduler().remove(id);
        scheduler().remove(id);
        assert!(!resume(id));
    }

    #[test]
    fn test_size_sweeps_finished_coroutines() {
        let a = spawn::<Digits>();
        let b = spawn::<Digits>();
        assert_eq!(scheduler().size(), 2);

        while resume(a.id()) {}
        assert_eq!(scheduler().size(), 1);
        // The sweep evicted the finished entry, so its id is now unknown.
        assert_eq!(try_resume(a.id()), Err(ResumeError::UnknownId(a.id())));

        while resume(b.id()) {}
        assert_eq!(scheduler().size(), 0);
    }

    #[test]
    fn test_interleaved_coroutines_stay_isolated() {
        struct Offset(i32);

        impl Runnable for Offset {
            type Yield = i32;

            fn run(&mut self, y: &mut Yielder<i32>) {
                for i in 0..5 {
                    y.yield_with(self.0 + i);
                }
            }
        }

        let a = spawn_with(Offset(100));
        let b = spawn_with(Offset(200));
        assert_eq!(a.value(), Some(100));
        assert_eq!(b.value(), Some(200));

        for i in 1..5 {
            assert!(resume(a.id()));
            assert!(resume(b.id()));
            assert_eq!(a.value(), Some(100 + i));
            assert_eq!(b.value(), Some(200 + i));
        }
        assert!(!resume(a.id()));
        assert!(!resume(b.id()));
    }

    #[test]
    fn test_snapshot_grows_with_deeper_recursion() {
        fn descend(y: &mut Yielder<usize>, left: usize, depth: usize) {
            let pad = [0u8; 512];
            std::hint::black_box(&pad);
            if left == 0 {
                y.yield_with(depth);
            } else {
                descend(y, left - 1, depth);
            }
            std::hint::black_box(&pad);
        }

        #[derive(Default)]
        struct Deepening;

        impl Runnable for Deepening {
            type Yield = usize;

            fn run(&mut self, y: &mut Yielder<usize>) {
                for depth in [1usize, 8, 64] {
                    descend(y, depth, depth);
                }
            }
        }

        let co = spawn::<Deepening>();
        assert_eq!(co.value(), Some(1));
        assert!(resume(co.id()));
        assert_eq!(co.value(), Some(8));
        assert!(resume(co.id()));
        assert_eq!(co.value(), Some(64));
        assert!(!resume(co.id()));
    }

    #[test]
    fn test_interleaved_recursion_keeps_frames_intact() {
        fn descend(y: &mut Yielder<usize>, seed: usize, left: usize, depth: usize) {
            let here = seed + left;
            std::hint::black_box(&here);
            if left == 0 {
                y.yield_with(seed + depth);
            } else {
                descend(y, seed, left - 1, depth);
            }
            // Every unwound frame must see its own local again, even after
            // the stack tail was swapped out for the other coroutine's.
            assert_eq!(here, seed + left);
        }

        struct DepthWalk {
            seed: usize,
        }

        impl Runnable for DepthWalk {
            type Yield = usize;

            fn run(&mut self, y: &mut Yielder<usize>) {
                for depth in [2usize, 40, 5] {
                    descend(y, self.seed, depth, depth);
                }
            }
        }

        let a = spawn_with(DepthWalk { seed: 1000 });
        let b = spawn_with(DepthWalk { seed: 2000 });
        for depth in [2usize, 40, 5] {
            assert_eq!(a.value(), Some(1000 + depth));
            assert_eq!(b.value(), Some(2000 + depth));
            resume(a.id());
            resume(b.id());
        }
        assert!(!resume(a.id()));
        assert!(!resume(b.id()));
    }

    #[test]
    fn test_locals_survive_suspension() {
        #[derive(Default)]
        struct Summing;

        impl Runnable for Summing {
            type Yield = u64;

            fn run(&mut self, y: &mut Yielder<u64>) {
                let mut acc = 0u64;
                for i in 1..=5u64 {
                    acc += i;
                    y.yield_with(acc);
                }
            }
        }

        let co = spawn::<Summing>();
        let mut seen = vec![co.value().unwrap()];
        while resume(co.id()) {
            seen.push(co.value().unwrap());
        }
        assert_eq!(seen, vec![1, 3, 6, 10, 15]);
    }

    thread_local! {
        static OWN_ID: Cell<CoroutineId> = const { Cell::new(0) };
    }

    #[derive(Default)]
    struct SelfResume;

    impl Runnable for SelfResume {
        type Yield = i32;

        fn run(&mut self, y: &mut Yielder<i32>) {
            y.yield_with(0);
            // Resuming the coroutine we are currently inside of must be
            // reported as a distinct violation, not an unknown-id miss.
            let id = OWN_ID.with(|c| c.get());
            assert_eq!(try_resume(id), Err(ResumeError::Reentrant(id)));
            y.yield_with(1);
        }
    }

    #[test]
    fn test_reentrant_resume_is_rejected() {
        let co = spawn::<SelfResume>();
        OWN_ID.with(|c| c.set(co.id()));
        assert!(resume(co.id())); // runs the in-body assertion
        assert_eq!(co.value(), Some(1));
        assert!(!resume(co.id()));
    }
}
