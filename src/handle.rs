use std::cell::UnsafeCell;
use std::rc::Rc;

use crate::coroutine::{Coroutine, Runnable};
use crate::scheduler::{scheduler, try_scheduler, CoroutineId};

/// Constructs a `R::default()` body, registers it, and runs it to its first
/// suspend point or completion before returning.
///
/// The returned [`Handle`] already carries the first yielded value (if the
/// body yielded at all).
pub fn spawn<R: Runnable + Default>() -> Handle<R> {
    spawn_with(R::default())
}

/// Like [`spawn`], for bodies that need explicit construction.
pub fn spawn_with<R: Runnable>(body: R) -> Handle<R> {
    let co = Rc::new(UnsafeCell::new(Coroutine::new(body)));
    let id = scheduler().create(co.get());
    Handle { id, co }
}

/// The caller's grip on a coroutine.
///
/// Couples shared ownership of the record with its registry id: dropping
/// the last handle destroys the record, and the `Drop` here deregisters the
/// id first, so the scheduler's non-owning back-reference never outlives
/// the record it points to.
///
/// Dropping the handle of a suspended coroutine does not unwind its
/// partially executed body; the record (and its snapshot buffer) is simply
/// destroyed.
pub struct Handle<R: Runnable> {
    id: CoroutineId,
    co: Rc<UnsafeCell<Coroutine<R>>>,
}

impl<R: Runnable> Handle<R> {
    /// The registry id, for [`resume`](crate::resume) calls.
    pub fn id(&self) -> CoroutineId {
        self.id
    }

    /// The most recently yielded value, or `None` if the body has not
    /// yielded yet. After the body finishes, the last yielded value remains
    /// readable here.
    pub fn value(&self) -> Option<R::Yield>
    where
        R::Yield: Clone,
    {
        unsafe { &*self.co.get() }.value().cloned()
    }
}

impl<R: Runnable> Drop for Handle<R> {
    fn drop(&mut self) {
        // The runtime slot may already be gone during thread teardown; the
        // registry entry dies with it in that case.
        if let Some(sched) = try_scheduler() {
            sched.remove(self.id);
        }
    }
}
