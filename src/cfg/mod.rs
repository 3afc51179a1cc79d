use std::cell::Cell;

/// Default size of the shared stack region: 1 MiB.
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

thread_local! {
    static STACK_SIZE: Cell<usize> = const { Cell::new(DEFAULT_STACK_SIZE) };
}

/// Size the shared stack will be (or was) created with on this thread.
pub fn config_stack_size() -> usize {
    STACK_SIZE.with(|size| size.get())
}

/// Overrides the shared stack size for this thread.
///
/// Takes effect only if called before the first
/// [`scheduler`](crate::scheduler) access on the thread; the region is
/// allocated once and kept for the scheduler's lifetime.
pub fn set_stack_size(size: usize) {
    STACK_SIZE.with(|s| s.set(size));
}
