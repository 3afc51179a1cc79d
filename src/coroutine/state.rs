/// A coroutine's lifecycle state.
///
/// Exactly one coroutine per runtime thread may be [`Running`](CoState::Running)
/// at any instant; the transitions are driven solely by the scheduler
/// (create and resume) and by the coroutine's own yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoState {
    /// Not started yet, or the run body has returned.
    Free,
    /// Mounted on the shared stack and executing.
    Running,
    /// Switched out; live stack bytes are held in the snapshot buffer.
    Suspended,
}
