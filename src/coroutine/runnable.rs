use crate::coroutine::Yielder;

/// A coroutine body.
///
/// `run` contains arbitrary logic and may call
/// [`Yielder::yield_with`] any number of times; each call suspends the
/// coroutine and hands the value to the caller that resumed it. `run`
/// returning ends the coroutine permanently.
///
/// # Example
///
/// ```
/// use costack::{Runnable, Yielder};
///
/// #[derive(Default)]
/// struct Countdown;
///
/// impl Runnable for Countdown {
///     type Yield = u32;
///
///     fn run(&mut self, y: &mut Yielder<u32>) {
///         for n in (0..3).rev() {
///             y.yield_with(n);
///         }
///     }
/// }
/// ```
pub trait Runnable: 'static {
    /// The value produced at each suspension.
    type Yield: 'static;

    /// The coroutine's logic, executed on the shared stack.
    fn run(&mut self, y: &mut Yielder<Self::Yield>);
}
