//! Platform context-switch capability.
//!
//! Each supported architecture provides a [`Context`] holding the saved
//! callee-saved register state and a [`context_switch`] routine that swaps
//! the running flow for a saved one.
//!
//! The resume program counter is kept inside [`Context`] and re-entered
//! through a register, never through a return address left on the stack:
//! between a suspend and the matching resume the shared stack tail is
//! rewritten from the coroutine's snapshot buffer, so any stack-resident
//! slot written after the capture would come back stale.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", not(windows)))] {
        mod x86_64;
        pub(crate) use x86_64::{Context, context_switch};
    } else if #[cfg(target_arch = "aarch64")] {
        mod aarch64;
        pub(crate) use aarch64::{Context, context_switch};
    } else {
        compile_error!("costack supports only x86_64 (SysV) and aarch64 targets");
    }
}
