//! x86_64 (SysV ABI) context switching.

use std::arch::naked_asm;

/// Saved execution state: the SysV callee-saved registers plus the resume
/// program counter.
///
/// `rip` is stored here, not on the stack. [`context_switch`] re-enters a
/// context with `jmp`, so a suspended coroutine never pops a return address
/// from stack memory that may have been restored from a snapshot.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    /// Resume program counter.
    rip: u64,
    /// Stack pointer.
    rsp: u64,
    /// Frame pointer.
    rbp: u64,
    rbx: u64,
    r12: u64,
    r13: u64,
    r14: u64,
    r15: u64,
}

impl Context {
    /// Creates a context that starts executing `entry` on the stack whose
    /// highest address is `stack_top`.
    ///
    /// SysV requires `rsp % 16 == 8` at function entry (as if a `call` had
    /// just pushed the return address). The entry function must never
    /// return; it has no caller frame to return into.
    pub(crate) fn new(stack_top: usize, entry: usize) -> Self {
        Context {
            rip: entry as u64,
            rsp: ((stack_top & !0xF) - 8) as u64,
            ..Default::default()
        }
    }
}

/// Saves the current flow into `old` and resumes `new`.
///
/// Returns when some later switch targets `old` again.
///
/// # Safety
/// Both pointers must be valid. `new` must hold state produced by
/// [`Context::new`] or by a previous switch, and the stack it points into
/// must contain the bytes that were live when that state was saved.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn context_switch(_old: *mut Context, _new: *const Context) {
    naked_asm!(
        // rdi = old, rsi = new. The slot at [rsp] is our own return
        // address; record it as the resume point, then rsp as it will be
        // after that return.
        "mov rax, [rsp]",
        "mov [rdi + 0x00], rax", // rip
        "lea rax, [rsp + 8]",
        "mov [rdi + 0x08], rax", // rsp
        "mov [rdi + 0x10], rbp",
        "mov [rdi + 0x18], rbx",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        // Install the target state.
        "mov rbp, [rsi + 0x10]",
        "mov rbx, [rsi + 0x18]",
        "mov r12, [rsi + 0x20]",
        "mov r13, [rsi + 0x28]",
        "mov r14, [rsi + 0x30]",
        "mov r15, [rsi + 0x38]",
        "mov rsp, [rsi + 0x08]",
        // Re-enter through the saved rip; nothing is popped from the
        // (possibly just-restored) stack.
        "jmp qword ptr [rsi + 0x00]",
    );
}
