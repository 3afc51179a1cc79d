//! Capture and restore of a coroutine's live stack bytes.

use std::ptr;

/// A coroutine's private copy of the shared stack tail it was using when it
/// suspended.
///
/// This is the safety-critical primitive of the whole runtime: a resumed
/// context is only valid if exactly the bytes that were live at the suspend
/// point are back at their original addresses. Everything else in the crate
/// funnels through [`save`](StackSnapshot::save) and
/// [`restore`](StackSnapshot::restore).
///
/// Growth is exact-fit: when a capture needs more room, the old allocation
/// is discarded and a new one of precisely the needed size takes its place.
/// The buffer never shrinks.
pub(crate) struct StackSnapshot {
    buf: Box<[u8]>,
    len: usize,
}

impl StackSnapshot {
    /// An empty snapshot. No allocation happens until the first capture.
    pub(crate) fn new() -> Self {
        StackSnapshot {
            buf: Box::new([]),
            len: 0,
        }
    }

    /// Bytes recorded by the last capture.
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Current buffer capacity.
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Copies `len` bytes starting at `top` (the deepest live address, up
    /// to the stack bottom) into the buffer.
    ///
    /// # Safety
    /// `top..top + len` must be readable.
    pub(crate) unsafe fn save(&mut self, top: *const u8, len: usize) {
        if len > self.buf.len() {
            let mut v = Vec::with_capacity(len);
            unsafe { v.set_len(len) };
            self.buf = v.into_boxed_slice();
        }
        unsafe { ptr::copy_nonoverlapping(top, self.buf.as_mut_ptr(), len) };
        self.len = len;
    }

    /// Copies the recorded bytes back to the tail of the stack ending at
    /// `stack_bottom`, so stack-relative addresses captured in the saved
    /// context are valid again.
    ///
    /// # Safety
    /// `stack_bottom - len..stack_bottom` must be writable and must be the
    /// same region the bytes were captured from.
    pub(crate) unsafe fn restore(&self, stack_bottom: *mut u8) {
        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr(), stack_bottom.sub(self.len), self.len)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let snap = StackSnapshot::new();
        assert_eq!(snap.len(), 0);
        assert_eq!(snap.capacity(), 0);
    }

    #[test]
    fn test_save_and_restore_round_trip() {
        let mut region = [0u8; 64];
        for (i, b) in region.iter_mut().enumerate() {
            *b = i as u8;
        }
        let bottom = unsafe { region.as_mut_ptr().add(64) };

        let mut snap = StackSnapshot::new();
        unsafe { snap.save(region.as_ptr().add(16), 48) };
        assert_eq!(snap.len(), 48);
        assert_eq!(snap.capacity(), 48);

        // Another "coroutine" trashes the region.
        region.fill(0xAA);

        unsafe { snap.restore(bottom) };
        for (i, b) in region.iter().enumerate().skip(16) {
            assert_eq!(*b, i as u8);
        }
        // Bytes outside the captured tail stay trashed.
        assert!(region[..16].iter().all(|b| *b == 0xAA));
    }

    #[test]
    fn test_growth_is_exact_fit_and_never_shrinks() {
        let mut region = [7u8; 256];
        let mut snap = StackSnapshot::new();

        unsafe { snap.save(region.as_ptr().add(224), 32) };
        assert_eq!(snap.capacity(), 32);

        // Deeper capture reallocates to exactly the new size.
        unsafe { snap.save(region.as_ptr().add(56), 200) };
        assert_eq!(snap.capacity(), 200);
        assert_eq!(snap.len(), 200);

        // Shallower capture keeps the allocation, only len drops.
        unsafe { snap.save(region.as_ptr().add(240), 16) };
        assert_eq!(snap.capacity(), 200);
        assert_eq!(snap.len(), 16);

        let bottom = unsafe { region.as_mut_ptr().add(256) };
        region.fill(0);
        unsafe { snap.restore(bottom) };
        assert!(region[240..].iter().all(|b| *b == 7));
        assert!(region[..240].iter().all(|b| *b == 0));
    }
}
