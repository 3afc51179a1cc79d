use std::fmt::Debug;

/// A copyable non-owning pointer wrapper.
///
/// The registry and the yield path both need to reach a coroutine record
/// that is owned elsewhere (by its [`Handle`](crate::Handle)); `Ptr` names
/// that pattern without implying ownership.
pub(crate) struct Ptr<T: ?Sized> {
    ptr: *mut T,
}

impl<T: ?Sized> Ptr<T> {
    /// Wrap a raw pointer.
    #[inline(always)]
    pub(crate) fn from_raw(ptr: *mut T) -> Self {
        Self { ptr }
    }

    /// Get a reference to the value.
    ///
    /// # Safety
    /// The pointee must still be alive and not mutably aliased.
    #[inline(always)]
    pub(crate) unsafe fn as_ref<'a>(self) -> &'a T {
        unsafe { &*self.ptr }
    }

    /// Get a mutable reference to the value.
    ///
    /// # Safety
    /// The pointee must still be alive and not otherwise aliased.
    #[inline(always)]
    pub(crate) unsafe fn as_mut<'a>(self) -> &'a mut T {
        unsafe { &mut *self.ptr }
    }
}

impl<T: ?Sized> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Ptr<T> {}

impl<T: ?Sized> From<&mut T> for Ptr<T> {
    fn from(ptr: &mut T) -> Self {
        Self { ptr }
    }
}

impl<T: Debug + ?Sized> Debug for Ptr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        unsafe { write!(f, "{:?}", self.as_ref()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut value = 5;
        let ptr = Ptr::from(&mut value);
        assert_eq!(unsafe { *ptr.as_ref() }, 5);
        *unsafe { ptr.as_mut() } = 10;
        assert_eq!(value, 10);
    }

    #[test]
    fn test_copy_aliases_same_pointee() {
        let mut value = 1;
        let a = Ptr::from(&mut value);
        let b = a;
        *unsafe { b.as_mut() } = 2;
        assert_eq!(unsafe { *a.as_ref() }, 2);
    }
}
