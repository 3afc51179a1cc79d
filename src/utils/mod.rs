pub(crate) mod ptr;

pub(crate) use ptr::*;
