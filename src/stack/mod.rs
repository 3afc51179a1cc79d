//! The shared stack region and the per-coroutine snapshot buffers.

pub(crate) mod shared;
pub(crate) mod snapshot;

pub(crate) use shared::SharedStack;
pub(crate) use snapshot::StackSnapshot;
