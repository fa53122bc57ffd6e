//! Owning GPU Handles
//!
//! Every GPU resource created through the [`Device`](super::Device) comes back
//! wrapped in an [`OwnedHandle`]. Dropping the handle queues the resource for
//! release; the device drains the queue at the start of the next frame (or on
//! [`collect_garbage`](super::Device::collect_garbage)). Nobody frees a raw
//! id by hand.
//!
//! ```text
//!  OwnedHandle::drop ──► ReleaseQueue ──► Device::collect_garbage ──► GpuBackend::release
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::backend::{BufferId, FramebufferId, ProgramId, ResourceId, TextureId};

/// Resources whose owners were dropped, waiting for the backend.
#[derive(Debug, Default)]
pub(crate) struct ReleaseQueue {
    pending: RefCell<Vec<ResourceId>>,
}

impl ReleaseQueue {
    pub(crate) fn push(&self, resource: ResourceId) {
        self.pending.borrow_mut().push(resource);
    }

    pub(crate) fn drain(&self) -> Vec<ResourceId> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// Exclusive owner of one GPU resource.
///
/// Not `Clone`: borrowers copy the raw id via [`id`](Self::id) and must not
/// outlive the owner.
pub struct OwnedHandle<I>
where
    I: Copy + Into<ResourceId>,
{
    id: I,
    queue: Rc<ReleaseQueue>,
}

impl<I> OwnedHandle<I>
where
    I: Copy + Into<ResourceId>,
{
    pub(crate) fn new(id: I, queue: Rc<ReleaseQueue>) -> Self {
        Self { id, queue }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> I {
        self.id
    }
}

impl<I> Drop for OwnedHandle<I>
where
    I: Copy + Into<ResourceId>,
{
    fn drop(&mut self) {
        self.queue.push(self.id.into());
    }
}

impl<I> fmt::Debug for OwnedHandle<I>
where
    I: Copy + Into<ResourceId> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedHandle").field(&self.id).finish()
    }
}

pub type BufferHandle = OwnedHandle<BufferId>;
pub type TextureHandle = OwnedHandle<TextureId>;
pub type FramebufferHandle = OwnedHandle<FramebufferId>;
pub type ProgramHandle = OwnedHandle<ProgramId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_queues_release() {
        let queue = Rc::new(ReleaseQueue::default());
        {
            let _a = BufferHandle::new(BufferId(1), queue.clone());
            let _b = TextureHandle::new(TextureId(2), queue.clone());
            assert_eq!(queue.len(), 0);
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.contains(&ResourceId::Buffer(BufferId(1))));
        assert!(drained.contains(&ResourceId::Texture(TextureId(2))));
        assert_eq!(queue.len(), 0);
    }
}
