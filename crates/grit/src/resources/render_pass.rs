use ash::vk;

use super::{BackendObject, ResourceKind};
use crate::factory::ResourceFactory;

///Format and sample count of a single attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDesc {
    pub format: vk::Format,
    pub samples: u32,
}

///Attachment layout of a render pass. Two passes with the same descriptor are *compatible*, regardless of their load/store
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttachmentsDescriptor {
    pub color: Option<AttachmentDesc>,
    pub resolve: Option<AttachmentDesc>,
    pub stencil: Option<AttachmentDesc>,
}

impl AttachmentsDescriptor {
    pub fn color(format: vk::Format, samples: u32) -> Self {
        AttachmentsDescriptor {
            color: Some(AttachmentDesc { format, samples }),
            resolve: None,
            stencil: None,
        }
    }

    pub fn with_stencil(mut self, format: vk::Format, samples: u32) -> Self {
        self.stencil = Some(AttachmentDesc { format, samples });
        self
    }

    pub fn with_resolve(mut self, format: vk::Format) -> Self {
        self.resolve = Some(AttachmentDesc { format, samples: 1 });
        self
    }

    pub fn attachment_count(&self) -> usize {
        self.color.is_some() as usize + self.resolve.is_some() as usize + self.stencil.is_some() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadStoreOps {
    pub load: vk::AttachmentLoadOp,
    pub store: vk::AttachmentStoreOp,
}

impl LoadStoreOps {
    ///Ops of the canonical pass of a compatible set.
    pub const LOAD_STORE: Self = LoadStoreOps {
        load: vk::AttachmentLoadOp::LOAD,
        store: vk::AttachmentStoreOp::STORE,
    };

    pub const CLEAR_STORE: Self = LoadStoreOps {
        load: vk::AttachmentLoadOp::CLEAR,
        store: vk::AttachmentStoreOp::STORE,
    };

    pub const DONT_CARE: Self = LoadStoreOps {
        load: vk::AttachmentLoadOp::DONT_CARE,
        store: vk::AttachmentStoreOp::DONT_CARE,
    };
}

///Index of a compatible render pass set within the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompatibleRpHandle(pub(crate) usize);

impl CompatibleRpHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

pub struct RenderPass {
    pub inner: vk::RenderPass,
    pub attachments: AttachmentsDescriptor,
    pub color_ops: LoadStoreOps,
    pub stencil_ops: LoadStoreOps,
}

impl RenderPass {
    pub fn is_compatible(&self, attachments: &AttachmentsDescriptor) -> bool {
        self.attachments == *attachments
    }

    pub fn equal_load_store_ops(&self, color: LoadStoreOps, stencil: LoadStoreOps) -> bool {
        self.color_ops == color && self.stencil_ops == stencil
    }
}

impl BackendObject for RenderPass {
    const KIND: ResourceKind = ResourceKind::RenderPass;
    fn destroy(self, factory: &dyn ResourceFactory) {
        factory.destroy_render_pass(self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_ignores_ops() {
        let desc = AttachmentsDescriptor::color(vk::Format::R8G8B8A8_UNORM, 4)
            .with_resolve(vk::Format::R8G8B8A8_UNORM);
        let pass = RenderPass {
            inner: vk::RenderPass::null(),
            attachments: desc,
            color_ops: LoadStoreOps::CLEAR_STORE,
            stencil_ops: LoadStoreOps::DONT_CARE,
        };

        assert!(pass.is_compatible(&desc));
        assert!(!pass.is_compatible(&AttachmentsDescriptor::color(vk::Format::R8G8B8A8_UNORM, 1)));
        assert!(pass.equal_load_store_ops(LoadStoreOps::CLEAR_STORE, LoadStoreOps::DONT_CARE));
        assert!(!pass.equal_load_store_ops(LoadStoreOps::LOAD_STORE, LoadStoreOps::DONT_CARE));
        assert_eq!(desc.attachment_count(), 2);
    }
}
