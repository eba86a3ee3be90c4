use std::sync::Arc;

use crate::{
    ProviderError,
    factory::ResourceFactory,
    resources::{AttachmentsDescriptor, LoadStoreOps, RenderPass, ResourceKind},
};

///All render passes that share one attachment layout.
///
/// The first pass is always the *simple* pass, created with [LoadStoreOps::LOAD_STORE]. It is what compatibility checks
/// and framebuffer creation use. All other passes are variants with different load/store operations.
pub(crate) struct CompatibleRenderPassSet {
    pub(crate) passes: Vec<Arc<RenderPass>>,
    last_returned: usize,
}

impl CompatibleRenderPassSet {
    pub(crate) fn new(
        factory: &dyn ResourceFactory,
        attachments: AttachmentsDescriptor,
    ) -> Result<Self, ProviderError> {
        let simple = create_pass(
            factory,
            attachments,
            LoadStoreOps::LOAD_STORE,
            LoadStoreOps::LOAD_STORE,
        )?;
        Ok(CompatibleRenderPassSet {
            passes: vec![simple],
            last_returned: 0,
        })
    }

    pub(crate) fn is_compatible(&self, attachments: &AttachmentsDescriptor) -> bool {
        self.passes[0].is_compatible(attachments)
    }

    pub(crate) fn compatible_render_pass(&self) -> &Arc<RenderPass> {
        &self.passes[0]
    }

    ///Returns the pass with the given ops. Starts searching at the pass returned last, since consecutive queries
    /// tend to ask for the same ops.
    pub(crate) fn get_render_pass(
        &mut self,
        factory: &dyn ResourceFactory,
        color_ops: LoadStoreOps,
        stencil_ops: LoadStoreOps,
    ) -> Result<Arc<RenderPass>, ProviderError> {
        let count = self.passes.len();
        for i in 0..count {
            let idx = (i + self.last_returned) % count;
            if self.passes[idx].equal_load_store_ops(color_ops, stencil_ops) {
                self.last_returned = idx;
                return Ok(self.passes[idx].clone());
            }
        }

        let pass = create_pass(factory, self.passes[0].attachments, color_ops, stencil_ops)?;
        self.passes.push(pass.clone());
        self.last_returned = self.passes.len() - 1;

        #[cfg(feature = "logging")]
        log::debug!(
            "Created render pass variant {} ({:?}, {:?})",
            self.last_returned,
            color_ops,
            stencil_ops
        );

        Ok(pass)
    }
}

fn create_pass(
    factory: &dyn ResourceFactory,
    attachments: AttachmentsDescriptor,
    color_ops: LoadStoreOps,
    stencil_ops: LoadStoreOps,
) -> Result<Arc<RenderPass>, ProviderError> {
    let inner = ProviderError::created(
        ResourceKind::RenderPass,
        factory.create_render_pass(&attachments, color_ops, stencil_ops),
    )?;
    Ok(Arc::new(RenderPass {
        inner,
        attachments,
        color_ops,
        stencil_ops,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessFactory;
    use ash::vk;

    #[test]
    fn variants_start_at_last_hit() {
        let factory = HeadlessFactory::new();
        let desc = AttachmentsDescriptor::color(vk::Format::B8G8R8A8_UNORM, 1);
        let mut set = CompatibleRenderPassSet::new(&factory, desc).unwrap();
        assert!(set.is_compatible(&desc));

        let simple = set
            .get_render_pass(&factory, LoadStoreOps::LOAD_STORE, LoadStoreOps::LOAD_STORE)
            .unwrap();
        assert!(Arc::ptr_eq(&simple, set.compatible_render_pass()));

        let clear = set
            .get_render_pass(&factory, LoadStoreOps::CLEAR_STORE, LoadStoreOps::DONT_CARE)
            .unwrap();
        assert_eq!(set.passes.len(), 2);
        assert_eq!(set.last_returned, 1);

        let again = set
            .get_render_pass(&factory, LoadStoreOps::CLEAR_STORE, LoadStoreOps::DONT_CARE)
            .unwrap();
        assert!(Arc::ptr_eq(&clear, &again));
        assert_eq!(set.passes.len(), 2);
        assert_eq!(factory.live(ResourceKind::RenderPass), 2);
    }
}
