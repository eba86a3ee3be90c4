use std::fmt::Display;

use crate::factory::ResourceFactory;

mod command_pool;
pub use command_pool::CommandPool;
mod descriptor;
pub use descriptor::{DescriptorSet, DescriptorSetHandle, DescriptorSetKey, DescriptorSetManager};
mod pipeline;
pub use pipeline::{CopyPipeline, PipelineDesc, PipelineState};
mod render_pass;
pub use render_pass::{
    AttachmentDesc, AttachmentsDescriptor, CompatibleRpHandle, LoadStoreOps, RenderPass,
};
mod sampler;
pub use sampler::{Filter, Sampler, SamplerKey, SamplerState, WrapMode};
mod uniform_buffer;
pub use uniform_buffer::UniformBlock;
mod ycbcr;
pub use ycbcr::{YcbcrConversion, YcbcrConversionInfo};

///Kind of backend object. Used for error reporting and the headless factory's book keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    RenderPass,
    Sampler,
    YcbcrConversion,
    DescriptorSetLayout,
    DescriptorPool,
    DescriptorSet,
    PipelineCache,
    PipelineLayout,
    Pipeline,
    CommandPool,
    Buffer,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::RenderPass => "render pass",
            ResourceKind::Sampler => "sampler",
            ResourceKind::YcbcrConversion => "ycbcr conversion",
            ResourceKind::DescriptorSetLayout => "descriptor set layout",
            ResourceKind::DescriptorPool => "descriptor pool",
            ResourceKind::DescriptorSet => "descriptor set",
            ResourceKind::PipelineCache => "pipeline cache",
            ResourceKind::PipelineLayout => "pipeline layout",
            ResourceKind::Pipeline => "pipeline",
            ResourceKind::CommandPool => "command pool",
            ResourceKind::Buffer => "buffer",
        };
        write!(f, "{}", name)
    }
}

///An object owned by the [ResourceProvider](crate::ResourceProvider) that holds backend handles.
///
/// There is no `Drop` implementation on those objects. The provider decides at teardown whether `destroy` is called (graceful path),
/// or whether the object is just forgotten (device lost).
pub trait BackendObject {
    const KIND: ResourceKind;
    ///Destroys all backend handles of `self`.
    fn destroy(self, factory: &dyn ResourceFactory);
}
