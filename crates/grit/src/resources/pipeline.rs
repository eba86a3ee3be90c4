use ash::vk;
use smallvec::SmallVec;

use super::{BackendObject, CompatibleRpHandle, DescriptorSetHandle, ResourceKind};
use crate::factory::ResourceFactory;

///Everything a graphics pipeline is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    ///Key of the shader program. Produced by the processor tree.
    pub program_key: SmallVec<[u32; 8]>,
    pub topology: vk::PrimitiveTopology,
    ///Compatibility class of the render pass the pipeline is used in.
    pub render_pass: CompatibleRpHandle,
    ///Sampler descriptor set managers bound after the uniform set.
    pub sampler_sets: SmallVec<[DescriptorSetHandle; 2]>,
}

pub struct PipelineState {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub desc: PipelineDesc,
}

impl BackendObject for PipelineState {
    const KIND: ResourceKind = ResourceKind::Pipeline;
    fn destroy(self, factory: &dyn ResourceFactory) {
        factory.destroy_pipeline(self.pipeline);
        factory.destroy_pipeline_layout(self.layout);
    }
}

///Pipeline used for draw-based copies into a render target. One exists per render pass compatibility class.
pub struct CopyPipeline {
    pub pipeline: vk::Pipeline,
    pub render_pass: CompatibleRpHandle,
}

impl CopyPipeline {
    pub fn is_compatible(&self, render_pass: CompatibleRpHandle) -> bool {
        self.render_pass == render_pass
    }
}

impl BackendObject for CopyPipeline {
    const KIND: ResourceKind = ResourceKind::Pipeline;
    fn destroy(self, factory: &dyn ResourceFactory) {
        factory.destroy_pipeline(self.pipeline);
    }
}
