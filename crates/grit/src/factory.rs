use ash::{prelude::VkResult, vk};

use crate::resources::{
    AttachmentsDescriptor, LoadStoreOps, PipelineDesc, SamplerState, YcbcrConversionInfo,
};

///Creates and destroys raw backend handles on behalf of the [ResourceProvider](crate::ResourceProvider).
///
/// The provider only ever calls a factory from the thread it is used on, except for [reset_command_pool](ResourceFactory::reset_command_pool),
/// which may be called by the background reset worker.
pub trait ResourceFactory: Send + Sync {
    fn create_render_pass(
        &self,
        attachments: &AttachmentsDescriptor,
        color_ops: LoadStoreOps,
        stencil_ops: LoadStoreOps,
    ) -> VkResult<vk::RenderPass>;
    fn destroy_render_pass(&self, render_pass: vk::RenderPass);

    fn create_sampler(
        &self,
        state: &SamplerState,
        ycbcr: Option<vk::SamplerYcbcrConversion>,
    ) -> VkResult<vk::Sampler>;
    fn destroy_sampler(&self, sampler: vk::Sampler);

    fn create_ycbcr_conversion(
        &self,
        info: &YcbcrConversionInfo,
    ) -> VkResult<vk::SamplerYcbcrConversion>;
    fn destroy_ycbcr_conversion(&self, conversion: vk::SamplerYcbcrConversion);

    ///Creates a layout with one binding of `ty` per entry in `visibilities`.
    fn create_descriptor_set_layout(
        &self,
        ty: vk::DescriptorType,
        visibilities: &[vk::ShaderStageFlags],
    ) -> VkResult<vk::DescriptorSetLayout>;
    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);

    fn create_descriptor_pool(
        &self,
        ty: vk::DescriptorType,
        descriptor_count: u32,
        max_sets: u32,
    ) -> VkResult<vk::DescriptorPool>;
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
    fn allocate_descriptor_set(
        &self,
        pool: vk::DescriptorPool,
        layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet>;

    fn create_pipeline_cache(&self) -> VkResult<vk::PipelineCache>;
    fn destroy_pipeline_cache(&self, cache: vk::PipelineCache);

    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout>;
    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    fn create_graphics_pipeline(
        &self,
        cache: vk::PipelineCache,
        desc: &PipelineDesc,
        render_pass: vk::RenderPass,
        layout: vk::PipelineLayout,
    ) -> VkResult<vk::Pipeline>;
    ///Creates the full-screen copy pipeline for `render_pass`.
    fn create_copy_pipeline(
        &self,
        cache: vk::PipelineCache,
        render_pass: vk::RenderPass,
        layout: vk::PipelineLayout,
    ) -> VkResult<vk::Pipeline>;
    fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    ///Creates a command pool, and allocates its primary command buffer.
    fn create_command_pool(&self) -> VkResult<(vk::CommandPool, vk::CommandBuffer)>;
    fn reset_command_pool(&self, pool: vk::CommandPool) -> VkResult<()>;
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    ///True if the last submission of `buffer` finished executing on the GPU.
    fn command_buffer_finished(&self, buffer: vk::CommandBuffer) -> bool;

    fn create_uniform_buffer(&self, size: u64) -> VkResult<vk::Buffer>;
    fn destroy_buffer(&self, buffer: vk::Buffer);
}
