use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use ahash::AHashMap;
use ash::{
    prelude::VkResult,
    vk::{self, Handle},
};

use crate::{
    factory::ResourceFactory,
    resources::{
        AttachmentsDescriptor, LoadStoreOps, PipelineDesc, ResourceKind, SamplerState,
        YcbcrConversionInfo,
    },
};

#[derive(Default)]
struct Counters {
    live: AHashMap<ResourceKind, i64>,
    created: AHashMap<ResourceKind, u64>,
    fail_next: Option<(ResourceKind, vk::Result)>,
    destroyed: Vec<ResourceKind>,
}

///Factory that hands out unique, fake handles without ever touching a device.
///
/// Tracks how many objects of each kind are alive, which makes leaks and double frees visible. Every destruction is
/// logged in order, so teardown sequences can be checked. Used by tests and the dry-run demo.
pub struct HeadlessFactory {
    next_handle: AtomicU64,
    gpu_finished: AtomicBool,
    resets: AtomicU64,
    counters: Mutex<Counters>,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessFactory {
    pub fn new() -> Self {
        HeadlessFactory {
            next_handle: AtomicU64::new(1),
            gpu_finished: AtomicBool::new(true),
            resets: AtomicU64::new(0),
            counters: Mutex::new(Counters::default()),
        }
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    ///Number of objects of `kind` that are created, but not yet destroyed.
    pub fn live(&self, kind: ResourceKind) -> i64 {
        self.counters().live.get(&kind).copied().unwrap_or(0)
    }

    ///Number of objects of `kind` ever created.
    pub fn created(&self, kind: ResourceKind) -> u64 {
        self.counters().created.get(&kind).copied().unwrap_or(0)
    }

    ///Sum of all live objects.
    pub fn live_total(&self) -> i64 {
        self.counters().live.values().sum()
    }

    ///Kinds of all destroyed objects, in destruction order.
    pub fn destroy_log(&self) -> Vec<ResourceKind> {
        self.counters().destroyed.clone()
    }

    ///Number of command pool resets executed so far.
    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Acquire)
    }

    ///Lets the next creation of `kind` fail with `error`.
    pub fn fail_next(&self, kind: ResourceKind, error: vk::Result) {
        self.counters().fail_next = Some((kind, error));
    }

    ///Sets whether submitted command buffers are reported as finished.
    pub fn set_gpu_finished(&self, finished: bool) {
        self.gpu_finished.store(finished, Ordering::Release);
    }

    fn create<H: Handle>(&self, kind: ResourceKind) -> VkResult<H> {
        let mut counters = self.counters();
        if let Some((failing, error)) = counters.fail_next {
            if failing == kind {
                counters.fail_next = None;
                return Err(error);
            }
        }
        *counters.live.entry(kind).or_insert(0) += 1;
        *counters.created.entry(kind).or_insert(0) += 1;

        Ok(H::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed)))
    }

    fn destroy<H: Handle>(&self, kind: ResourceKind, handle: H) {
        assert!(
            handle.as_raw() != 0,
            "Destroying null handle of kind {}",
            kind
        );
        let mut counters = self.counters();
        *counters.live.entry(kind).or_insert(0) -= 1;
        counters.destroyed.push(kind);
    }
}

impl ResourceFactory for HeadlessFactory {
    fn create_render_pass(
        &self,
        _attachments: &AttachmentsDescriptor,
        _color_ops: LoadStoreOps,
        _stencil_ops: LoadStoreOps,
    ) -> VkResult<vk::RenderPass> {
        self.create(ResourceKind::RenderPass)
    }
    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.destroy(ResourceKind::RenderPass, render_pass)
    }

    fn create_sampler(
        &self,
        _state: &SamplerState,
        _ycbcr: Option<vk::SamplerYcbcrConversion>,
    ) -> VkResult<vk::Sampler> {
        self.create(ResourceKind::Sampler)
    }
    fn destroy_sampler(&self, sampler: vk::Sampler) {
        self.destroy(ResourceKind::Sampler, sampler)
    }

    fn create_ycbcr_conversion(
        &self,
        _info: &YcbcrConversionInfo,
    ) -> VkResult<vk::SamplerYcbcrConversion> {
        self.create(ResourceKind::YcbcrConversion)
    }
    fn destroy_ycbcr_conversion(&self, conversion: vk::SamplerYcbcrConversion) {
        self.destroy(ResourceKind::YcbcrConversion, conversion)
    }

    fn create_descriptor_set_layout(
        &self,
        _ty: vk::DescriptorType,
        _visibilities: &[vk::ShaderStageFlags],
    ) -> VkResult<vk::DescriptorSetLayout> {
        self.create(ResourceKind::DescriptorSetLayout)
    }
    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.destroy(ResourceKind::DescriptorSetLayout, layout)
    }

    fn create_descriptor_pool(
        &self,
        _ty: vk::DescriptorType,
        _descriptor_count: u32,
        _max_sets: u32,
    ) -> VkResult<vk::DescriptorPool> {
        self.create(ResourceKind::DescriptorPool)
    }
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.destroy(ResourceKind::DescriptorPool, pool)
    }
    fn allocate_descriptor_set(
        &self,
        _pool: vk::DescriptorPool,
        _layout: vk::DescriptorSetLayout,
    ) -> VkResult<vk::DescriptorSet> {
        //Sets die with their pool, so they are not counted as live objects.
        let set = self.create(ResourceKind::DescriptorSet)?;
        *self
            .counters()
            .live
            .entry(ResourceKind::DescriptorSet)
            .or_insert(0) -= 1;
        Ok(set)
    }

    fn create_pipeline_cache(&self) -> VkResult<vk::PipelineCache> {
        self.create(ResourceKind::PipelineCache)
    }
    fn destroy_pipeline_cache(&self, cache: vk::PipelineCache) {
        self.destroy(ResourceKind::PipelineCache, cache)
    }

    fn create_pipeline_layout(
        &self,
        _set_layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<vk::PipelineLayout> {
        self.create(ResourceKind::PipelineLayout)
    }
    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.destroy(ResourceKind::PipelineLayout, layout)
    }

    fn create_graphics_pipeline(
        &self,
        _cache: vk::PipelineCache,
        _desc: &PipelineDesc,
        _render_pass: vk::RenderPass,
        _layout: vk::PipelineLayout,
    ) -> VkResult<vk::Pipeline> {
        self.create(ResourceKind::Pipeline)
    }
    fn create_copy_pipeline(
        &self,
        _cache: vk::PipelineCache,
        _render_pass: vk::RenderPass,
        _layout: vk::PipelineLayout,
    ) -> VkResult<vk::Pipeline> {
        self.create(ResourceKind::Pipeline)
    }
    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.destroy(ResourceKind::Pipeline, pipeline)
    }

    fn create_command_pool(&self) -> VkResult<(vk::CommandPool, vk::CommandBuffer)> {
        let pool = self.create(ResourceKind::CommandPool)?;
        let buffer = vk::CommandBuffer::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed));
        Ok((pool, buffer))
    }
    fn reset_command_pool(&self, pool: vk::CommandPool) -> VkResult<()> {
        assert!(pool.as_raw() != 0, "Resetting null command pool");
        self.resets.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.destroy(ResourceKind::CommandPool, pool)
    }
    fn command_buffer_finished(&self, _buffer: vk::CommandBuffer) -> bool {
        self.gpu_finished.load(Ordering::Acquire)
    }

    fn create_uniform_buffer(&self, _size: u64) -> VkResult<vk::Buffer> {
        self.create(ResourceKind::Buffer)
    }
    fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.destroy(ResourceKind::Buffer, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    #[test]
    fn impl_send_sync() {
        assert_impl_all!(HeadlessFactory: Send, Sync);
    }

    #[test]
    fn counts_and_failure() {
        let factory = HeadlessFactory::new();
        let a = factory.create_uniform_buffer(256).unwrap();
        let b = factory.create_uniform_buffer(256).unwrap();
        assert_ne!(a, b);
        assert_eq!(factory.live(ResourceKind::Buffer), 2);

        factory.fail_next(ResourceKind::Buffer, vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        assert_eq!(
            factory.create_uniform_buffer(256),
            Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
        );
        //Only fails once
        let c = factory.create_uniform_buffer(256).unwrap();

        factory.destroy_buffer(a);
        factory.destroy_buffer(b);
        factory.destroy_buffer(c);
        assert_eq!(factory.live(ResourceKind::Buffer), 0);
        assert_eq!(factory.created(ResourceKind::Buffer), 3);
        assert_eq!(factory.destroy_log(), vec![ResourceKind::Buffer; 3]);
    }
}
