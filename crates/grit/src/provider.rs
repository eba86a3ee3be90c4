use std::sync::Arc;

use ahash::AHashMap;
use ash::vk;
use crossbeam_channel::{Receiver, Sender};
use smallvec::{SmallVec, smallvec};

use crate::{
    ProviderError,
    factory::ResourceFactory,
    resources::{
        AttachmentsDescriptor, BackendObject, CommandPool, CompatibleRpHandle, CopyPipeline,
        DescriptorSet, DescriptorSetHandle, DescriptorSetKey, DescriptorSetManager, LoadStoreOps,
        PipelineDesc, PipelineState, RenderPass, ResourceKind, Sampler, SamplerKey, SamplerState,
        UniformBlock, YcbcrConversion, YcbcrConversionInfo,
    },
};

mod pipeline_cache;
mod render_pass_set;
mod worker;

use pipeline_cache::PipelineStateCache;
use render_pass_set::CompatibleRenderPassSet;
use worker::ResetWorker;

///Configuration of a [ResourceProvider].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    ///If true, command pools are reset on a background thread.
    pub background_reset: bool,
    ///Name of the background reset thread.
    pub worker_name: String,
    ///Size in bytes of a standard uniform block.
    pub standard_uniform_size: u64,
    ///Number of sets the first descriptor pool of a manager can hold.
    pub descriptor_pool_initial: u32,
    ///Upper bound for the number of sets of a single descriptor pool.
    pub descriptor_pool_max: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            background_reset: true,
            worker_name: "grit-pool-reset".to_string(),
            standard_uniform_size: 256,
            descriptor_pool_initial: 16,
            descriptor_pool_max: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderState {
    Live,
    Destroyed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    ///Destroys every object, asserting that the provider holds the last reference.
    Destroy,
    ///Forgets every object without calling into the backend.
    Abandon,
}

///Caches and pools backend objects.
///
/// Find-or-create objects (render passes, samplers, ycbcr conversions, descriptor set managers, pipeline states, copy pipelines)
/// are shared via [Arc]. They live until the provider is torn down. Command pools and uniform blocks are checked out
/// and returned explicitly.
///
/// The provider itself is not synchronised. The only cross-thread interaction is the background command pool reset,
/// which posts reset pools back over a channel that is drained on the next checkout.
pub struct ResourceProvider {
    factory: Arc<dyn ResourceFactory>,
    config: ProviderConfig,
    state: ProviderState,

    render_pass_sets: Vec<CompatibleRenderPassSet>,
    copy_pipelines: Vec<Arc<CopyPipeline>>,
    copy_pipeline_layout: Option<vk::PipelineLayout>,
    samplers: AHashMap<SamplerKey, Arc<Sampler>>,
    ycbcr_conversions: AHashMap<YcbcrConversionInfo, Arc<YcbcrConversion>>,
    pipeline_cache: Option<vk::PipelineCache>,
    pipeline_states: PipelineStateCache,
    descriptor_set_managers: Vec<DescriptorSetManager>,

    active_command_pools: Vec<Arc<CommandPool>>,
    available_command_pools: Vec<Arc<CommandPool>>,
    recycled_tx: Sender<Arc<CommandPool>>,
    recycled_rx: Receiver<Arc<CommandPool>>,
    reset_worker: Option<ResetWorker>,

    available_uniform_blocks: Vec<UniformBlock>,
}

impl ResourceProvider {
    ///Creates the provider. This creates the uniform descriptor set manager right away, and spawns the reset worker if
    /// configured.
    pub fn new(
        factory: Arc<dyn ResourceFactory>,
        config: ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let uniform_manager = DescriptorSetManager::new(
            factory.as_ref(),
            DescriptorSetHandle::UNIFORM,
            DescriptorSetKey {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                visibilities: smallvec![vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT],
            },
            config.descriptor_pool_initial,
            config.descriptor_pool_max,
        )?;

        let (recycled_tx, recycled_rx) = crossbeam_channel::unbounded();

        let reset_worker = if config.background_reset {
            match ResetWorker::new(&config.worker_name, factory.clone(), recycled_tx.clone()) {
                Ok(worker) => Some(worker),
                Err(e) => {
                    uniform_manager.destroy(factory.as_ref());
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        Ok(ResourceProvider {
            factory,
            config,
            state: ProviderState::Live,
            render_pass_sets: Vec::new(),
            copy_pipelines: Vec::new(),
            copy_pipeline_layout: None,
            samplers: AHashMap::default(),
            ycbcr_conversions: AHashMap::default(),
            pipeline_cache: None,
            pipeline_states: PipelineStateCache::default(),
            descriptor_set_managers: vec![uniform_manager],
            active_command_pools: Vec::new(),
            available_command_pools: Vec::new(),
            recycled_tx,
            recycled_rx,
            reset_worker,
            available_uniform_blocks: Vec::new(),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn factory(&self) -> &Arc<dyn ResourceFactory> {
        &self.factory
    }

    fn check_live(&self) -> Result<(), ProviderError> {
        if self.state == ProviderState::Live {
            Ok(())
        } else {
            Err(ProviderError::TornDown)
        }
    }

    pub fn is_live(&self) -> bool {
        self.state == ProviderState::Live
    }

    //
    // Render passes
    //

    ///Returns the simple render pass of the compatibility class of `attachments`, and a handle to that class.
    /// Creates the class if none exists yet.
    pub fn find_compatible_render_pass(
        &mut self,
        attachments: &AttachmentsDescriptor,
    ) -> Result<(Arc<RenderPass>, CompatibleRpHandle), ProviderError> {
        self.check_live()?;
        for (idx, set) in self.render_pass_sets.iter().enumerate() {
            if set.is_compatible(attachments) {
                return Ok((set.compatible_render_pass().clone(), CompatibleRpHandle(idx)));
            }
        }

        let set = CompatibleRenderPassSet::new(self.factory.as_ref(), *attachments)?;
        let pass = set.compatible_render_pass().clone();
        let handle = CompatibleRpHandle(self.render_pass_sets.len());
        self.render_pass_sets.push(set);

        #[cfg(feature = "logging")]
        log::debug!(
            "New render pass compatibility class {} for {:?}, {} classes total",
            handle.0,
            attachments,
            self.render_pass_sets.len()
        );

        Ok((pass, handle))
    }

    pub fn find_compatible_render_pass_by_handle(
        &self,
        handle: CompatibleRpHandle,
    ) -> Result<Arc<RenderPass>, ProviderError> {
        self.check_live()?;
        Ok(self.render_pass_set(handle).compatible_render_pass().clone())
    }

    ///Returns the render pass with the given ops that is compatible to `attachments`.
    pub fn find_render_pass(
        &mut self,
        attachments: &AttachmentsDescriptor,
        color_ops: LoadStoreOps,
        stencil_ops: LoadStoreOps,
    ) -> Result<(Arc<RenderPass>, CompatibleRpHandle), ProviderError> {
        let (_, handle) = self.find_compatible_render_pass(attachments)?;
        let pass = self.find_render_pass_by_handle(handle, color_ops, stencil_ops)?;
        Ok((pass, handle))
    }

    pub fn find_render_pass_by_handle(
        &mut self,
        handle: CompatibleRpHandle,
        color_ops: LoadStoreOps,
        stencil_ops: LoadStoreOps,
    ) -> Result<Arc<RenderPass>, ProviderError> {
        self.check_live()?;
        assert!(
            handle.0 < self.render_pass_sets.len(),
            "Invalid compatible render pass handle {}",
            handle.0
        );
        let factory = self.factory.clone();
        self.render_pass_sets[handle.0].get_render_pass(factory.as_ref(), color_ops, stencil_ops)
    }

    ///Number of render pass compatibility classes. Grows with every new attachment layout and is never trimmed.
    pub fn render_pass_set_count(&self) -> usize {
        self.render_pass_sets.len()
    }

    fn render_pass_set(&self, handle: CompatibleRpHandle) -> &CompatibleRenderPassSet {
        assert!(
            handle.0 < self.render_pass_sets.len(),
            "Invalid compatible render pass handle {}",
            handle.0
        );
        &self.render_pass_sets[handle.0]
    }

    //
    // Pipelines
    //

    fn pipeline_cache(&mut self) -> Result<vk::PipelineCache, ProviderError> {
        if let Some(cache) = self.pipeline_cache {
            return Ok(cache);
        }
        let cache = ProviderError::created(
            ResourceKind::PipelineCache,
            self.factory.create_pipeline_cache(),
        )?;
        self.pipeline_cache = Some(cache);
        Ok(cache)
    }

    ///Returns the copy pipeline for render targets of the compatibility class `dst`.
    pub fn find_or_create_copy_pipeline(
        &mut self,
        dst: CompatibleRpHandle,
    ) -> Result<Arc<CopyPipeline>, ProviderError> {
        self.check_live()?;
        if let Some(pipeline) = self.copy_pipelines.iter().find(|p| p.is_compatible(dst)) {
            return Ok(pipeline.clone());
        }

        let render_pass = self.render_pass_set(dst).compatible_render_pass().inner;
        let cache = self.pipeline_cache()?;
        let layout = match self.copy_pipeline_layout {
            Some(layout) => layout,
            None => {
                let sampler_layout = self.get_sampler_ds_layout_for(
                    vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    &[vk::ShaderStageFlags::FRAGMENT],
                )?;
                let layout = ProviderError::created(
                    ResourceKind::PipelineLayout,
                    self.factory
                        .create_pipeline_layout(&[self.uniform_ds_layout(), sampler_layout]),
                )?;
                self.copy_pipeline_layout = Some(layout);
                layout
            }
        };

        let pipeline = ProviderError::created(
            ResourceKind::Pipeline,
            self.factory.create_copy_pipeline(cache, render_pass, layout),
        )?;
        let pipeline = Arc::new(CopyPipeline {
            pipeline,
            render_pass: dst,
        });
        self.copy_pipelines.push(pipeline.clone());
        Ok(pipeline)
    }

    ///Layout shared by all copy pipelines, if any copy pipeline was created so far.
    pub fn copy_pipeline_layout(&self) -> Option<vk::PipelineLayout> {
        self.copy_pipeline_layout
    }

    pub fn find_or_create_compatible_pipeline_state(
        &mut self,
        desc: &PipelineDesc,
    ) -> Result<Arc<PipelineState>, ProviderError> {
        self.check_live()?;
        if let Some(state) = self.pipeline_states.get(desc) {
            #[cfg(feature = "logging")]
            log::trace!("Pipeline state cache hit for {:?}", desc.program_key);
            return Ok(state);
        }

        let render_pass = self.render_pass_set(desc.render_pass).compatible_render_pass().inner;
        let mut set_layouts: SmallVec<[vk::DescriptorSetLayout; 3]> = smallvec![self.uniform_ds_layout()];
        for handle in &desc.sampler_sets {
            set_layouts.push(self.get_sampler_ds_layout(*handle)?);
        }
        let cache = self.pipeline_cache()?;

        let layout = ProviderError::created(
            ResourceKind::PipelineLayout,
            self.factory.create_pipeline_layout(&set_layouts),
        )?;
        let pipeline = match ProviderError::created(
            ResourceKind::Pipeline,
            self.factory
                .create_graphics_pipeline(cache, desc, render_pass, layout),
        ) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                self.factory.destroy_pipeline_layout(layout);
                return Err(e);
            }
        };

        #[cfg(feature = "logging")]
        log::debug!("Created pipeline state for {:?}", desc.program_key);

        let state = Arc::new(PipelineState {
            pipeline,
            layout,
            desc: desc.clone(),
        });
        self.pipeline_states.insert(state.clone());
        Ok(state)
    }

    ///Returns (hits, misses) of the pipeline state cache.
    pub fn pipeline_state_stats(&self) -> (u64, u64) {
        (self.pipeline_states.hits, self.pipeline_states.misses)
    }

    //
    // Samplers
    //

    pub fn find_or_create_compatible_sampler(
        &mut self,
        state: SamplerState,
        ycbcr: Option<&YcbcrConversionInfo>,
    ) -> Result<Arc<Sampler>, ProviderError> {
        self.check_live()?;
        let ycbcr = ycbcr.filter(|info| info.is_valid()).copied();
        let key = SamplerKey { state, ycbcr };
        if let Some(sampler) = self.samplers.get(&key) {
            return Ok(sampler.clone());
        }

        let conversion = match &ycbcr {
            Some(info) => self.find_or_create_compatible_ycbcr_conversion(info)?,
            None => None,
        };
        let inner = ProviderError::created(
            ResourceKind::Sampler,
            self.factory
                .create_sampler(&state, conversion.as_ref().map(|c| c.inner)),
        )?;

        #[cfg(feature = "logging")]
        log::debug!("Created sampler for {:?}", key);

        let sampler = Arc::new(Sampler {
            inner,
            key,
            ycbcr: conversion,
        });
        self.samplers.insert(key, sampler.clone());
        Ok(sampler)
    }

    ///Returns the conversion for `info`, or `None` if `info` describes no valid conversion.
    pub fn find_or_create_compatible_ycbcr_conversion(
        &mut self,
        info: &YcbcrConversionInfo,
    ) -> Result<Option<Arc<YcbcrConversion>>, ProviderError> {
        self.check_live()?;
        if !info.is_valid() {
            return Ok(None);
        }
        if let Some(conversion) = self.ycbcr_conversions.get(info) {
            return Ok(Some(conversion.clone()));
        }

        let inner = ProviderError::created(
            ResourceKind::YcbcrConversion,
            self.factory.create_ycbcr_conversion(info),
        )?;
        let conversion = Arc::new(YcbcrConversion { inner, info: *info });
        self.ycbcr_conversions.insert(*info, conversion.clone());
        Ok(Some(conversion))
    }

    //
    // Descriptor sets
    //

    ///Returns the handle of the sampler descriptor set manager for `ty` with one binding per visibility.
    pub fn get_sampler_descriptor_set_handle(
        &mut self,
        ty: vk::DescriptorType,
        visibilities: &[vk::ShaderStageFlags],
    ) -> Result<DescriptorSetHandle, ProviderError> {
        self.check_live()?;
        assert!(
            ty == vk::DescriptorType::COMBINED_IMAGE_SAMPLER
                || ty == vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
            "{:?} is no sampler descriptor type",
            ty
        );
        //Skip the uniform manager.
        if let Some(idx) = self
            .descriptor_set_managers
            .iter()
            .skip(1)
            .position(|m| m.is_compatible(ty, visibilities))
        {
            return Ok(DescriptorSetHandle(idx + 1));
        }

        let handle = DescriptorSetHandle(self.descriptor_set_managers.len());
        let manager = DescriptorSetManager::new(
            self.factory.as_ref(),
            handle,
            DescriptorSetKey {
                ty,
                visibilities: visibilities.iter().copied().collect(),
            },
            self.config.descriptor_pool_initial,
            self.config.descriptor_pool_max,
        )?;
        self.descriptor_set_managers.push(manager);
        Ok(handle)
    }

    pub fn uniform_ds_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptor_set_managers[DescriptorSetHandle::UNIFORM.0].layout
    }

    pub fn get_sampler_ds_layout(
        &self,
        handle: DescriptorSetHandle,
    ) -> Result<vk::DescriptorSetLayout, ProviderError> {
        self.check_live()?;
        self.descriptor_set_managers
            .get(handle.0)
            .map(|m| m.layout)
            .ok_or(ProviderError::UnknownDescriptorSetHandle(handle.0))
    }

    fn get_sampler_ds_layout_for(
        &mut self,
        ty: vk::DescriptorType,
        visibilities: &[vk::ShaderStageFlags],
    ) -> Result<vk::DescriptorSetLayout, ProviderError> {
        let handle = self.get_sampler_descriptor_set_handle(ty, visibilities)?;
        self.get_sampler_ds_layout(handle)
    }

    pub fn get_uniform_descriptor_set(&mut self) -> Result<DescriptorSet, ProviderError> {
        self.get_descriptor_set(DescriptorSetHandle::UNIFORM)
    }

    pub fn get_sampler_descriptor_set(
        &mut self,
        handle: DescriptorSetHandle,
    ) -> Result<DescriptorSet, ProviderError> {
        assert!(
            handle != DescriptorSetHandle::UNIFORM,
            "Uniform handle used for sampler descriptor set"
        );
        self.get_descriptor_set(handle)
    }

    fn get_descriptor_set(
        &mut self,
        handle: DescriptorSetHandle,
    ) -> Result<DescriptorSet, ProviderError> {
        self.check_live()?;
        let factory = self.factory.clone();
        self.descriptor_set_managers
            .get_mut(handle.0)
            .ok_or(ProviderError::UnknownDescriptorSetHandle(handle.0))?
            .get_descriptor_set(factory.as_ref())
    }

    ///Hands `set` back to its manager for reuse.
    pub fn recycle_descriptor_set(&mut self, set: DescriptorSet) {
        if !self.is_live() {
            return;
        }
        let handle = set.handle;
        match self.descriptor_set_managers.get_mut(handle.0) {
            Some(manager) => manager.recycle(set),
            None => panic!("Descriptor set of unknown manager {} recycled", handle.0),
        }
    }

    pub fn descriptor_set_manager(&self, handle: DescriptorSetHandle) -> Option<&DescriptorSetManager> {
        self.descriptor_set_managers.get(handle.0)
    }

    //
    // Command pools
    //

    ///Moves all pools that finished their reset into the available list.
    fn drain_recycled(&mut self) {
        while let Ok(pool) = self.recycled_rx.try_recv() {
            self.available_command_pools.push(pool);
        }
    }

    ///Checks out an open command pool.
    pub fn find_or_create_command_pool(&mut self) -> Result<Arc<CommandPool>, ProviderError> {
        self.check_live()?;
        self.drain_recycled();

        let pool = match self.available_command_pools.pop() {
            Some(pool) => {
                #[cfg(feature = "logging")]
                log::trace!("Reusing command pool {:?}", pool.inner);
                pool
            }
            None => {
                let (inner, primary) = ProviderError::created(
                    ResourceKind::CommandPool,
                    self.factory.create_command_pool(),
                )?;
                #[cfg(feature = "logging")]
                log::debug!("Created command pool {:?}", inner);
                Arc::new(CommandPool::new(inner, primary))
            }
        };
        debug_assert!(pool.is_open(), "Checked out command pool is not open");
        self.active_command_pools.push(pool.clone());
        Ok(pool)
    }

    ///Recycles all active pools that are closed, and whose primary command buffer finished on the GPU.
    ///
    /// A pool whose `Arc` is still held outside the provider is not recycled until the next check.
    pub fn check_command_buffers(&mut self) {
        if !self.is_live() {
            return;
        }

        let mut idx = 0;
        while idx < self.active_command_pools.len() {
            let pool = &self.active_command_pools[idx];
            if pool.is_open() || !self.factory.command_buffer_finished(pool.primary) {
                idx += 1;
                continue;
            }
            if Arc::strong_count(pool) > 1 {
                #[cfg(feature = "logging")]
                log::warn!(
                    "Command pool {:?} finished, but is still referenced. Not recycling",
                    pool.inner
                );
                idx += 1;
                continue;
            }

            let pool = self.active_command_pools.swap_remove(idx);
            self.background_reset(pool);
        }
    }

    ///Releases the pool's resources right away, and resets the pool either on the worker, or synchronously.
    /// The pool only becomes available again after the reset.
    fn background_reset(&mut self, pool: Arc<CommandPool>) {
        assert!(!pool.is_open(), "Resetting command pool that is still open");
        pool.release_resources();

        if let Some(worker) = &self.reset_worker {
            worker.submit(pool);
            return;
        }

        match self.factory.reset_command_pool(pool.inner) {
            Ok(()) => {
                pool.reopen();
                //Goes through the same channel as the worker's resets, so checkout has a single source.
                if self.recycled_tx.send(pool).is_err() {
                    #[cfg(feature = "logging")]
                    log::error!("Recycling channel closed");
                }
            }
            Err(_e) => {
                #[cfg(feature = "logging")]
                log::error!("Failed to reset command pool {:?}: {}", pool.inner, _e);
                if let Ok(pool) = Arc::try_unwrap(pool) {
                    pool.destroy(self.factory.as_ref());
                }
            }
        }
    }

    pub fn active_command_pool_count(&self) -> usize {
        self.active_command_pools.len()
    }

    ///Number of pools that are ready for checkout. Includes pools whose background reset finished since the last checkout.
    pub fn available_command_pool_count(&mut self) -> usize {
        self.drain_recycled();
        self.available_command_pools.len()
    }

    //
    // Uniform buffers
    //

    pub fn find_or_create_standard_uniform_buffer(&mut self) -> Result<UniformBlock, ProviderError> {
        self.check_live()?;
        if let Some(block) = self.available_uniform_blocks.pop() {
            return Ok(block);
        }
        let size = self.config.standard_uniform_size;
        let buffer = ProviderError::created(
            ResourceKind::Buffer,
            self.factory.create_uniform_buffer(size),
        )?;
        Ok(UniformBlock {
            buffer,
            size,
            generation: 0,
        })
    }

    pub fn available_uniform_block_count(&self) -> usize {
        self.available_uniform_blocks.len()
    }

    pub fn recycle_standard_uniform_buffer(&mut self, mut block: UniformBlock) {
        assert!(
            block.size == self.config.standard_uniform_size,
            "Recycled uniform block of size {}, expected {}",
            block.size,
            self.config.standard_uniform_size
        );
        match self.state {
            ProviderState::Live => {
                block.generation += 1;
                self.available_uniform_blocks.push(block);
            }
            ProviderState::Destroyed => block.destroy(self.factory.as_ref()),
            ProviderState::Abandoned => {}
        }
    }

    //
    // Teardown
    //

    ///Destroys all backend objects.
    ///
    /// # Panics
    /// if any shared object is still referenced outside the provider.
    pub fn destroy_resources(&mut self) {
        self.teardown(Teardown::Destroy);
    }

    ///Forgets all backend objects without destroying them. Used when the device was lost.
    pub fn abandon_resources(&mut self) {
        self.teardown(Teardown::Abandon);
    }

    fn teardown(&mut self, mode: Teardown) {
        if self.state != ProviderState::Live {
            #[cfg(feature = "logging")]
            log::warn!("Resource provider torn down twice, ignoring {:?}", mode);
            return;
        }

        #[cfg(feature = "logging")]
        log::debug!("Tearing down resource provider: {:?}", mode);

        //Waits for in-flight resets, they end up in the recycled channel.
        if let Some(mut worker) = self.reset_worker.take() {
            worker.shutdown();
        }
        self.drain_recycled();

        let factory = self.factory.clone();
        let factory = factory.as_ref();

        for pool in std::mem::take(&mut self.active_command_pools) {
            release(factory, pool, mode);
        }
        for pool in std::mem::take(&mut self.available_command_pools) {
            release(factory, pool, mode);
        }

        for (_, state) in std::mem::take(&mut self.pipeline_states.map) {
            release(factory, state, mode);
        }
        for pipeline in std::mem::take(&mut self.copy_pipelines) {
            release(factory, pipeline, mode);
        }
        if let Some(layout) = self.copy_pipeline_layout.take() {
            if mode == Teardown::Destroy {
                factory.destroy_pipeline_layout(layout);
            }
        }
        if let Some(cache) = self.pipeline_cache.take() {
            if mode == Teardown::Destroy {
                factory.destroy_pipeline_cache(cache);
            }
        }

        for set in std::mem::take(&mut self.render_pass_sets) {
            for pass in set.passes {
                release(factory, pass, mode);
            }
        }

        for (_, sampler) in std::mem::take(&mut self.samplers) {
            release(factory, sampler, mode);
        }
        for (_, conversion) in std::mem::take(&mut self.ycbcr_conversions) {
            release(factory, conversion, mode);
        }

        for manager in std::mem::take(&mut self.descriptor_set_managers) {
            if mode == Teardown::Destroy {
                manager.destroy(factory);
            }
        }

        for block in std::mem::take(&mut self.available_uniform_blocks) {
            if mode == Teardown::Destroy {
                block.destroy(factory);
            }
        }

        self.state = match mode {
            Teardown::Destroy => ProviderState::Destroyed,
            Teardown::Abandon => ProviderState::Abandoned,
        };
    }
}

///Releases the provider's reference to `object`.
fn release<T: BackendObject>(factory: &dyn ResourceFactory, object: Arc<T>, mode: Teardown) {
    match mode {
        Teardown::Destroy => match Arc::try_unwrap(object) {
            Ok(object) => object.destroy(factory),
            Err(object) => panic!(
                "{} is still referenced {} times outside the resource provider at teardown",
                T::KIND,
                Arc::strong_count(&object) - 1
            ),
        },
        Teardown::Abandon => {
            #[cfg(feature = "logging")]
            if Arc::strong_count(&object) > 1 {
                log::warn!(
                    "Abandoned {} is still referenced {} times",
                    T::KIND,
                    Arc::strong_count(&object) - 1
                );
            }
            drop(object);
        }
    }
}

impl Drop for ResourceProvider {
    fn drop(&mut self) {
        if self.state == ProviderState::Live && !std::thread::panicking() {
            self.destroy_resources();
        }
    }
}
