use grit::{
    ash::vk,
    resources::{
        CommandPool, CompatibleRpHandle, DescriptorSetHandle, LoadStoreOps, PipelineDesc, SamplerState,
    },
};
use smallvec::SmallVec;

use crate::{Caps, ExpectedOutcome, FlushError, FlushState, IRect, ProxyKey, RenderTaskOps};

///A single draw of a [DrawTask].
#[derive(Debug, Clone, Default)]
pub struct Draw {
    ///Key of the shader program, as produced by a processor tree.
    pub program_key: SmallVec<[u32; 8]>,
    ///One sampler per sampled texture, in binding order.
    pub samplers: SmallVec<[SamplerState; 2]>,
}

///Render pass task that draws into a single target.
pub struct DrawTask {
    name: String,
    target: ProxyKey,
    bounds: IRect,
    color_ops: LoadStoreOps,
    draws: Vec<Draw>,
}

impl DrawTask {
    ///Task drawing into `bounds` of `target`. The task has to be added as target of `target` by the caller.
    pub fn new(name: impl Into<String>, target: ProxyKey, bounds: IRect) -> Self {
        DrawTask {
            name: name.into(),
            target,
            bounds,
            color_ops: LoadStoreOps::LOAD_STORE,
            draws: Vec::new(),
        }
    }

    pub fn with_clear(mut self) -> Self {
        self.color_ops = LoadStoreOps::CLEAR_STORE;
        self
    }

    pub fn add_draw(&mut self, draw: Draw) {
        self.draws.push(draw);
    }

    pub fn with_draw(mut self, draw: Draw) -> Self {
        self.add_draw(draw);
        self
    }
}

impl RenderTaskOps for DrawTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_make_closed(&mut self, _caps: &Caps) -> ExpectedOutcome {
        if self.bounds.is_empty() {
            ExpectedOutcome::TargetClean
        } else {
            ExpectedOutcome::TargetDirty(self.bounds)
        }
    }

    fn on_execute(&mut self, state: &mut FlushState<'_>) -> Result<(), FlushError> {
        let attachments = super::target_attachments(state, &self.name, self.target)?;
        let (render_pass, rp_handle) =
            state
                .provider
                .find_render_pass(&attachments, self.color_ops, LoadStoreOps::DONT_CARE)?;

        let pool = state.provider.find_or_create_command_pool()?;
        pool.track(render_pass);

        //The pool is closed on failure as well, otherwise it is never recycled.
        let result = self.record_draws(state, &pool, rp_handle);
        pool.close();
        result
    }
}

impl DrawTask {
    fn record_draws(
        &self,
        state: &mut FlushState<'_>,
        pool: &CommandPool,
        rp_handle: CompatibleRpHandle,
    ) -> Result<(), FlushError> {
        for draw in &self.draws {
            let mut sampler_sets: SmallVec<[DescriptorSetHandle; 2]> = SmallVec::new();
            if !draw.samplers.is_empty() {
                let visibilities: SmallVec<[vk::ShaderStageFlags; 4]> = draw
                    .samplers
                    .iter()
                    .map(|_| vk::ShaderStageFlags::FRAGMENT)
                    .collect();
                sampler_sets.push(state.provider.get_sampler_descriptor_set_handle(
                    vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    &visibilities,
                )?);
            }

            let pipeline = state
                .provider
                .find_or_create_compatible_pipeline_state(&PipelineDesc {
                    program_key: draw.program_key.clone(),
                    topology: vk::PrimitiveTopology::TRIANGLE_LIST,
                    render_pass: rp_handle,
                    sampler_sets: sampler_sets.clone(),
                })?;
            pool.track(pipeline);

            for sampler in &draw.samplers {
                let sampler = state.provider.find_or_create_compatible_sampler(*sampler, None)?;
                pool.track(sampler);
            }

            let uniforms = state.provider.find_or_create_standard_uniform_buffer()?;
            let uniform_set = match state.provider.get_uniform_descriptor_set() {
                Ok(set) => set,
                Err(e) => {
                    state.provider.recycle_standard_uniform_buffer(uniforms);
                    return Err(e.into());
                }
            };
            //NOTE: A real backend writes the block and binds the sets here.
            state.provider.recycle_descriptor_set(uniform_set);
            state.provider.recycle_standard_uniform_buffer(uniforms);

            for handle in sampler_sets {
                let set = state.provider.get_sampler_descriptor_set(handle)?;
                state.provider.recycle_descriptor_set(set);
            }
        }

        #[cfg(feature = "logging")]
        log::trace!(
            "Task {} [{}] recorded {} draws into {:?}",
            state.current_task(),
            self.name,
            self.draws.len(),
            pool.inner
        );

        Ok(())
    }
}
