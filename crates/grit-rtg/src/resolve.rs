use smallvec::SmallVec;

use crate::{
    Caps, ExpectedOutcome, FlushError, FlushState, IRect, ProxyKey, RenderTaskOps, ResolveFlags,
};

///A single resolve scheduled on a resolve task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolve {
    pub proxy: ProxyKey,
    pub flags: ResolveFlags,
    ///Region of the multisampled content that needs resolving. Only set if `flags` contains [ResolveFlags::MSAA].
    pub msaa_rect: Option<IRect>,
}

///Behaviour of a task that resolves MSAA content and/or regenerates mip maps.
pub trait TextureResolveOps: RenderTaskOps {
    ///Records a resolve for `proxy`. Called by the graph, which also takes care of the dirty flags and dependencies.
    fn add_resolve(&mut self, resolve: Resolve);
    fn resolves(&self) -> &[Resolve];
}

///Creates resolve tasks. The graph calls this lazily, at most once per consuming task.
pub trait TextureResolveManager {
    fn new_resolve_task(&self, caps: &Caps) -> Box<dyn TextureResolveOps>;
}

///Resolve task that records its resolves into a command pool of the provider.
#[derive(Debug, Default)]
pub struct TextureResolveTask {
    resolves: SmallVec<[Resolve; 2]>,
}

impl RenderTaskOps for TextureResolveTask {
    fn name(&self) -> &str {
        "TextureResolve"
    }

    fn on_make_closed(&mut self, _caps: &Caps) -> ExpectedOutcome {
        ExpectedOutcome::TargetClean
    }

    fn on_execute(&mut self, state: &mut FlushState<'_>) -> Result<(), FlushError> {
        let pool = state.provider.find_or_create_command_pool()?;
        for _resolve in &self.resolves {
            #[cfg(feature = "logging")]
            log::trace!(
                "Task {}: resolve {:?} of {} (msaa region {:?})",
                state.current_task(),
                _resolve.flags,
                state.proxy(_resolve.proxy).map(|p| p.name()).unwrap_or("<removed>"),
                _resolve.msaa_rect
            );
        }
        pool.close();
        Ok(())
    }
}

impl TextureResolveOps for TextureResolveTask {
    fn add_resolve(&mut self, resolve: Resolve) {
        self.resolves.push(resolve);
    }

    fn resolves(&self) -> &[Resolve] {
        &self.resolves
    }
}

///Creates [TextureResolveTask]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResolveManager;

impl TextureResolveManager for DefaultResolveManager {
    fn new_resolve_task(&self, _caps: &Caps) -> Box<dyn TextureResolveOps> {
        Box::new(TextureResolveTask::default())
    }
}
