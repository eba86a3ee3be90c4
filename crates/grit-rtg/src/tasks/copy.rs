use crate::{Caps, ExpectedOutcome, FlushError, FlushState, IRect, ProxyKey, RenderTaskOps};

///Copies `rect` of `src` into `dst` by drawing with the copy pipeline.
///
/// The caller adds a surface dependency on `src`, and `dst` as the target.
pub struct CopyTask {
    src: ProxyKey,
    dst: ProxyKey,
    rect: IRect,
}

impl CopyTask {
    pub fn new(src: ProxyKey, dst: ProxyKey, rect: IRect) -> Self {
        CopyTask { src, dst, rect }
    }
}

impl RenderTaskOps for CopyTask {
    fn name(&self) -> &str {
        "Copy"
    }

    fn on_make_closed(&mut self, _caps: &Caps) -> ExpectedOutcome {
        ExpectedOutcome::TargetDirty(self.rect)
    }

    fn on_execute(&mut self, state: &mut FlushState<'_>) -> Result<(), FlushError> {
        if state.proxy(self.src).is_none() {
            return Err(FlushError::TaskFailed {
                task: self.name().to_string(),
                reason: "source proxy was removed".to_string(),
            });
        }
        let attachments = super::target_attachments(state, self.name(), self.dst)?;
        let (_, handle) = state.provider.find_compatible_render_pass(&attachments)?;
        let pipeline = state.provider.find_or_create_copy_pipeline(handle)?;

        let pool = state.provider.find_or_create_command_pool()?;
        pool.track(pipeline);
        pool.close();
        Ok(())
    }
}
