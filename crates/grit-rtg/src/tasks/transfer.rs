use crate::{Caps, ExpectedOutcome, FlushError, FlushState, ProxyKey, RenderTaskOps};

///Reads a surface back to host memory. Has no targets.
pub struct TransferTask {
    src: ProxyKey,
}

impl TransferTask {
    pub fn new(src: ProxyKey) -> Self {
        TransferTask { src }
    }
}

impl RenderTaskOps for TransferTask {
    fn name(&self) -> &str {
        "TransferFrom"
    }

    fn on_make_closed(&mut self, _caps: &Caps) -> ExpectedOutcome {
        ExpectedOutcome::TargetClean
    }

    fn on_execute(&mut self, state: &mut FlushState<'_>) -> Result<(), FlushError> {
        let Some(_src) = state.proxy(self.src) else {
            return Err(FlushError::TaskFailed {
                task: self.name().to_string(),
                reason: "source proxy was removed".to_string(),
            });
        };

        #[cfg(feature = "logging")]
        log::trace!("Task {} reads back {}", state.current_task(), _src.name());

        let pool = state.provider.find_or_create_command_pool()?;
        pool.close();
        Ok(())
    }
}
