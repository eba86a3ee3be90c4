use std::{sync::Arc, thread};

use crossbeam_channel::Sender;

use crate::{
    factory::ResourceFactory,
    resources::{BackendObject, CommandPool},
};

///Background thread that resets command pools.
///
/// Pools are sent in via [submit](ResetWorker::submit). Once reset they are posted back on the `recycled` channel the
/// worker was created with. The thread lives until [shutdown](ResetWorker::shutdown) is called or the worker is dropped. All
/// pools that were submitted before are reset before the thread exits.
pub(crate) struct ResetWorker {
    jobs: Option<Sender<Arc<CommandPool>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ResetWorker {
    pub(crate) fn new(
        name: &str,
        factory: Arc<dyn ResourceFactory>,
        recycled: Sender<Arc<CommandPool>>,
    ) -> Result<Self, std::io::Error> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Arc<CommandPool>>();

        let thread = thread::Builder::new().name(name.to_string()).spawn(move || {
            while let Ok(pool) = job_rx.recv() {
                match factory.reset_command_pool(pool.inner) {
                    Ok(()) => {
                        pool.reopen();
                        if recycled.send(pool).is_err() {
                            #[cfg(feature = "logging")]
                            log::warn!("Recycling channel closed, dropping reset command pool");
                        }
                    }
                    Err(_e) => {
                        #[cfg(feature = "logging")]
                        log::error!("Failed to reset command pool {:?}: {}", pool.inner, _e);

                        if let Ok(pool) = Arc::try_unwrap(pool) {
                            pool.destroy(factory.as_ref());
                        }
                    }
                }
            }
        })?;

        Ok(ResetWorker {
            jobs: Some(job_tx),
            thread: Some(thread),
        })
    }

    pub(crate) fn submit(&self, pool: Arc<CommandPool>) {
        if let Some(jobs) = &self.jobs {
            if let Err(_e) = jobs.send(pool) {
                #[cfg(feature = "logging")]
                log::error!("Reset worker is gone, command pool is lost: {}", _e);
            }
        }
    }

    ///Closes the job queue and waits for all queued resets to finish.
    pub(crate) fn shutdown(&mut self) {
        self.jobs = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                #[cfg(feature = "logging")]
                log::error!("Failed to join command pool reset worker");
            }
        }
    }
}

impl Drop for ResetWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessFactory;

    #[test]
    fn resets_and_recycles() {
        let factory = Arc::new(HeadlessFactory::new());
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut worker = ResetWorker::new("test-reset", factory.clone(), tx).unwrap();

        let (inner, primary) = factory.create_command_pool().unwrap();
        let pool = Arc::new(CommandPool::new(inner, primary));
        pool.close();
        worker.submit(pool);
        worker.shutdown();

        let pool = rx.try_recv().unwrap();
        assert!(pool.is_open());
        assert_eq!(factory.resets(), 1);
        Arc::try_unwrap(pool).ok().unwrap().destroy(factory.as_ref());
    }
}
