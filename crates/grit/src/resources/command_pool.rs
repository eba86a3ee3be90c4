use std::{
    any::Any,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use ash::vk;

use super::{BackendObject, ResourceKind};
use crate::factory::ResourceFactory;

///Command pool with its primary command buffer.
///
/// A pool is *open* while it is recorded into. Objects used by the recorded commands can be tracked on the pool, which
/// keeps them alive until the pool's resources are released.
pub struct CommandPool {
    pub inner: vk::CommandPool,
    pub primary: vk::CommandBuffer,
    open: AtomicBool,
    tracked: Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
}

impl CommandPool {
    pub(crate) fn new(inner: vk::CommandPool, primary: vk::CommandBuffer) -> Self {
        CommandPool {
            inner,
            primary,
            open: AtomicBool::new(true),
            tracked: Mutex::new(Vec::new()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    ///Marks the pool as done recording. It becomes eligible for recycling once its primary buffer finished on the GPU.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub(crate) fn reopen(&self) {
        self.open.store(true, Ordering::Release);
    }

    ///Keeps `resource` alive until the pool's resources are released.
    pub fn track(&self, resource: Arc<dyn Any + Send + Sync>) {
        assert!(self.is_open(), "Tracking resource on closed command pool");
        self.tracked().push(resource);
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked().len()
    }

    //Ignores poisoning, the list is never observed half-written.
    fn tracked(&self) -> MutexGuard<'_, Vec<Arc<dyn Any + Send + Sync>>> {
        self.tracked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    ///Drops all tracked resources.
    pub(crate) fn release_resources(&self) {
        let released = std::mem::take(&mut *self.tracked());

        #[cfg(feature = "logging")]
        if !released.is_empty() {
            log::trace!(
                "Command pool {:?} released {} resources",
                self.inner,
                released.len()
            );
        }
        drop(released);
    }
}

impl BackendObject for CommandPool {
    const KIND: ResourceKind = ResourceKind::CommandPool;
    fn destroy(self, factory: &dyn ResourceFactory) {
        self.release_resources();
        factory.destroy_command_pool(self.inner);
    }
}
