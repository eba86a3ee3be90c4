use ash::vk;
use thiserror::Error;

use crate::resources::ResourceKind;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to create {kind}: {source}")]
    Creation {
        kind: ResourceKind,
        #[source]
        source: vk::Result,
    },
    #[error("Descriptor set handle {0} is unknown")]
    UnknownDescriptorSetHandle(usize),
    #[error("Failed to spawn reset worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
    #[error("Resource provider was already torn down")]
    TornDown,
}

impl ProviderError {
    ///Maps a factory result into a creation error of `kind`.
    pub(crate) fn created<T>(kind: ResourceKind, res: ash::prelude::VkResult<T>) -> Result<T, Self> {
        res.map_err(|source| {
            #[cfg(feature = "logging")]
            log::error!("Backend failed to create {}: {}", kind, source);

            ProviderError::Creation { kind, source }
        })
    }
}
