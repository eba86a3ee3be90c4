use ash::vk;

use super::{BackendObject, ResourceKind};
use crate::factory::ResourceFactory;

///Standard sized uniform buffer block.
///
/// The `generation` is bumped every time the block is returned to the provider. Users that keep the generation
/// next to a block can detect that it was recycled in the meantime.
#[derive(Debug)]
pub struct UniformBlock {
    pub buffer: vk::Buffer,
    pub size: u64,
    pub(crate) generation: u64,
}

impl UniformBlock {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl BackendObject for UniformBlock {
    const KIND: ResourceKind = ResourceKind::Buffer;
    fn destroy(self, factory: &dyn ResourceFactory) {
        factory.destroy_buffer(self.buffer);
    }
}
