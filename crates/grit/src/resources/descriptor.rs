use ash::vk;
use smallvec::SmallVec;

use super::{BackendObject, ResourceKind};
use crate::{ProviderError, factory::ResourceFactory};

///Index of a descriptor set manager within the provider. Handle 0 is always the uniform buffer manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetHandle(pub(crate) usize);

impl DescriptorSetHandle {
    pub const UNIFORM: Self = DescriptorSetHandle(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

///Structural key of a manager. One binding per visibility entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorSetKey {
    pub ty: vk::DescriptorType,
    pub visibilities: SmallVec<[vk::ShaderStageFlags; 4]>,
}

///A descriptor set checked out from a manager. Must be handed back via
/// [recycle_descriptor_set](crate::ResourceProvider::recycle_descriptor_set).
#[derive(Debug)]
pub struct DescriptorSet {
    pub inner: vk::DescriptorSet,
    pub layout: vk::DescriptorSetLayout,
    pub(crate) handle: DescriptorSetHandle,
}

impl DescriptorSet {
    pub fn manager(&self) -> DescriptorSetHandle {
        self.handle
    }
}

///Owns a descriptor set layout, and a chain of pools sets of that layout are allocated from.
///
/// Pools grow by 1.5 with each new pool, up to `max_pool_size`. Sets that are recycled end up on a free list and are
/// handed out again before any new allocation happens.
pub struct DescriptorSetManager {
    pub key: DescriptorSetKey,
    pub layout: vk::DescriptorSetLayout,
    handle: DescriptorSetHandle,
    pools: Vec<vk::DescriptorPool>,
    current_pool_size: u32,
    allocated_in_current: u32,
    max_pool_size: u32,
    free_sets: Vec<DescriptorSet>,
}

impl DescriptorSetManager {
    pub(crate) fn new(
        factory: &dyn ResourceFactory,
        handle: DescriptorSetHandle,
        key: DescriptorSetKey,
        initial_pool_size: u32,
        max_pool_size: u32,
    ) -> Result<Self, ProviderError> {
        let layout = ProviderError::created(
            ResourceKind::DescriptorSetLayout,
            factory.create_descriptor_set_layout(key.ty, &key.visibilities),
        )?;
        let initial_pool_size = initial_pool_size.max(1);

        Ok(DescriptorSetManager {
            key,
            layout,
            handle,
            pools: Vec::new(),
            //Pretend the "previous" pool was full, so the first one gets the initial size.
            current_pool_size: initial_pool_size,
            allocated_in_current: initial_pool_size,
            max_pool_size: max_pool_size.max(initial_pool_size),
            free_sets: Vec::new(),
        })
    }

    pub fn is_compatible(&self, ty: vk::DescriptorType, visibilities: &[vk::ShaderStageFlags]) -> bool {
        self.key.ty == ty && self.key.visibilities.as_slice() == visibilities
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_sets.len()
    }

    pub(crate) fn get_descriptor_set(
        &mut self,
        factory: &dyn ResourceFactory,
    ) -> Result<DescriptorSet, ProviderError> {
        if let Some(set) = self.free_sets.pop() {
            return Ok(set);
        }

        if self.pools.is_empty() || self.allocated_in_current >= self.current_pool_size {
            let size = if self.pools.is_empty() {
                self.current_pool_size
            } else {
                (self.current_pool_size + (self.current_pool_size >> 1).max(1)).min(self.max_pool_size)
            };
            let pool = ProviderError::created(
                ResourceKind::DescriptorPool,
                factory.create_descriptor_pool(self.key.ty, size * self.key.visibilities.len().max(1) as u32, size),
            )?;

            #[cfg(feature = "logging")]
            log::debug!(
                "Descriptor set manager {} grows by pool of {} sets",
                self.handle.0,
                size
            );

            self.pools.push(pool);
            self.current_pool_size = size;
            self.allocated_in_current = 0;
        }

        //NOTE: pools is never empty here.
        let pool = self.pools[self.pools.len() - 1];
        let inner = ProviderError::created(
            ResourceKind::DescriptorSet,
            factory.allocate_descriptor_set(pool, self.layout),
        )?;
        self.allocated_in_current += 1;

        Ok(DescriptorSet {
            inner,
            layout: self.layout,
            handle: self.handle,
        })
    }

    pub(crate) fn recycle(&mut self, set: DescriptorSet) {
        assert!(
            set.handle == self.handle,
            "Descriptor set of manager {} recycled into manager {}",
            set.handle.0,
            self.handle.0
        );
        self.free_sets.push(set);
    }
}

impl BackendObject for DescriptorSetManager {
    const KIND: ResourceKind = ResourceKind::DescriptorSetLayout;
    fn destroy(self, factory: &dyn ResourceFactory) {
        //Sets are freed implicitly with their pools.
        for pool in self.pools {
            factory.destroy_descriptor_pool(pool);
        }
        factory.destroy_descriptor_set_layout(self.layout);
    }
}
