use std::sync::Arc;

use ash::vk;

use super::{BackendObject, ResourceKind, YcbcrConversion, YcbcrConversionInfo};
use crate::factory::ResourceFactory;

///Filter of a sampler. `Mipmap` implies linear filtering between mip levels, and therefore that the sampled surface needs valid mip maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
    Mipmap,
}

impl Filter {
    pub fn vk_filter(&self) -> vk::Filter {
        match self {
            Filter::Nearest => vk::Filter::NEAREST,
            Filter::Linear | Filter::Mipmap => vk::Filter::LINEAR,
        }
    }

    pub fn vk_mipmap_mode(&self) -> vk::SamplerMipmapMode {
        match self {
            Filter::Mipmap => vk::SamplerMipmapMode::LINEAR,
            _ => vk::SamplerMipmapMode::NEAREST,
        }
    }

    pub fn is_mipmapped(&self) -> bool {
        *self == Filter::Mipmap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    MirrorRepeat,
    ClampToBorder,
}

impl WrapMode {
    pub fn vk_address_mode(&self) -> vk::SamplerAddressMode {
        match self {
            WrapMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            WrapMode::Repeat => vk::SamplerAddressMode::REPEAT,
            WrapMode::MirrorRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
            WrapMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerState {
    pub filter: Filter,
    pub wrap_x: WrapMode,
    pub wrap_y: WrapMode,
}

impl SamplerState {
    pub fn new(filter: Filter, wrap: WrapMode) -> Self {
        SamplerState {
            filter,
            wrap_x: wrap,
            wrap_y: wrap,
        }
    }
}

///Key a sampler is cached by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerKey {
    pub state: SamplerState,
    pub ycbcr: Option<YcbcrConversionInfo>,
}

pub struct Sampler {
    pub inner: vk::Sampler,
    pub key: SamplerKey,
    ///Conversion this sampler was created with. Keeps the conversion alive at least as long as the sampler.
    pub ycbcr: Option<Arc<YcbcrConversion>>,
}

impl BackendObject for Sampler {
    const KIND: ResourceKind = ResourceKind::Sampler;
    fn destroy(self, factory: &dyn ResourceFactory) {
        factory.destroy_sampler(self.inner);
        //NOTE: the conversion is released by the provider's ycbcr teardown, which runs after all samplers.
    }
}
