use ash::vk;

use super::{BackendObject, ResourceKind};
use crate::factory::ResourceFactory;

///Parameters of a sampler ycbcr conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YcbcrConversionInfo {
    pub format: vk::Format,
    ///Android style external format. Zero if `format` is used.
    pub external_format: u64,
    pub model: vk::SamplerYcbcrModelConversion,
    pub range: vk::SamplerYcbcrRange,
    pub x_chroma_offset: vk::ChromaLocation,
    pub y_chroma_offset: vk::ChromaLocation,
    pub chroma_filter: vk::Filter,
    pub force_explicit_reconstruction: bool,
}

impl YcbcrConversionInfo {
    pub fn new(format: vk::Format) -> Self {
        YcbcrConversionInfo {
            format,
            external_format: 0,
            model: vk::SamplerYcbcrModelConversion::YCBCR_709,
            range: vk::SamplerYcbcrRange::ITU_NARROW,
            x_chroma_offset: vk::ChromaLocation::COSITED_EVEN,
            y_chroma_offset: vk::ChromaLocation::COSITED_EVEN,
            chroma_filter: vk::Filter::LINEAR,
            force_explicit_reconstruction: false,
        }
    }

    ///A conversion is only valid if either a format, or an external format is set.
    pub fn is_valid(&self) -> bool {
        self.format != vk::Format::UNDEFINED || self.external_format != 0
    }
}

pub struct YcbcrConversion {
    pub inner: vk::SamplerYcbcrConversion,
    pub info: YcbcrConversionInfo,
}

impl BackendObject for YcbcrConversion {
    const KIND: ResourceKind = ResourceKind::YcbcrConversion;
    fn destroy(self, factory: &dyn ResourceFactory) {
        factory.destroy_ycbcr_conversion(self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        assert!(YcbcrConversionInfo::new(vk::Format::G8_B8R8_2PLANE_420_UNORM).is_valid());

        let mut external = YcbcrConversionInfo::new(vk::Format::UNDEFINED);
        assert!(!external.is_valid());
        external.external_format = 42;
        assert!(external.is_valid());
    }
}
