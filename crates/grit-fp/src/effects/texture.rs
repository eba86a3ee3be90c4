use std::any::Any;

use grit::resources::SamplerState;
use grit_rtg::ProxyKey;

use crate::{Effect, FpId, FpTree, Matrix, OptimizationFlags, TextureSampler, shallow_eq};

///Samples a texture at the local coordinates transformed by `matrix`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureEffect {
    sampler: [TextureSampler; 1],
    transform: [Matrix; 1],
}

impl TextureEffect {
    pub fn new(proxy: ProxyKey, state: SamplerState, matrix: Matrix) -> Self {
        TextureEffect {
            sampler: [TextureSampler { proxy, state }],
            transform: [matrix],
        }
    }

    pub fn make(tree: &mut FpTree, proxy: ProxyKey, state: SamplerState, matrix: Matrix) -> FpId {
        tree.add(Box::new(Self::new(proxy, state, matrix)))
    }

    pub fn proxy(&self) -> ProxyKey {
        self.sampler[0].proxy
    }

    pub fn matrix(&self) -> Matrix {
        self.transform[0]
    }
}

impl Effect for TextureEffect {
    fn name(&self) -> &'static str {
        "TextureEffect"
    }

    fn class_id(&self) -> u32 {
        2
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_effect(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }

    //Sampler and transform are compared by the tree already.
    fn on_is_equal(&self, other: &dyn Effect) -> bool {
        shallow_eq(self, other)
    }

    fn samplers(&self) -> &[TextureSampler] {
        &self.sampler
    }

    fn coord_transforms(&self) -> &[Matrix] {
        &self.transform
    }

    fn uses_sample_coords(&self) -> bool {
        true
    }

    fn optimization_flags(&self, _children: &[OptimizationFlags]) -> OptimizationFlags {
        OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA
    }
}
