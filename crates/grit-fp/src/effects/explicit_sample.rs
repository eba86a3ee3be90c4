use std::any::Any;

use crate::{Color, Effect, FpId, FpTree, KeyBuilder, OptimizationFlags, shallow_eq};

///Samples its child at its own coordinates shifted by `offset`, computed in the shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitSampleEffect {
    pub offset: [f32; 2],
}

impl ExplicitSampleEffect {
    pub fn new(offset: [f32; 2]) -> Self {
        ExplicitSampleEffect { offset }
    }

    pub fn make(tree: &mut FpTree, child: FpId, offset: [f32; 2]) -> FpId {
        let id = tree.add(Box::new(Self::new(offset)));
        tree.register_explicitly_sampled_child(id, child);
        id
    }
}

impl Effect for ExplicitSampleEffect {
    fn name(&self) -> &'static str {
        "ExplicitSampleEffect"
    }

    fn class_id(&self) -> u32 {
        7
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_effect(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }

    fn on_is_equal(&self, other: &dyn Effect) -> bool {
        shallow_eq(self, other)
    }

    fn uses_sample_coords(&self) -> bool {
        true
    }

    fn optimization_flags(&self, children: &[OptimizationFlags]) -> OptimizationFlags {
        children.first().copied().unwrap_or(OptimizationFlags::empty())
            & (OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT | OptimizationFlags::PRESERVES_OPAQUE_INPUT)
    }

    fn constant_output(
        &self,
        input: Color,
        child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        child(0, input)
    }

    //Whether the offset is zero changes the generated code.
    fn add_to_key(&self, key: &mut KeyBuilder) {
        key.add32((self.offset == [0.0, 0.0]) as u32);
    }
}
