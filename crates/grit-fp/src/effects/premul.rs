use std::any::Any;

use crate::{Color, Effect, FpId, FpTree, OptimizationFlags, SampleMatrix, shallow_eq};

///Premultiplies the input color and modulates the output of its child by it.
#[derive(Debug, Clone, PartialEq)]
pub struct PremulEffect;

impl PremulEffect {
    pub fn make(tree: &mut FpTree, child: FpId) -> FpId {
        let id = tree.add(Box::new(PremulEffect));
        tree.register_child(id, child, SampleMatrix::NONE);
        id
    }
}

impl Effect for PremulEffect {
    fn name(&self) -> &'static str {
        "PremulEffect"
    }

    fn class_id(&self) -> u32 {
        4
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

    fn optimization_flags(&self, children: &[OptimizationFlags]) -> OptimizationFlags {
        children.first().copied().unwrap_or(OptimizationFlags::empty())
            & (OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT | OptimizationFlags::PRESERVES_OPAQUE_INPUT)
    }

    fn constant_output(
        &self,
        input: Color,
        child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        child(0, input).map(|c| c * input.premul())
    }
}
