use std::any::Any;

use crate::{Color, Effect, FpId, FpTree, KeyBuilder, OptimizationFlags, shallow_eq};

///How [ConstColor] combines its color with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputMode {
    Ignore,
    ModulateRgba,
    ModulateA,
}

///Outputs a constant color, optionally modulated by the input. The color is a uniform, only the mode is part of the key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstColor {
    pub color: Color,
    pub mode: InputMode,
}

impl ConstColor {
    pub fn new(color: Color, mode: InputMode) -> Self {
        ConstColor { color, mode }
    }

    pub fn make(tree: &mut FpTree, color: Color, mode: InputMode) -> FpId {
        tree.add(Box::new(Self::new(color, mode)))
    }
}

impl Effect for ConstColor {
    fn name(&self) -> &'static str {
        "ConstColor"
    }

    fn class_id(&self) -> u32 {
        1
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

    fn optimization_flags(&self, _children: &[OptimizationFlags]) -> OptimizationFlags {
        let mut flags = OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT;
        if self.color.is_opaque() {
            flags |= OptimizationFlags::PRESERVES_OPAQUE_INPUT;
        }
        if self.mode != InputMode::Ignore {
            flags |= OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA;
        }
        flags
    }

    fn constant_output(
        &self,
        input: Color,
        _child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        Some(match self.mode {
            InputMode::Ignore => self.color,
            InputMode::ModulateRgba => self.color * input,
            InputMode::ModulateA => self.color.mul_alpha(input.a),
        })
    }

    fn add_to_key(&self, key: &mut KeyBuilder) {
        key.add32(self.mode as u32);
    }
}
