use std::any::Any;

use crate::{
    Color, Effect, FpId, FpTree, KeyBuilder, OptimizationFlags, SampleMatrix, shallow_eq,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
    Zero,
    One,
}

impl Channel {
    fn select(self, c: &Color) -> f32 {
        match self {
            Channel::R => c.r,
            Channel::G => c.g,
            Channel::B => c.b,
            Channel::A => c.a,
            Channel::Zero => 0.0,
            Channel::One => 1.0,
        }
    }
}

///Source channel for each output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub [Channel; 4]);

impl Swizzle {
    pub const RGBA: Swizzle = Swizzle([Channel::R, Channel::G, Channel::B, Channel::A]);
    pub const BGRA: Swizzle = Swizzle([Channel::B, Channel::G, Channel::R, Channel::A]);
    pub const AAAA: Swizzle = Swizzle([Channel::A, Channel::A, Channel::A, Channel::A]);
    pub const RGB1: Swizzle = Swizzle([Channel::R, Channel::G, Channel::B, Channel::One]);

    pub fn apply(&self, c: Color) -> Color {
        Color::new(
            self.0[0].select(&c),
            self.0[1].select(&c),
            self.0[2].select(&c),
            self.0[3].select(&c),
        )
    }

    fn key_bits(&self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, c)| acc | ((*c as u32) << (i * 3)))
    }
}

///Swizzles the output of its child.
#[derive(Debug, Clone, PartialEq)]
pub struct SwizzleEffect {
    pub swizzle: Swizzle,
}

impl SwizzleEffect {
    ///Wraps `child`. Returns `child` itself for the identity swizzle.
    pub fn make(tree: &mut FpTree, child: FpId, swizzle: Swizzle) -> FpId {
        if swizzle == Swizzle::RGBA {
            return child;
        }
        let id = tree.add(Box::new(SwizzleEffect { swizzle }));
        tree.register_child(id, child, SampleMatrix::NONE);
        id
    }
}

impl Effect for SwizzleEffect {
    fn name(&self) -> &'static str {
        "SwizzleEffect"
    }

    fn class_id(&self) -> u32 {
        3
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
        let child = children.first().copied().unwrap_or(OptimizationFlags::empty());
        let mut flags = child & OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT;
        if matches!(self.swizzle.0[3], Channel::A | Channel::One) {
            flags |= child & OptimizationFlags::PRESERVES_OPAQUE_INPUT;
        }
        flags
    }

    fn constant_output(
        &self,
        input: Color,
        child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        child(0, input).map(|c| self.swizzle.apply(c))
    }

    fn add_to_key(&self, key: &mut KeyBuilder) {
        key.add32(self.swizzle.key_bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ConstColor, InputMode};

    #[test]
    fn identity_is_elided() {
        let mut tree = FpTree::new();
        let c = ConstColor::make(&mut tree, Color::new(0.1, 0.2, 0.3, 1.0), InputMode::Ignore);
        assert_eq!(SwizzleEffect::make(&mut tree, c, Swizzle::RGBA), c);
        assert_eq!(tree.len(), 1);

        let s = SwizzleEffect::make(&mut tree, c, Swizzle::BGRA);
        assert_eq!(
            tree.constant_output_for_constant_input(s, Color::WHITE),
            Some(Color::new(0.3, 0.2, 0.1, 1.0))
        );
        assert!(
            tree.optimization_flags(s)
                .contains(OptimizationFlags::PRESERVES_OPAQUE_INPUT)
        );
    }
}
