use std::any::Any;

use grit::resources::{SamplerState, WrapMode};
use grit_rtg::ProxyKey;
use smallvec::SmallVec;

use crate::{Color, Matrix, OptimizationFlags, RequiredFeatures};

///Words identifying the shader code a processor tree generates.
pub type ProcessorKey = SmallVec<[u32; 8]>;

///A texture an effect samples, together with the sampler state it is sampled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSampler {
    pub proxy: ProxyKey,
    pub state: SamplerState,
}

impl TextureSampler {
    fn key_bits(&self) -> u32 {
        let wrap = |w: WrapMode| w as u32;
        (self.state.filter as u32) | (wrap(self.state.wrap_x) << 2) | (wrap(self.state.wrap_y) << 4)
    }
}

///Collects the processor key of a tree.
#[derive(Debug, Default)]
pub struct KeyBuilder {
    words: ProcessorKey,
}

impl KeyBuilder {
    pub fn add32(&mut self, word: u32) {
        self.words.push(word);
    }

    pub(crate) fn add_sampler(&mut self, sampler: &TextureSampler) {
        self.add32(sampler.key_bits());
    }

    pub fn finish(self) -> ProcessorKey {
        self.words
    }
}

///The behaviour of a single node in a [FpTree](crate::FpTree).
///
/// Children are not owned by the effect, they are registered on the tree. Callbacks that depend on children get the
/// children's results passed in the order of registration.
pub trait Effect: Any + Send + Sync {
    fn name(&self) -> &'static str;

    ///Identifies the effect's shader code. Must be unique per effect type.
    fn class_id(&self) -> u32;

    fn as_any(&self) -> &dyn Any;

    fn clone_effect(&self) -> Box<dyn Effect>;

    ///Compares the effect specific state. `other` is of any effect type, use [shallow_eq] to compare values of the same type.
    fn on_is_equal(&self, other: &dyn Effect) -> bool;

    fn samplers(&self) -> &[TextureSampler] {
        &[]
    }

    fn coord_transforms(&self) -> &[Matrix] {
        &[]
    }

    ///True if the effect's own code reads the sample coordinates.
    fn uses_sample_coords(&self) -> bool {
        false
    }

    fn required_features(&self) -> RequiredFeatures {
        RequiredFeatures::empty()
    }

    fn optimization_flags(&self, _children: &[OptimizationFlags]) -> OptimizationFlags {
        OptimizationFlags::empty()
    }

    ///Computes the output for a constant `input`. `child` evaluates the child at the given index for some input. Only called
    /// if [optimization_flags](Effect::optimization_flags) reports a constant output.
    fn constant_output(
        &self,
        _input: Color,
        _child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        None
    }

    ///Adds effect specific key words that change the generated code.
    fn add_to_key(&self, _key: &mut KeyBuilder) {}
}

///Shallow equality for effects that implement [PartialEq].
pub fn shallow_eq<T: Effect + PartialEq>(this: &T, other: &dyn Effect) -> bool {
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| other == this)
}
