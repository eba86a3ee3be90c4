use std::any::Any;

use crate::{Color, Effect, FpId, FpTree, OptimizationFlags, SampleMatrix, shallow_eq};

///Feeds the output of each child into the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEffect {
    count: usize,
}

///Chains `fps` so that each one gets the previous output as input. Returns `None` for an empty list, and the single
/// processor itself if there is only one.
pub fn run_in_series(tree: &mut FpTree, fps: &[FpId]) -> Option<FpId> {
    match fps {
        [] => None,
        [single] => Some(*single),
        _ => {
            let id = tree.add(Box::new(SeriesEffect { count: fps.len() }));
            for fp in fps {
                tree.register_child(id, *fp, SampleMatrix::NONE);
            }
            Some(id)
        }
    }
}

impl Effect for SeriesEffect {
    fn name(&self) -> &'static str {
        "Series"
    }

    fn class_id(&self) -> u32 {
        5
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
        children
            .iter()
            .fold(OptimizationFlags::all(), |acc, child| acc & *child)
    }

    fn constant_output(
        &self,
        input: Color,
        child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        (0..self.count).try_fold(input, |color, i| child(i, color))
    }
}
