use std::any::Any;

use crate::{Color, Effect, FpId, FpTree, Matrix, OptimizationFlags, SampleMatrix, shallow_eq};

///Samples its child at coordinates transformed by a uniform matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixEffect {
    pub matrix: Matrix,
}

impl MatrixEffect {
    ///Wraps `child`. Returns `child` itself for the identity matrix.
    pub fn make(tree: &mut FpTree, matrix: Matrix, child: FpId) -> FpId {
        if matrix.is_identity() {
            return child;
        }
        let id = tree.add(Box::new(MatrixEffect { matrix }));
        tree.register_child(
            id,
            child,
            SampleMatrix::constant_or_uniform(matrix.has_perspective()),
        );
        id
    }
}

impl Effect for MatrixEffect {
    fn name(&self) -> &'static str {
        "MatrixEffect"
    }

    fn class_id(&self) -> u32 {
        6
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
    }

    fn constant_output(
        &self,
        input: Color,
        child: &mut dyn FnMut(usize, Color) -> Option<Color>,
    ) -> Option<Color> {
        child(0, input)
    }
}
