///Row major 3x3 matrix mapping coordinates of a parent to the coordinates a child is sampled at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 9]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    pub fn scale(sx: f32, sy: f32) -> Self {
        Matrix([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn has_perspective(&self) -> bool {
        self.0[6] != 0.0 || self.0[7] != 0.0 || self.0[8] != 1.0
    }

    pub fn map_point(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let m = &self.0;
        let w = m[6] * x + m[7] * y + m[8];
        [
            (m[0] * x + m[1] * y + m[2]) / w,
            (m[3] * x + m[4] * y + m[5]) / w,
        ]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatrixKind {
    ///The child is sampled at the parent's coordinates.
    #[default]
    None,
    ///The matrix is known before the shader runs, either as constant or as uniform.
    ConstantOrUniform,
    ///The matrix is computed by the parent's shader code.
    Variable,
}

///How a parent transforms the coordinates a child is sampled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SampleMatrix {
    pub kind: MatrixKind,
    pub has_perspective: bool,
}

impl SampleMatrix {
    pub const NONE: SampleMatrix = SampleMatrix {
        kind: MatrixKind::None,
        has_perspective: false,
    };

    pub fn constant_or_uniform(has_perspective: bool) -> Self {
        SampleMatrix {
            kind: MatrixKind::ConstantOrUniform,
            has_perspective,
        }
    }

    pub fn variable(has_perspective: bool) -> Self {
        SampleMatrix {
            kind: MatrixKind::Variable,
            has_perspective,
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == MatrixKind::None
    }

    pub(crate) fn key_bits(&self) -> u32 {
        let kind = match self.kind {
            MatrixKind::None => 0,
            MatrixKind::ConstantOrUniform => 1,
            MatrixKind::Variable => 2,
        };
        kind | ((self.has_perspective as u32) << 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix() {
        assert!(Matrix::default().is_identity());
        assert!(!Matrix::scale(2.0, 2.0).has_perspective());
        assert_eq!(Matrix::translate(1.0, 2.0).map_point([1.0, 1.0]), [2.0, 3.0]);

        let mut persp = Matrix::IDENTITY;
        persp.0[6] = 0.5;
        assert!(persp.has_perspective());
    }
}
