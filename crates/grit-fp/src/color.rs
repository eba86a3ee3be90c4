use std::ops::Mul;

///Straight or premultiplied RGBA color in linear float components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }

    pub fn premul(&self) -> Self {
        Color::new(self.r * self.a, self.g * self.a, self.b * self.a, self.a)
    }

    pub fn mul_alpha(&self, alpha: f32) -> Self {
        Color::new(self.r * alpha, self.g * alpha, self.b * alpha, self.a * alpha)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

impl Mul for Color {
    type Output = Color;
    fn mul(self, rhs: Self) -> Self::Output {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premul() {
        let c = Color::new(1.0, 0.5, 0.0, 0.5).premul();
        assert_eq!(c, Color::new(0.5, 0.25, 0.0, 0.5));
        assert!(!c.is_opaque());
        assert_eq!(Color::WHITE * c, c);
    }
}
