mod const_color;
pub use const_color::{ConstColor, InputMode};

mod texture;
pub use texture::TextureEffect;

mod swizzle;
pub use swizzle::{Channel, Swizzle, SwizzleEffect};

mod premul;
pub use premul::PremulEffect;

mod series;
pub use series::{SeriesEffect, run_in_series};

mod matrix;
pub use matrix::MatrixEffect;

mod explicit_sample;
pub use explicit_sample::ExplicitSampleEffect;
