mod point;
mod ring;

pub use point::{Bounds3d, Point2d, Point3d};
pub use ring::RingPixels;
