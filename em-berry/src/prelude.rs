//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{BodyId, BodySet, VoxelCoord};

pub use crate::geom::{Bounds3d, Point2d, Point3d};

pub use crate::stack::{
    MappedStack, Stack, Superpixel, SuperpixelFormat, SuperpixelToBodyMap, TilesMetadata,
};
pub use crate::tiles::{LabelTile, NoTileCache, TileCache};

pub use crate::consts::{NEAREST_BODY_RADIUS_CAP, NO_BODY, SUPERPIXEL_DRIFT_THRESHOLD, TILE_SIZE};
pub use crate::NearestBody;

pub use crate::overlap::{self, match_bodies, BestOverlap, OverlapMatching};

pub use crate::{StackError, StackResult};
