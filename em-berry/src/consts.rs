//! 通用常量.

use crate::BodyId;

/// tile 在 X, Y 方向上的边长 (体素个数).
pub const TILE_SIZE: i64 = 1024;

/// 代表 "无 body" 的保留值.
pub const NO_BODY: BodyId = 0;

/// 最近 body 搜索的半径上限 (不含). 实际搜索半径为 `0..NEAREST_BODY_RADIUS_CAP`.
pub const NEAREST_BODY_RADIUS_CAP: i64 = 6;

/// 两个 stack 之间 superpixel 体素变化比例的上限. 超过该值时重叠匹配不可信.
pub const SUPERPIXEL_DRIFT_THRESHOLD: f64 = 0.10;

/// stack 目录下的文件名.
pub mod filenames {
    /// superpixel -> segment 表.
    pub const SUPERPIXEL_TO_SEGMENT: &str = "superpixel_to_segment_map.txt";

    /// segment -> body 表.
    pub const SEGMENT_TO_BODY: &str = "segment_to_body_map.txt";

    /// superpixel 包围盒与体积表.
    pub const SUPERPIXEL_BOUNDS: &str = "superpixel_bounds.txt";

    /// tiles 元信息, 相对 stack 根目录.
    pub const TILES_METADATA: [&str; 2] = ["tiles", "metadata.txt"];
}
