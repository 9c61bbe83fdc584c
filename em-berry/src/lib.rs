#![warn(missing_docs)]

//! 核心库. 提供 Raveler 格式电镜重建 stack 中 superpixel -> body
//! 的解析, 以及两个独立分割的 stack 之间的 body 对应关系计算.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 只处理 Raveler 风格的 stack 目录 (tiles + 两张 remap 文本表),
//!   其它格式需要先转换成该布局.
//! 2. 配置/环境错误 (缺失 tile, 表格解析失败, 坐标越界等) 以 [`StackError`]
//!   返回, 调用方应当终止整个批处理; 数据质量问题 (落在 zero superpixel 上,
//!   找不到重叠 body 等) 通过返回值中的 body `0` 表示, 并输出 `warn!` 日志.
//!
//! # 功能
//!
//! ### 坐标与 ring 枚举 ✅
//!
//! 实现位于 `em-berry/src/geom`.
//!
//! ### tile 路径, 解码与缓存接口 ✅
//!
//! 16-bit 灰度和 24-bit packed RGB 两种 superpixel 编码.
//! 实现位于 `em-berry/src/tiles`.
//!
//! ### superpixel -> segment -> body 表的加载与写出 ✅
//!
//! 两张表并行读取 (或写出), 读取完毕后再合成.
//! 实现位于 `em-berry/src/stack/remap.rs`.
//!
//! ### 坐标 -> body 解析, 及最近非排除 body 搜索 ✅
//!
//! 实现位于 `em-berry/src/locate.rs`.
//!
//! ### 跨 stack 的最大重叠匹配, 及 superpixel 漂移检查 ✅
//!
//! 实现位于 `em-berry/src/overlap.rs` 和 `em-berry/src/stack/bounds.rs`.
//!
//! # 关于 body `0`
//!
//! body `0` 同时代表 "背景 / 未分割像素" 和 "查表未命中". 为与上游数据兼容,
//! 这里保留了该重载语义: 调用方需要知道 `0` 是哪一步产生的才能正确解读它.

use std::collections::HashSet;

/// 体素在某一轴上的整数坐标.
///
/// 实际数据非负, 但 ring 搜索时的中间值可能暂时为负, 因此使用有符号类型.
pub type VoxelCoord = i64;

/// 重建出的 body (神经元片段) 标识. `0` 保留, 代表 "无 body".
pub type BodyId = i64;

/// body 集合.
pub type BodySet = HashSet<BodyId>;

pub mod consts;

mod error;

pub use error::{StackError, StackResult};

/// 二维/三维坐标与包围盒.
pub mod geom;

pub use geom::{Bounds3d, Point2d, Point3d};

pub mod tiles;

pub use tiles::{LabelTile, NoTileCache, TileCache};

pub mod stack;

pub use stack::{
    MappedStack, Stack, Superpixel, SuperpixelBound, SuperpixelBoundsMap, SuperpixelFormat,
    SuperpixelToBodyMap, TilesMetadata,
};

mod locate;

pub use locate::NearestBody;

pub mod overlap;

pub use overlap::{BestOverlap, BestOverlapMap, OverlapMatching};

pub mod prelude;

#[cfg(test)]
pub(crate) mod fixture;
