//! superpixel tiles: 路径规则, 解码与缓存.
//!
//! stack 的每个切片在 X, Y 方向被切成边长 [`TILE_SIZE`] 的方块,
//! 每个 (行, 列, 切片) 对应一个 PNG 文件.

use crate::consts::TILE_SIZE;
use crate::{MappedStack, Point3d, Stack, StackError, StackResult, VoxelCoord};
use std::path::PathBuf;
use std::sync::Arc;

mod cache;
mod raster;

pub use cache::{NoTileCache, TileCache};
pub use raster::LabelTile;

/// 第 `row` 行, 第 `col` 列, 第 `slice` 个切片的 tile 相对于 stack 根目录的路径.
///
/// 切片编号小于 1000 时为 `tiles/1024/0/{row}/{col}/s/{slice:03}.png`,
/// 否则多一层按千分组的目录: `tiles/1024/0/{row}/{col}/s/{千位}/{slice}.png`.
pub fn tile_path(row: VoxelCoord, col: VoxelCoord, slice: VoxelCoord) -> String {
    if slice >= 1000 {
        let slice_dir = (slice / 1000) * 1000;
        format!("tiles/{TILE_SIZE}/0/{row}/{col}/s/{slice_dir}/{slice}.png")
    } else {
        format!("tiles/{TILE_SIZE}/0/{row}/{col}/s/{slice:03}.png")
    }
}

/// `pt` 所在 tile 的 (行, 列).
#[inline]
pub fn tile_row_col(pt: &Point3d) -> (VoxelCoord, VoxelCoord) {
    (pt.y / TILE_SIZE, pt.x / TILE_SIZE)
}

/// tile 读取部分
impl Stack {
    /// 读取并解码 `rel_path` 处的 tile.
    ///
    /// 先在 stack 自身目录查找, 找不到时再到 base stack 目录查找;
    /// 两处都没有时返回 [`StackError::TileNotFound`]. 解码结果经过
    /// tile 缓存, 以实际找到的 tile 文件路径为键, 因此多个 stack 可以共用
    /// 同一个缓存.
    pub fn read_label_tile(&self, rel_path: &str) -> StackResult<Arc<LabelTile>> {
        let path = self.locate_tile(rel_path)?;
        let key = path.to_string_lossy();
        if let Some(tile) = self.tile_cache.get(&key) {
            return Ok(tile);
        }
        let format = self.tiles_metadata()?.format;
        let tile = Arc::new(LabelTile::open(&path, format)?);
        self.tile_cache.put(&key, Arc::clone(&tile));
        Ok(tile)
    }

    /// 找到 `rel_path` 对应的实际 tile 文件.
    fn locate_tile(&self, rel_path: &str) -> StackResult<PathBuf> {
        let own = self.dir().join(rel_path);
        if own.is_file() {
            return Ok(own);
        }
        if let Some(base) = self.base() {
            let fallback = base.dir().join(rel_path);
            if fallback.is_file() {
                return Ok(fallback);
            }
        }
        Err(StackError::TileNotFound {
            rel_path: rel_path.to_owned(),
            stack: self.dir().to_owned(),
            base: self.base().map(|b| b.dir().to_owned()),
        })
    }
}
