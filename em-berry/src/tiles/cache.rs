use super::LabelTile;
use std::sync::Arc;

/// 已解码 tile 的缓存接口, 以 tile 文件的实际路径为键.
///
/// 缓存只是性能优化: 任何实现 (包括什么都不存的 [`NoTileCache`])
/// 都不能改变解析结果. 方法只接受 `&self`, 实现需要自行保证并发访问时
/// 淘汰记录的读-改-写是串行的.
pub trait TileCache: Send + Sync {
    /// 取出 `key` 对应的 tile, 并视为一次访问.
    fn get(&self, key: &str) -> Option<Arc<LabelTile>>;

    /// 存入 `key` 对应的 tile. 容量已满时由实现决定淘汰哪一项.
    fn put(&self, key: &str, tile: Arc<LabelTile>);
}

/// 不缓存任何 tile.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoTileCache;

impl TileCache for NoTileCache {
    #[inline]
    fn get(&self, _key: &str) -> Option<Arc<LabelTile>> {
        None
    }

    #[inline]
    fn put(&self, _key: &str, _tile: Arc<LabelTile>) {}
}
