//! Raveler stack 目录.
//!
//! 一个 stack 是一个目录, 包含 superpixel tiles, tiles 元信息,
//! 以及 superpixel -> segment -> body 两张文本表. 导出 (exported) stack
//! 往往只含有重新导出的文本表, tiles 和元信息则从其 base stack 读取.

use crate::consts::filenames::{SUPERPIXEL_BOUNDS, TILES_METADATA};
use crate::tiles::{NoTileCache, TileCache};
use crate::{BodyId, BodySet, StackResult};
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod bounds;
mod metadata;
mod remap;

pub use bounds::{read_superpixel_bounds, superpixel_drift, SuperpixelBound, SuperpixelBoundsMap};
pub use metadata::{SuperpixelFormat, TilesMetadata};
pub use remap::{BodyToSuperpixelsMap, Superpixel, SuperpixelToBodyMap};

/// 可以提供 superpixel -> body 表的 stack.
///
/// 重叠匹配只依赖该能力.
pub trait MappedStack {
    /// stack 根目录.
    fn dir(&self) -> &Path;

    /// 获取合成后的 superpixel -> body 表, 必要时从磁盘加载.
    fn superpixel_to_body_map(&self) -> StackResult<&SuperpixelToBodyMap>;

    /// 查询单个 superpixel 所属 body. 未命中时返回 `0`.
    #[inline]
    fn superpixel_to_body(&self, sp: &Superpixel) -> StackResult<BodyId> {
        Ok(self.superpixel_to_body_map()?.body_of(sp))
    }

    /// 为 `bodies` 中的 body 构建 body -> superpixels 反向索引.
    ///
    /// 每次调用都会重新遍历全表, 结果不缓存.
    #[inline]
    fn body_to_superpixels_map(&self, bodies: &BodySet) -> StackResult<BodyToSuperpixelsMap> {
        Ok(self.superpixel_to_body_map()?.body_to_superpixels(bodies))
    }

    /// superpixel 包围盒表路径.
    #[inline]
    fn superpixel_bounds_path(&self) -> PathBuf {
        self.dir().join(SUPERPIXEL_BOUNDS)
    }
}

/// stack 句柄.
///
/// 持有自身的表缓存: 文本表和 tiles 元信息在第一次使用时加载,
/// 之后在句柄的生命周期内保持不变.
pub struct Stack {
    dir: PathBuf,
    base: Option<Box<Stack>>,
    sp_to_body: OnceCell<SuperpixelToBodyMap>,
    metadata: OnceCell<TilesMetadata>,
    load_count: AtomicUsize,
    pub(crate) tile_cache: Arc<dyn TileCache>,
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("dir", &self.dir)
            .field("base", &self.base)
            .field("map_loaded", &self.map_loaded())
            .finish()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir.display())
    }
}

impl MappedStack for Stack {
    #[inline]
    fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    fn superpixel_to_body_map(&self) -> StackResult<&SuperpixelToBodyMap> {
        self.ensure_loaded()
    }
}

impl Stack {
    /// 自带 tiles 和元信息的 base stack.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            base: None,
            sp_to_body: OnceCell::new(),
            metadata: OnceCell::new(),
            load_count: AtomicUsize::new(0),
            tile_cache: Arc::new(NoTileCache),
        }
    }

    /// 导出 stack: 自身目录只需包含文本表, tiles 缺失时从 `base_dir` 读取,
    /// 元信息总是从 `base_dir` 读取.
    pub fn with_base<P: AsRef<Path>, Q: AsRef<Path>>(dir: P, base_dir: Q) -> Self {
        let mut ans = Self::new(dir);
        ans.base = Some(Box::new(Self::new(base_dir)));
        ans
    }

    /// 替换 tile 缓存. 缓存只影响速度, 不影响结果.
    pub fn with_tile_cache(mut self, cache: Arc<dyn TileCache>) -> Self {
        self.tile_cache = cache;
        self
    }

    /// base stack (若有).
    #[inline]
    pub fn base(&self) -> Option<&Stack> {
        self.base.as_deref()
    }

    /// 确保 superpixel -> body 表已经加载, 并返回它.
    ///
    /// 幂等: 加载成功后再次调用不会访问磁盘. 加载失败不会被缓存.
    pub fn ensure_loaded(&self) -> StackResult<&SuperpixelToBodyMap> {
        self.sp_to_body.get_or_try_init(|| {
            self.load_count.fetch_add(1, Ordering::Relaxed);
            SuperpixelToBodyMap::read_txt_maps(&self.dir)
        })
    }

    /// 表是否已加载?
    #[inline]
    pub fn map_loaded(&self) -> bool {
        self.sp_to_body.get().is_some()
    }

    /// 从磁盘加载文本表的次数.
    #[inline]
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::Relaxed)
    }

    /// 丢弃已加载的表. 下次使用时会重新加载.
    #[inline]
    pub fn clear_txt_maps(&mut self) {
        self.sp_to_body.take();
    }

    /// 获取 tiles 元信息 (体素范围与 superpixel 编码).
    ///
    /// 有 base stack 时读取 base stack 的元信息.
    pub fn tiles_metadata(&self) -> StackResult<&TilesMetadata> {
        if let Some(base) = self.base() {
            return base.tiles_metadata();
        }
        self.metadata.get_or_try_init(|| {
            let path = TILES_METADATA
                .iter()
                .fold(self.dir.clone(), |p, part| p.join(part));
            TilesMetadata::read(path)
        })
    }
}
