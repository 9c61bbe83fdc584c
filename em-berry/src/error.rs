//! 运行时错误.

use crate::{Bounds3d, Point3d, SuperpixelFormat};
use std::fmt;
use std::path::PathBuf;

/// stack 数据不一致或无法读取时的错误.
///
/// 这些错误都代表调用方提供的 stack 数据/环境有问题, 不可重试,
/// 上层批处理应当直接终止.
#[derive(Debug)]
pub enum StackError {
    /// 底层 I/O 错误.
    Io {
        /// 出错的文件.
        path: PathBuf,

        /// 原始错误.
        source: std::io::Error,
    },

    /// 在 stack 及其 base stack 中都找不到 tile 文件.
    TileNotFound {
        /// tile 相对路径.
        rel_path: String,

        /// 首先查找的 stack 目录.
        stack: PathBuf,

        /// base stack 目录 (若有).
        base: Option<PathBuf>,
    },

    /// tile 图像解码失败.
    TileDecode {
        /// tile 文件.
        path: PathBuf,

        /// 原始错误.
        source: image::ImageError,
    },

    /// tile 像素布局与 stack 声明的 superpixel 格式不符.
    UnexpectedPixelLayout {
        /// tile 文件.
        path: PathBuf,

        /// stack 声明的格式.
        format: SuperpixelFormat,
    },

    /// 文本表中的数据行无法解析. `line_num` 从 1 开始.
    ParseLine {
        /// 表文件.
        path: PathBuf,

        /// 行号.
        line_num: usize,

        /// 原始行内容.
        line: String,
    },

    /// tiles 元信息缺项或取值非法.
    Metadata {
        /// 元信息文件.
        path: PathBuf,

        /// 具体原因.
        reason: String,
    },

    /// 未知的 `superpixel-format` 取值.
    UnknownSuperpixelFormat {
        /// 元信息文件.
        path: PathBuf,

        /// 读到的取值.
        value: String,
    },

    /// 坐标落在 stack 声明的范围之外.
    OutOfBounds {
        /// 查询坐标.
        pt: Point3d,

        /// stack 范围.
        bounds: Bounds3d,
    },

    /// 两个 stack 之间的 superpixel 体素变化过大, 重叠匹配不可信.
    SuperpixelDrift {
        /// 变化比例, 取值 `[0, +inf)`.
        drift: f64,

        /// 参与统计的体素总数.
        voxels_total: u64,
    },
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error on {}: {source}", path.display()),
            Self::TileNotFound {
                rel_path,
                stack,
                base: Some(base),
            } => write!(
                f,
                "could not find superpixel tile ({rel_path}) in stack ({}) or its base ({})",
                stack.display(),
                base.display()
            ),
            Self::TileNotFound {
                rel_path,
                stack,
                base: None,
            } => write!(
                f,
                "could not find superpixel tile ({rel_path}) in stack ({})",
                stack.display()
            ),
            Self::TileDecode { path, source } => {
                write!(f, "error decoding {}: {source}", path.display())
            }
            Self::UnexpectedPixelLayout { path, format } => write!(
                f,
                "tile {} does not match superpixel format {format:?}",
                path.display()
            ),
            Self::ParseLine {
                path,
                line_num,
                line,
            } => write!(
                f,
                "cannot parse line {line_num} in {}: {:?}",
                path.display(),
                line
            ),
            Self::Metadata { path, reason } => {
                write!(f, "error in reading {}: {reason}", path.display())
            }
            Self::UnknownSuperpixelFormat { path, value } => write!(
                f,
                "illegal superpixel format ({value}): {}",
                path.display()
            ),
            Self::OutOfBounds { pt, bounds } => {
                write!(f, "point falls outside stack boundaries: {pt} > {bounds}")
            }
            Self::SuperpixelDrift {
                drift,
                voxels_total,
            } => write!(
                f,
                "more than 10% voxel difference in superpixels between stacks: {:.2}% of total {voxels_total} voxels",
                drift * 100.0
            ),
        }
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::TileDecode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl StackError {
    /// 构造 `Io` 错误的简便方法, 便于 `map_err`.
    #[inline]
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// stack 操作结果.
pub type StackResult<T> = Result<T, StackError>;
