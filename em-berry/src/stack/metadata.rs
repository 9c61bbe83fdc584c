//! `tiles/metadata.txt` 的解析.

use crate::{Bounds3d, Point3d, StackError, StackResult, VoxelCoord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// tile 像素中 superpixel label 的编码方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SuperpixelFormat {
    /// 元信息中未声明. 按 16-bit 灰度处理.
    #[default]
    None,

    /// 16-bit 灰度, label 即灰度值. 元信息取值为 `I`.
    Bits16,

    /// 24-bit packed RGB, label = `R | G << 8 | B << 16`. 元信息取值为 `RGBA`.
    Bits24,
}

impl SuperpixelFormat {
    /// 是否为 24-bit 编码?
    #[inline]
    pub fn is_24_bits(&self) -> bool {
        matches!(self, Self::Bits24)
    }
}

/// stack 的 tiles 元信息: 体素范围和 superpixel 编码.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilesMetadata {
    /// stack 的体素范围. x, y 从 0 开始.
    pub bounds: Bounds3d,

    /// superpixel 编码.
    pub format: SuperpixelFormat,
}

impl TilesMetadata {
    /// 读取元信息文件 `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> StackResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(StackError::io(path))?;
        Self::parse(BufReader::new(file), path)
    }

    /// 从 `reader` 解析 `key=value` 形式的元信息. `path` 仅用于报错.
    ///
    /// 必须提供 `width`, `height`, `zmin`, `zmax`; `superpixel-format`
    /// 可选, 取值为 `RGBA` 或 `I`. 不含 `=` 的行和未知键会被忽略.
    pub fn parse<R: BufRead>(reader: R, path: &Path) -> StackResult<Self> {
        let metadata_err = |reason: String| StackError::Metadata {
            path: path.to_owned(),
            reason,
        };

        let mut width = None;
        let mut height = None;
        let mut zmin = None;
        let mut zmax = None;
        let mut format = SuperpixelFormat::None;

        for line in reader.lines() {
            let line = line.map_err(StackError::io(path))?;
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            let number = || {
                value
                    .parse::<VoxelCoord>()
                    .map_err(|_| metadata_err(format!("invalid {key} value `{value}`")))
            };
            match key {
                "width" => width = Some(number()?),
                "height" => height = Some(number()?),
                "zmin" => zmin = Some(number()?),
                "zmax" => zmax = Some(number()?),
                "superpixel-format" => {
                    format = match value {
                        "RGBA" => SuperpixelFormat::Bits24,
                        "I" => SuperpixelFormat::Bits16,
                        _ => {
                            return Err(StackError::UnknownSuperpixelFormat {
                                path: path.to_owned(),
                                value: value.to_owned(),
                            })
                        }
                    }
                }
                _ => {}
            }
        }

        let (Some(width), Some(height), Some(zmin), Some(zmax)) = (width, height, zmin, zmax)
        else {
            let missing: Vec<&str> = [
                ("width", width),
                ("height", height),
                ("zmin", zmin),
                ("zmax", zmax),
            ]
            .into_iter()
            .filter_map(|(k, v)| v.is_none().then_some(k))
            .collect();
            return Err(metadata_err(format!("{} not provided", missing.join(", "))));
        };

        Ok(Self {
            bounds: Bounds3d::new(
                Point3d::new(0, 0, zmin),
                Point3d::new(width - 1, height - 1, zmax),
            ),
            format,
        })
    }
}
