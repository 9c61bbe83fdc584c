use crate::{StackError, StackResult, SuperpixelFormat};
use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;

/// 解码后的 superpixel tile. 每个像素保存该像素的 superpixel label.
///
/// 按 (高, 宽) 索引, 第 0 行是图像最上方一行.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelTile {
    data: Array2<u32>,
}

impl LabelTile {
    /// 从 (高, 宽) 排列的 label 直接创建.
    #[inline]
    pub fn from_array(data: Array2<u32>) -> Self {
        Self { data }
    }

    /// 打开并解码 `path` 处的 tile 图像.
    pub fn open<P: AsRef<Path>>(path: P, format: SuperpixelFormat) -> StackResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| StackError::TileDecode {
            path: path.to_owned(),
            source,
        })?;
        Self::from_image(&img, format).ok_or_else(|| StackError::UnexpectedPixelLayout {
            path: path.to_owned(),
            format,
        })
    }

    /// 按 `format` 把图像像素解码为 label.
    ///
    /// - 16-bit (及未声明): 接受 16-bit 或 8-bit 灰度图, label 即灰度值.
    /// - 24-bit: 接受 RGB8 或 RGBA8, label = `R | G << 8 | B << 16`, alpha 被忽略.
    ///
    /// 像素布局不符时返回 `None`.
    pub fn from_image(img: &DynamicImage, format: SuperpixelFormat) -> Option<Self> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let data = match (format, img) {
            (SuperpixelFormat::Bits24, DynamicImage::ImageRgb8(buf)) => {
                Array2::from_shape_fn((h, w), |(y, x)| {
                    pack_rgb(buf.get_pixel(x as u32, y as u32).0)
                })
            }
            (SuperpixelFormat::Bits24, DynamicImage::ImageRgba8(buf)) => {
                Array2::from_shape_fn((h, w), |(y, x)| {
                    let [r, g, b, _] = buf.get_pixel(x as u32, y as u32).0;
                    pack_rgb([r, g, b])
                })
            }
            (SuperpixelFormat::Bits16 | SuperpixelFormat::None, DynamicImage::ImageLuma16(buf)) => {
                Array2::from_shape_fn((h, w), |(y, x)| {
                    u32::from(buf.get_pixel(x as u32, y as u32).0[0])
                })
            }
            (SuperpixelFormat::Bits16 | SuperpixelFormat::None, DynamicImage::ImageLuma8(buf)) => {
                Array2::from_shape_fn((h, w), |(y, x)| {
                    u32::from(buf.get_pixel(x as u32, y as u32).0[0])
                })
            }
            _ => return None,
        };
        Some(Self { data })
    }

    /// tile 宽度 (像素).
    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// tile 高度 (像素).
    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// 图像坐标 `(x, y)` 处的 label, 越界时返回 `None`. `y` 从图像最上方开始计.
    #[inline]
    pub fn label_at(&self, x: i64, y: i64) -> Option<u32> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.data.get((y, x)).copied()
    }
}

/// 三个字节按小端拼成 label: R 为最低字节.
#[inline]
const fn pack_rgb([r, g, b]: [u8; 3]) -> u32 {
    (r as u32) | (g as u32) << 8 | (b as u32) << 16
}
