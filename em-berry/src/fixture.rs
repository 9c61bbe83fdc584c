//! 测试用的 stack 目录构造器.

use crate::consts::filenames::{SEGMENT_TO_BODY, SUPERPIXEL_BOUNDS, SUPERPIXEL_TO_SEGMENT};
use crate::tiles::tile_path;
use crate::{BodyId, SuperpixelFormat, VoxelCoord};
use image::{ImageBuffer, Luma, Rgb};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

struct TileSpec {
    rel_path: String,
    width: u32,
    height: u32,
    labels: Vec<u32>,
}

/// 在给定目录下写出一个最小的 Raveler stack.
pub(crate) struct StackBuilder {
    dir: PathBuf,
    size: Option<(VoxelCoord, VoxelCoord, VoxelCoord, VoxelCoord)>,
    format: SuperpixelFormat,
    superpixels: Vec<(u32, u32, i64)>,
    segments: Vec<(i64, BodyId)>,
    bounds: Vec<(u32, u32, u64)>,
    tiles: Vec<TileSpec>,
}

impl StackBuilder {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            size: None,
            format: SuperpixelFormat::None,
            superpixels: vec![],
            segments: vec![],
            bounds: vec![],
            tiles: vec![],
        }
    }

    /// 写出 `tiles/metadata.txt`.
    pub fn size(
        mut self,
        width: VoxelCoord,
        height: VoxelCoord,
        zmin: VoxelCoord,
        zmax: VoxelCoord,
    ) -> Self {
        self.size = Some((width, height, zmin, zmax));
        self
    }

    pub fn format(mut self, format: SuperpixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn superpixel(mut self, slice: u32, label: u32, segment: i64) -> Self {
        self.superpixels.push((slice, label, segment));
        self
    }

    pub fn segment(mut self, segment: i64, body: BodyId) -> Self {
        self.segments.push((segment, body));
        self
    }

    /// superpixel 包围盒表中的一项. 包围盒本身不参与计算, 只记录体积.
    pub fn bound(mut self, slice: u32, label: u32, volume: u64) -> Self {
        self.bounds.push((slice, label, volume));
        self
    }

    /// 一个 `width * height` 的 tile, 图像坐标 `(x, y)` (`y` 从上往下) 处的 label 为 `f(x, y)`.
    pub fn tile<F: Fn(u32, u32) -> u32>(
        mut self,
        row: VoxelCoord,
        col: VoxelCoord,
        slice: VoxelCoord,
        width: u32,
        height: u32,
        f: F,
    ) -> Self {
        let labels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        self.tiles.push(TileSpec {
            rel_path: tile_path(row, col, slice),
            width,
            height,
            labels,
        });
        self
    }

    pub fn write(self) {
        fs::create_dir_all(&self.dir).unwrap();
        if let Some((w, h, zmin, zmax)) = self.size {
            let mut text = format!("width={w}\nheight={h}\nzmin={zmin}\nzmax={zmax}\n");
            match self.format {
                SuperpixelFormat::Bits16 => text.push_str("superpixel-format=I\n"),
                SuperpixelFormat::Bits24 => text.push_str("superpixel-format=RGBA\n"),
                SuperpixelFormat::None => {}
            }
            fs::create_dir_all(self.dir.join("tiles")).unwrap();
            fs::write(self.dir.join("tiles").join("metadata.txt"), text).unwrap();
        }

        if !self.superpixels.is_empty() || !self.segments.is_empty() {
            let mut sp = String::from("# slice label segment\n");
            for (slice, label, segment) in &self.superpixels {
                writeln!(&mut sp, "{slice} {label} {segment}").unwrap();
            }
            let mut seg = String::from("# segment body\n");
            for (segment, body) in &self.segments {
                writeln!(&mut seg, "{segment} {body}").unwrap();
            }
            fs::write(self.dir.join(SUPERPIXEL_TO_SEGMENT), sp).unwrap();
            fs::write(self.dir.join(SEGMENT_TO_BODY), seg).unwrap();
        }

        if !self.bounds.is_empty() {
            let mut text = String::new();
            for (slice, label, volume) in &self.bounds {
                writeln!(&mut text, "{slice} {label} 0 0 1 1 {volume}").unwrap();
            }
            fs::write(self.dir.join(SUPERPIXEL_BOUNDS), text).unwrap();
        }

        for t in &self.tiles {
            let path = self.dir.join(&t.rel_path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let label = |x: u32, y: u32| t.labels[(y * t.width + x) as usize];
            if self.format.is_24_bits() {
                ImageBuffer::from_fn(t.width, t.height, |x, y| {
                    let [r, g, b, _] = label(x, y).to_le_bytes();
                    Rgb([r, g, b])
                })
                .save(&path)
                .unwrap();
            } else {
                ImageBuffer::from_fn(t.width, t.height, |x, y| Luma([label(x, y) as u16]))
                    .save(&path)
                    .unwrap();
            }
        }
    }
}
