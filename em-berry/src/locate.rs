//! stack 空间坐标 -> body 的解析.

use crate::consts::{NEAREST_BODY_RADIUS_CAP, NO_BODY, TILE_SIZE};
use crate::tiles::{tile_path, tile_row_col, LabelTile};
use crate::{BodyId, BodySet, Point2d, Point3d, Stack, StackError, StackResult, Superpixel};
use std::sync::Arc;

/// 最近 body 搜索的结果.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NearestBody {
    /// 找到的 body. 为 `0` 时表示在半径上限内没有找到, 需要人工标记.
    pub body: BodyId,

    /// 找到 body 时所用的 ring 半径. 未找到时等于半径上限.
    pub radius: i64,

    /// 命中像素在 stack 空间中的坐标. 未找到时为查询坐标本身.
    pub location: Point3d,
}

impl NearestBody {
    /// 是否找到了 body?
    #[inline]
    pub fn is_found(&self) -> bool {
        self.body != NO_BODY
    }
}

/// 查询点在其 tile 中的位置.
struct TileProbe {
    tile: Arc<LabelTile>,
    row: i64,
    col: i64,
    slice: u32,

    /// 图像坐标, y 从 tile 最上方开始计.
    at: Point2d,
}

impl TileProbe {
    #[inline]
    fn label(&self, p: Point2d) -> Option<u32> {
        self.tile.label_at(p.x, p.y)
    }

    /// 图像坐标 -> stack 空间坐标.
    #[inline]
    fn to_stack(&self, p: Point2d, z: i64) -> Point3d {
        let height = self.tile.height() as i64;
        Point3d::new(
            self.col * TILE_SIZE + p.x,
            self.row * TILE_SIZE + (height - p.y - 1),
            z,
        )
    }
}

/// 坐标解析部分
impl Stack {
    /// 检查 `pt` 在 stack 范围内, 并找到它所在的 tile 像素.
    fn probe(&self, pt: &Point3d) -> StackResult<TileProbe> {
        let bounds = self.tiles_metadata()?.bounds;
        let slice = u32::try_from(pt.z).ok().filter(|_| bounds.include(pt));
        let Some(slice) = slice else {
            return Err(StackError::OutOfBounds { pt: *pt, bounds });
        };

        let (row, col) = tile_row_col(pt);
        let tile = self.read_label_tile(&tile_path(row, col, pt.z))?;

        // tile 图像的 y 轴与 stack 空间的 y 轴方向相反.
        let x = pt.x - col * TILE_SIZE;
        let y = tile.height() as i64 - (pt.y - row * TILE_SIZE) - 1;
        Ok(TileProbe {
            tile,
            row,
            col,
            slice,
            at: Point2d::new(x, y),
        })
    }

    /// 读取 `pt` 所在的 superpixel, 并返回其 body.
    ///
    /// `pt` 不在 stack 范围内时返回 [`StackError::OutOfBounds`].
    /// `pt` 落在 label 为 0 的像素上时返回 `0` 并输出警告,
    /// 调用方需要自行处理 (例如改用 [`Stack::nearest_body_of_location`]).
    pub fn body_of_location(&self, pt: &Point3d) -> StackResult<BodyId> {
        let map = self.ensure_loaded()?;
        let probe = self.probe(pt)?;
        match probe.label(probe.at) {
            Some(0) => {
                log::warn!("Point falls in ZERO SUPERPIXEL: {pt}");
                Ok(NO_BODY)
            }
            Some(label) => Ok(map.body_of(&Superpixel::new(probe.slice, label))),
            None => {
                log::warn!(
                    "Point {pt} lies outside its {}x{} tile",
                    probe.tile.width(),
                    probe.tile.height()
                );
                Ok(NO_BODY)
            }
        }
    }

    /// 在 `pt` 周围的方环上由近及远搜索 body.
    ///
    /// 半径依次取 `0..NEAREST_BODY_RADIUS_CAP`, 只在 `pt` 所在 tile 内搜索.
    /// 对每个 label 非 0 且 body 非 0 的像素:
    ///
    /// 1. body 在 `exclude` 中时直接跳过, 任何情况下都不会返回;
    /// 2. body 不在 `avoid` 中时立即返回;
    /// 3. 否则记下第一个 (半径最小的) 这样的像素作为备选, 继续搜索.
    ///
    /// 搜索结束时返回备选 (若有); 都没有时返回 body `0`, 半径为上限,
    /// 坐标为 `pt` 本身.
    ///
    /// `exclude` 一般是调用方已经确定的 body (如 T-bar 自身的 body),
    /// `avoid` 是同一突触中其它 PSD 已经占用的 body.
    pub fn nearest_body_of_location(
        &self,
        pt: &Point3d,
        exclude: &BodySet,
        avoid: &BodySet,
    ) -> StackResult<NearestBody> {
        let map = self.ensure_loaded()?;
        let probe = self.probe(pt)?;
        let unresolved = NearestBody {
            body: NO_BODY,
            radius: NEAREST_BODY_RADIUS_CAP,
            location: *pt,
        };
        if probe.label(probe.at).is_none() {
            log::warn!(
                "Point {pt} lies outside its {}x{} tile",
                probe.tile.width(),
                probe.tile.height()
            );
            return Ok(unresolved);
        }

        let max_x = probe.tile.width() as i64 - 1;
        let max_y = probe.tile.height() as i64 - 1;
        let mut fallback = None;
        for radius in 0..NEAREST_BODY_RADIUS_CAP {
            for p in probe.at.ring(radius, max_x, max_y) {
                let label = match probe.label(p) {
                    Some(0) | None => continue,
                    Some(label) => label,
                };
                let body = map.body_of(&Superpixel::new(probe.slice, label));
                if body == NO_BODY || exclude.contains(&body) {
                    continue;
                }
                let found = NearestBody {
                    body,
                    radius,
                    location: probe.to_stack(p, pt.z),
                };
                if !avoid.contains(&body) {
                    return Ok(found);
                }
                fallback.get_or_insert(found);
            }
        }

        match fallback {
            Some(found) => {
                log::warn!(
                    "Only already-used bodies near {pt}: using body {} at radius {}",
                    found.body,
                    found.radius
                );
                Ok(found)
            }
            None => {
                log::warn!("No body within radius {NEAREST_BODY_RADIUS_CAP} of {pt}");
                Ok(unresolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NearestBody;
    use crate::fixture::StackBuilder;
    use crate::{BodySet, Point3d, Stack, StackError, SuperpixelFormat};

    /// 4x4 tile, 图像坐标 (x, y) 的 label 为 `1 + x + 4y`; label `n` 的 body 为 `100 + n`.
    fn gradient_stack(dir: &std::path::Path, format: SuperpixelFormat) {
        let mut b = StackBuilder::new(dir)
            .size(4, 4, 0, 0)
            .format(format)
            .tile(0, 0, 0, 4, 4, |x, y| 1 + x + 4 * y);
        for label in 1..=16 {
            b = b.superpixel(0, label, label as i64).segment(label as i64, 100 + label as i64);
        }
        b.write();
    }

    #[test]
    fn test_body_of_location_flips_y() {
        for format in [SuperpixelFormat::Bits16, SuperpixelFormat::Bits24] {
            let dir = tempfile::tempdir().unwrap();
            gradient_stack(dir.path(), format);
            let stack = Stack::new(dir.path());

            // stack y = 0 对应图像最下面一行 (y = 3).
            assert_eq!(stack.body_of_location(&Point3d::new(1, 0, 0)).unwrap(), 100 + 14);
            assert_eq!(stack.body_of_location(&Point3d::new(0, 3, 0)).unwrap(), 100 + 1);
            assert_eq!(stack.body_of_location(&Point3d::new(3, 1, 0)).unwrap(), 100 + 12);
        }
    }

    #[test]
    fn test_body_of_location_errors() {
        let dir = tempfile::tempdir().unwrap();
        gradient_stack(dir.path(), SuperpixelFormat::Bits16);
        let stack = Stack::new(dir.path());

        for pt in [
            Point3d::new(4, 0, 0),
            Point3d::new(0, 4, 0),
            Point3d::new(0, 0, 1),
            Point3d::new(-1, 0, 0),
        ] {
            assert!(matches!(
                stack.body_of_location(&pt),
                Err(StackError::OutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn test_zero_superpixel() {
        let _ = simple_logger::init_with_level(log::Level::Warn);
        let dir = tempfile::tempdir().unwrap();
        StackBuilder::new(dir.path())
            .size(2, 2, 0, 0)
            .tile(0, 0, 0, 2, 2, |x, _| x)
            .superpixel(0, 1, 1)
            .segment(1, 5)
            .write();
        let stack = Stack::new(dir.path());
        assert_eq!(stack.body_of_location(&Point3d::new(0, 0, 0)).unwrap(), 0);
        assert_eq!(stack.body_of_location(&Point3d::new(1, 0, 0)).unwrap(), 5);
    }

    #[test]
    fn test_second_tile_and_nested_slice() {
        let dir = tempfile::tempdir().unwrap();
        StackBuilder::new(dir.path())
            .size(1030, 4, 1040, 1045)
            .format(SuperpixelFormat::Bits24)
            .tile(0, 1, 1042, 6, 4, |x, y| if (x, y) == (3, 2) { 0x0a0b0c } else { 0 })
            .superpixel(1042, 0x0a0b0c, 77)
            .segment(77, 4242)
            .write();
        let stack = Stack::new(dir.path());
        // x = 1027 -> 第 1 列, tile 内 x = 3; y = 1 -> 图像 y = 4 - 1 - 1 = 2.
        assert_eq!(stack.body_of_location(&Point3d::new(1027, 1, 1042)).unwrap(), 4242);
        assert_eq!(stack.body_of_location(&Point3d::new(1027, 2, 1042)).unwrap(), 0);
    }

    /// 7x7 tile. `cells` 给出图像坐标上的 label, 其余为 0.
    /// label `n` 的 body 为 `bodies[n - 1]`.
    fn sparse_stack(dir: &std::path::Path, cells: &[(u32, u32, u32)], bodies: &[i64]) -> Stack {
        let cells = cells.to_vec();
        let mut b = StackBuilder::new(dir).size(7, 7, 0, 0).tile(0, 0, 0, 7, 7, move |x, y| {
            cells
                .iter()
                .find(|(cx, cy, _)| (*cx, *cy) == (x, y))
                .map_or(0, |c| c.2)
        });
        for (i, body) in bodies.iter().enumerate() {
            let label = i as u32 + 1;
            b = b.superpixel(0, label, label as i64).segment(label as i64, *body);
        }
        b.write();
        Stack::new(dir)
    }

    /// 图像坐标 -> stack 坐标 (7x7 tile).
    fn at(x: i64, y: i64) -> Point3d {
        Point3d::new(x, 6 - y, 0)
    }

    #[test]
    fn test_nearest_own_body() {
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(3, 3, 1)], &[7]);
        let r = stack
            .nearest_body_of_location(&at(3, 3), &BodySet::new(), &BodySet::new())
            .unwrap();
        assert_eq!(
            r,
            NearestBody {
                body: 7,
                radius: 0,
                location: at(3, 3)
            }
        );
    }

    #[test]
    fn test_nearest_skips_excluded() {
        // 中心 body 7, 半径 1 上唯一的非零像素也是 body 7, 半径 2 上有 body 9.
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(3, 3, 1), (4, 3, 1), (5, 1, 2)], &[7, 9]);
        let exclude = BodySet::from([7]);
        let r = stack
            .nearest_body_of_location(&at(3, 3), &exclude, &BodySet::new())
            .unwrap();
        assert_eq!(r.body, 9);
        assert_eq!(r.radius, 2);
        assert_eq!(r.location, at(5, 1));
    }

    #[test]
    fn test_nearest_exhausted() {
        let _ = simple_logger::init_with_level(log::Level::Warn);
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(3, 3, 1), (4, 3, 1)], &[7]);
        let exclude = BodySet::from([7]);
        let r = stack
            .nearest_body_of_location(&at(3, 3), &exclude, &BodySet::new())
            .unwrap();
        assert_eq!(
            r,
            NearestBody {
                body: 0,
                radius: 6,
                location: at(3, 3)
            }
        );
        assert!(!r.is_found());
    }

    #[test]
    fn test_nearest_prefers_clean_over_avoided() {
        // 半径 1 上是已被占用的 body 8, 半径 3 上是干净的 body 9.
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(3, 2, 1), (0, 3, 2)], &[8, 9]);
        let avoid = BodySet::from([8]);
        let r = stack
            .nearest_body_of_location(&at(3, 3), &BodySet::new(), &avoid)
            .unwrap();
        assert_eq!((r.body, r.radius, r.location), (9, 3, at(0, 3)));
    }

    #[test]
    fn test_nearest_falls_back_to_avoided() {
        // 只有被占用的 body: 返回半径最小的那个.
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(1, 1, 2), (3, 2, 1)], &[8, 9]);
        let avoid = BodySet::from([8, 9]);
        let r = stack
            .nearest_body_of_location(&at(3, 3), &BodySet::new(), &avoid)
            .unwrap();
        assert_eq!((r.body, r.radius, r.location), (8, 1, at(3, 2)));
    }

    #[test]
    fn test_nearest_excluded_never_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(3, 2, 1)], &[8]);
        let set = BodySet::from([8]);
        let r = stack.nearest_body_of_location(&at(3, 3), &set, &set).unwrap();
        assert_eq!(r.body, 0);
    }

    #[test]
    fn test_nearest_stays_in_tile() {
        // 离 tile 边缘很近时, ring 被截断但仍能找到 body.
        let dir = tempfile::tempdir().unwrap();
        let stack = sparse_stack(dir.path(), &[(0, 2, 1)], &[5]);
        let r = stack
            .nearest_body_of_location(&at(0, 0), &BodySet::new(), &BodySet::new())
            .unwrap();
        assert_eq!((r.body, r.radius, r.location), (5, 2, at(0, 2)));
    }
}
