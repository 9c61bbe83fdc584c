use super::Point2d;
use crate::VoxelCoord;

/// 方环的一条边. `horizontal` 为 `true` 时 `fixed` 是 y 坐标, 否则是 x 坐标.
#[derive(Copy, Clone, Debug, Default)]
struct Segment {
    fixed: VoxelCoord,
    from: VoxelCoord,
    to: VoxelCoord,
    horizontal: bool,
}

/// 方环像素迭代器, 由 [`Point2d::ring`] 创建.
///
/// 依次产生上、下、左、右四条边的像素, 每条边内按坐标升序.
/// 可 `clone` 后重新迭代.
#[derive(Clone, Debug)]
pub struct RingPixels {
    segments: [Segment; 4],
    len: usize,
    seg: usize,
    cursor: VoxelCoord,
}

impl RingPixels {
    fn new(center: Point2d, r: VoxelCoord, max_x: VoxelCoord, max_y: VoxelCoord) -> Self {
        let mut segments = [Segment::default(); 4];
        let mut len = 0;
        if r == 0 {
            segments[0] = Segment {
                fixed: center.y,
                from: center.x,
                to: center.x,
                horizontal: true,
            };
            len = 1;
        } else {
            let Point2d { x, y } = center;
            let (min_xc, max_xc) = (0.max(x - r), max_x.min(x + r));
            let (min_yc, max_yc) = (0.max(y - r), max_y.min(y + r));
            let within_y = |v: VoxelCoord| (0..=max_y).contains(&v);
            let within_x = |v: VoxelCoord| (0..=max_x).contains(&v);

            let candidates = [
                (within_y(y - r), y - r, min_xc, max_xc, true),
                (within_y(y + r), y + r, min_xc, max_xc, true),
                (within_x(x - r), x - r, min_yc, max_yc, false),
                (within_x(x + r), x + r, min_yc, max_yc, false),
            ];
            for (keep, fixed, from, to, horizontal) in candidates {
                if keep {
                    segments[len] = Segment {
                        fixed,
                        from,
                        to,
                        horizontal,
                    };
                    len += 1;
                }
            }
        }
        let cursor = segments[0].from;
        Self {
            segments,
            len,
            seg: 0,
            cursor,
        }
    }
}

impl Iterator for RingPixels {
    type Item = Point2d;

    fn next(&mut self) -> Option<Self::Item> {
        while self.seg < self.len {
            let s = self.segments[self.seg];
            if self.cursor <= s.to {
                let v = self.cursor;
                self.cursor += 1;
                return Some(if s.horizontal {
                    Point2d::new(v, s.fixed)
                } else {
                    Point2d::new(s.fixed, v)
                });
            }
            self.seg += 1;
            if self.seg < self.len {
                self.cursor = self.segments[self.seg].from;
            }
        }
        None
    }
}

impl Point2d {
    /// 以 `self` 为中心、Chebyshev 距离为 `radius` 的方环像素迭代器,
    /// 限制在 `[0, max_x] × [0, max_y]` 中.
    ///
    /// - `radius == 0` 时只产生中心点本身.
    /// - 否则最多产生上、下、左、右四条边. 某条边的固定坐标越界时整条边被省略,
    ///   而不是截成一部分; 其余边沿自身方向截断到范围内.
    ///   因此靠近边缘时产生的像素可能少于 `8 * radius` 个.
    /// - 角点会同时出现在水平边和垂直边中.
    ///
    /// `self` 应当在范围内, 否则结果无意义.
    #[inline]
    pub fn ring(&self, radius: VoxelCoord, max_x: VoxelCoord, max_y: VoxelCoord) -> RingPixels {
        debug_assert!(radius >= 0);
        RingPixels::new(*self, radius, max_x, max_y)
    }

    /// [`Point2d::ring`] 的物化版本.
    #[inline]
    pub fn pixels_at_radius(
        &self,
        radius: VoxelCoord,
        max_x: VoxelCoord,
        max_y: VoxelCoord,
    ) -> Vec<Point2d> {
        self.ring(radius, max_x, max_y).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Point2d, Point3d, VoxelCoord};

    fn p(x: VoxelCoord, y: VoxelCoord) -> Point2d {
        Point2d::new(x, y)
    }

    /// 按定义直接拼接四条边.
    fn ring_by_definition(
        c: Point2d,
        r: VoxelCoord,
        mx: VoxelCoord,
        my: VoxelCoord,
    ) -> Vec<Point2d> {
        if r == 0 {
            return vec![c];
        }
        let xs = (c.x - r).max(0)..=(c.x + r).min(mx);
        let ys = (c.y - r).max(0)..=(c.y + r).min(my);
        let mut ans = vec![];
        if c.y - r >= 0 {
            ans.extend(xs.clone().map(|x| p(x, c.y - r)));
        }
        if c.y + r <= my {
            ans.extend(xs.clone().map(|x| p(x, c.y + r)));
        }
        if c.x - r >= 0 {
            ans.extend(ys.clone().map(|y| p(c.x - r, y)));
        }
        if c.x + r <= mx {
            ans.extend(ys.clone().map(|y| p(c.x + r, y)));
        }
        ans
    }

    #[test]
    fn test_radius_zero() {
        assert_eq!(p(5, 5).pixels_at_radius(0, 10, 10), vec![p(5, 5)]);
        assert_eq!(p(0, 0).pixels_at_radius(0, 0, 0), vec![p(0, 0)]);
    }

    #[test]
    fn test_corner_omits_top_and_left() {
        let ring = p(0, 0).pixels_at_radius(1, 10, 10);
        // bottom, then right
        assert_eq!(ring, vec![p(0, 1), p(1, 1), p(1, 0), p(1, 1)]);
        assert!(ring.iter().all(|q| q.x >= 0 && q.y >= 0));
    }

    #[test]
    fn test_interior_ring() {
        let ring = p(5, 5).pixels_at_radius(1, 10, 10);
        assert_eq!(
            ring,
            vec![
                p(4, 4),
                p(5, 4),
                p(6, 4),
                p(4, 6),
                p(5, 6),
                p(6, 6),
                p(4, 4),
                p(4, 5),
                p(4, 6),
                p(6, 4),
                p(6, 5),
                p(6, 6),
            ]
        );
    }

    #[test]
    fn test_ring_matches_definition() {
        for (cx, cy) in [(0, 0), (3, 7), (9, 9), (5, 0), (0, 5), (2, 2)] {
            for r in 0..=12 {
                let c = p(cx, cy);
                assert_eq!(
                    c.pixels_at_radius(r, 9, 9),
                    ring_by_definition(c, r, 9, 9),
                    "center {c}, radius {r}"
                );
            }
        }
    }

    #[test]
    fn test_ring_restartable() {
        let it = p(3, 3).ring(2, 5, 5);
        let first: Vec<_> = it.clone().collect();
        let second: Vec<_> = it.collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_3d_ring_keeps_slice() {
        let ring = Point3d::new(1, 1, 42).pixels_at_radius(1, 2, 2);
        assert!(ring.iter().all(|q| q.z == 42));
        assert_eq!(ring.len(), 12);
    }
}
