use crate::VoxelCoord;
use std::fmt;

/// XY 平面上的整数坐标, 轴向分别为向右、向下.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point2d {
    /// 水平坐标.
    pub x: VoxelCoord,

    /// 垂直坐标.
    pub y: VoxelCoord,
}

impl Point2d {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: VoxelCoord, y: VoxelCoord) -> Self {
        Self { x, y }
    }

    /// 与 `other` 的欧氏距离平方.
    #[inline]
    pub fn sqr_distance(&self, other: &Self) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl fmt::Display for Point2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// stack 空间中的整数坐标, 轴向分别为向右、向下、沿切片递增.
///
/// 按值比较和哈希, 可作为 map 键.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3d {
    /// 水平坐标.
    pub x: VoxelCoord,

    /// 垂直坐标.
    pub y: VoxelCoord,

    /// 切片编号.
    pub z: VoxelCoord,
}

impl Point3d {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: VoxelCoord, y: VoxelCoord, z: VoxelCoord) -> Self {
        Self { x, y, z }
    }

    /// XY 平面上的投影.
    #[inline]
    pub const fn xy(&self) -> Point2d {
        Point2d::new(self.x, self.y)
    }

    /// 与 `other` 的欧氏距离平方.
    #[inline]
    pub fn sqr_distance(&self, other: &Self) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// 在当前切片上以 `self` 为中心、半径为 `radius` 的方环像素,
    /// 规则见 [`Point2d::pixels_at_radius`]. 返回点的 z 坐标与 `self` 相同.
    pub fn pixels_at_radius(
        &self,
        radius: VoxelCoord,
        max_x: VoxelCoord,
        max_y: VoxelCoord,
    ) -> Vec<Point3d> {
        self.xy()
            .pixels_at_radius(radius, max_x, max_y)
            .into_iter()
            .map(|p| Point3d::new(p.x, p.y, self.z))
            .collect()
    }
}

impl fmt::Display for Point3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// 三维轴对齐包围盒, 两端均包含.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds3d {
    /// 最小角.
    pub min: Point3d,

    /// 最大角.
    pub max: Point3d,
}

impl Bounds3d {
    /// 直接初始化.
    #[inline]
    pub const fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    /// `pt` 的每个分量是否都落在 `[min, max]` 中?
    #[inline]
    pub fn include(&self, pt: &Point3d) -> bool {
        (self.min.x..=self.max.x).contains(&pt.x)
            && (self.min.y..=self.max.y).contains(&pt.y)
            && (self.min.z..=self.max.z).contains(&pt.z)
    }
}

impl fmt::Display for Bounds3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.min, self.max)
    }
}
