//! superpixel 包围盒表, 以及两个 stack 间 superpixel 体素变化量的统计.

use super::remap::Superpixel;
use crate::{StackError, StackResult};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 单个 superpixel 的二维包围盒 (左上角, 宽, 高) 和体素个数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuperpixelBound {
    /// 左上角 x.
    pub min_x: i64,

    /// 左上角 y.
    pub min_y: i64,

    /// 宽.
    pub width: i64,

    /// 高.
    pub height: i64,

    /// 体素个数.
    pub volume: u64,
}

/// superpixel -> 包围盒.
pub type SuperpixelBoundsMap = HashMap<Superpixel, SuperpixelBound>;

/// 读取 `slice label min_x min_y width height volume` 格式的包围盒表.
///
/// `filter` 为 `Some` 时只保留其中的 superpixel. 空行及以空格/`#`
/// 开头的行被跳过, 其余无法解析的行是致命错误.
pub fn read_superpixel_bounds<P: AsRef<Path>>(
    path: P,
    filter: Option<&HashSet<Superpixel>>,
) -> StackResult<SuperpixelBoundsMap> {
    let path = path.as_ref();
    log::info!("Loading superpixel bounds: {}", path.display());
    let file = File::open(path).map_err(StackError::io(path))?;

    let mut ans = SuperpixelBoundsMap::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(StackError::io(path))?;
        if line.trim().is_empty() || line.starts_with([' ', '#']) {
            continue;
        }
        let Some((sp, bound)) = parse_bound(&line) else {
            return Err(StackError::ParseLine {
                path: path.to_owned(),
                line_num: i + 1,
                line,
            });
        };
        if filter.map_or(true, |f| f.contains(&sp)) {
            ans.insert(sp, bound);
        }
    }
    Ok(ans)
}

fn parse_bound(line: &str) -> Option<(Superpixel, SuperpixelBound)> {
    let mut it = line.split_whitespace();
    let mut next = || it.next()?.parse::<i64>().ok();
    let sp = Superpixel::new(
        u32::try_from(next()?).ok()?,
        u32::try_from(next()?).ok()?,
    );
    let bound = SuperpixelBound {
        min_x: next()?,
        min_y: next()?,
        width: next()?,
        height: next()?,
        volume: u64::try_from(next()?).ok()?,
    };
    Some((sp, bound))
}

/// 以 `before` 为基准, 统计 superpixel 体素变化比例.
///
/// 对 `before` 中的每个 superpixel, 若 `after` 中不存在则整个体积计为变化,
/// 否则计体积差的绝对值. 返回 `(变化比例, 基准体素总数)`;
/// 基准为空时比例为 `0`.
pub fn superpixel_drift(
    before: &SuperpixelBoundsMap,
    after: &SuperpixelBoundsMap,
) -> (f64, u64) {
    let mut total = 0u64;
    let mut diff = 0u64;
    for (sp, b1) in before.iter() {
        total += b1.volume;
        diff += match after.get(sp) {
            Some(b2) => b1.volume.abs_diff(b2.volume),
            None => b1.volume,
        };
    }
    if total == 0 {
        return (0.0, 0);
    }
    (diff as f64 / total as f64, total)
}
