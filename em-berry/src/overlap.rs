//! 两个 stack 之间基于 superpixel 重叠的 body 对应关系.
//!
//! 假设两个 stack 中相同 (切片, label) 的 superpixel 指的是同一块区域.
//! 该假设不做坐标上的校验, 只能通过可选的漂移检查间接验证.

use crate::consts::{NO_BODY, SUPERPIXEL_DRIFT_THRESHOLD};
use crate::stack::{read_superpixel_bounds, superpixel_drift, MappedStack, Superpixel};
use crate::{BodyId, BodySet, StackError, StackResult};
use std::collections::{BTreeMap, HashMap, HashSet};

/// 单个源 body 的最佳匹配.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BestOverlap {
    /// 匹配到的目标 body, `0` 表示没有找到.
    pub matched_body: BodyId,

    /// 落在 `matched_body` 中的 superpixel 个数.
    pub overlap_count: usize,

    /// 源 body 的 superpixel 总数, 即 `overlap_count` 可能的最大值.
    pub max_possible: usize,
}

impl BestOverlap {
    /// 重叠比例 `overlap_count / max_possible`. 源 body 没有 superpixel 时为 `0`.
    pub fn coverage(&self) -> f64 {
        if self.max_possible == 0 {
            0.0
        } else {
            self.overlap_count as f64 / self.max_possible as f64
        }
    }
}

/// 源 body -> 最佳匹配.
pub type BestOverlapMap = HashMap<BodyId, BestOverlap>;

/// 一次重叠匹配的完整结果.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlapMatching {
    /// 每个请求的源 body 都有一项, 包括没有匹配到的.
    pub matches: BestOverlapMap,

    /// 在目标 stack 表中找到的 superpixel 个数.
    pub superpixels_found: usize,

    /// 在目标 stack 表中找不到的 superpixel 个数.
    pub superpixels_missing: usize,

    /// 在源 stack 中完全不存在的 body, 升序.
    pub absent_bodies: Vec<BodyId>,
}

impl OverlapMatching {
    /// 源 body -> 目标 body, 只包含匹配成功的项.
    pub fn body_map(&self) -> HashMap<BodyId, BodyId> {
        self.matches
            .iter()
            .filter(|(_, m)| m.matched_body != NO_BODY)
            .map(|(&body, m)| (body, m.matched_body))
            .collect()
    }

    /// 没有匹配到目标 body 的源 body, 升序.
    pub fn unmatched(&self) -> Vec<BodyId> {
        let mut ans: Vec<_> = self
            .matches
            .iter()
            .filter(|(_, m)| m.matched_body == NO_BODY)
            .map(|(&body, _)| body)
            .collect();
        ans.sort_unstable();
        ans
    }
}

/// 按最大 superpixel 重叠, 为 `source` 中的 `bodies` 找出 `target` 中对应的 body.
///
/// 每个源 body 的每个 superpixel 在目标表中查到的 body 记一票 (查表得到 `0`
/// 也计票), 目标表中不存在的 superpixel 不计票. 票数严格最多者胜出;
/// 票数相同时取 body 编号最小者.
///
/// `check_drift` 为 `true` 时, 先比较两个 stack 的 superpixel 包围盒表中参与
/// 计算的 superpixel 的体积, 变化比例超过 [`SUPERPIXEL_DRIFT_THRESHOLD`] 时返回
/// [`StackError::SuperpixelDrift`]. 任一 stack 缺少包围盒表时只输出警告.
pub fn match_bodies<S, T>(
    source: &S,
    target: &T,
    bodies: &BodySet,
    check_drift: bool,
) -> StackResult<OverlapMatching>
where
    S: MappedStack + ?Sized,
    T: MappedStack + ?Sized,
{
    let mut requested: Vec<_> = bodies.iter().copied().collect();
    requested.sort_unstable();

    let body_to_sps = source.body_to_superpixels_map(bodies)?;
    let mut ans = OverlapMatching::default();
    for &body in &requested {
        if !body_to_sps.contains_key(&body) {
            log::warn!("Body {body} is not present in stack {}", source.dir().display());
            ans.absent_bodies.push(body);
        }
    }

    if check_drift {
        let evaluated: HashSet<Superpixel> = body_to_sps.values().flatten().copied().collect();
        check_superpixel_drift(source, target, &evaluated)?;
    }

    let sp_to_body = target.superpixel_to_body_map()?;
    for &body in &requested {
        let sps = body_to_sps.get(&body).map_or(&[][..], Vec::as_slice);
        let mut tally = BTreeMap::<BodyId, usize>::new();
        for sp in sps {
            match sp_to_body.get(sp) {
                Some(&target_body) => {
                    *tally.entry(target_body).or_default() += 1;
                    ans.superpixels_found += 1;
                }
                None => ans.superpixels_missing += 1,
            }
        }

        let mut best = BestOverlap {
            max_possible: sps.len(),
            ..Default::default()
        };
        for (&target_body, &count) in &tally {
            if count > best.overlap_count {
                best.overlap_count = count;
                best.matched_body = target_body;
            }
        }
        if best.matched_body == NO_BODY {
            log::warn!("Could not find overlapping body for body {body}");
        }
        ans.matches.insert(body, best);
    }

    if ans.superpixels_missing > 0 {
        log::info!(
            "Overlap analysis: {} of {} superpixels found in target stack {}",
            ans.superpixels_found,
            ans.superpixels_found + ans.superpixels_missing,
            target.dir().display()
        );
    }
    Ok(ans)
}

/// 两个 stack 间 `evaluated` 的体积变化过大时报错.
fn check_superpixel_drift<S, T>(
    source: &S,
    target: &T,
    evaluated: &HashSet<Superpixel>,
) -> StackResult<()>
where
    S: MappedStack + ?Sized,
    T: MappedStack + ?Sized,
{
    let (before, after) = (source.superpixel_bounds_path(), target.superpixel_bounds_path());
    for path in [&before, &after] {
        if !path.is_file() {
            log::warn!("Skipping superpixel drift check: {} not found", path.display());
            return Ok(());
        }
    }

    let before = read_superpixel_bounds(&before, Some(evaluated))?;
    let after = read_superpixel_bounds(&after, Some(evaluated))?;
    let (drift, voxels_total) = superpixel_drift(&before, &after);
    log::info!(
        "Superpixel drift: {:.2}% of {voxels_total} voxels",
        drift * 100.0
    );
    if drift > SUPERPIXEL_DRIFT_THRESHOLD {
        return Err(StackError::SuperpixelDrift {
            drift,
            voxels_total,
        });
    }
    Ok(())
}
