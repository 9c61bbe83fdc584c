//! 匹配结果.

use em_berry::{BestOverlap, BodyId, OverlapMatching};
use std::io::{self, Write};

/// 将单个 body 的匹配写进 `w` 中.
fn describe_into<W: Write>(body: BodyId, m: &BestOverlap, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    if m.matched_body == 0 {
        writeln!(w, "{S4}{body} -> / (0 of {})", m.max_possible)
    } else {
        writeln!(
            w,
            "{S4}{body} -> {} ({} of {}, {:.2}%)",
            m.matched_body,
            m.overlap_count,
            m.max_possible,
            m.coverage() * 100.0
        )
    }
}

/// 重叠匹配的最终结果.
pub struct OverlapReport {
    matching: OverlapMatching,
}

impl OverlapReport {
    pub fn new(matching: OverlapMatching) -> Self {
        Self { matching }
    }

    /// 写出每个 body 的匹配及汇总信息.
    pub fn write_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let m = &self.matching;
        let mut bodies: Vec<_> = m.matches.iter().collect();
        bodies.sort_unstable_by_key(|(b, _)| **b);

        writeln!(w, "Matches:")?;
        for (&body, best) in bodies {
            describe_into(body, best, w)?;
        }
        utils::sep_to(&mut *w)?;

        let unmatched = m.unmatched();
        writeln!(w, "Matched bodies: {}", m.matches.len() - unmatched.len())?;
        writeln!(w, "Unmatched bodies: {unmatched:?}")?;
        writeln!(w, "Absent from source stack: {:?}", m.absent_bodies)?;
        write!(
            w,
            "Superpixels found in target: {} of {}",
            m.superpixels_found,
            m.superpixels_found + m.superpixels_missing
        )?;
        writeln!(w)
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        let stdout = io::stdout();
        if let Err(e) = self.write_into(&mut stdout.lock()) {
            log::error!("Failed to write report: {e}");
        }
    }
}
