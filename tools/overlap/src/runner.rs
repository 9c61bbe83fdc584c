//! 程序运行函数.

use crate::report::OverlapReport;
use em_berry::overlap;
use std::error::Error;
use utils::loader;

/// 实际运行.
pub fn run<I: IntoIterator<Item = String>>(args: I) -> Result<OverlapReport, Box<dyn Error>> {
    let bodies = utils::parse_body_args(args)?;
    if bodies.is_empty() {
        return Err("no body given, usage: overlap <body | @file>...".into());
    }

    let source = loader::source_stack_from_env_or_home().ok_or("cannot locate source stack")?;
    let target = loader::target_stack_from_env_or_home().ok_or("cannot locate target stack")?;
    let check_drift = loader::check_drift_from_env();
    log::info!(
        "Matching {} bodies: {source} -> {target} (drift check: {check_drift})",
        bodies.len()
    );

    let matching = overlap::match_bodies(&source, &target, &bodies, check_drift)?;
    Ok(OverlapReport::new(matching))
}
