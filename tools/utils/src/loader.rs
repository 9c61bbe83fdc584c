//! 对 `em_berry::Stack` 的更一层封装. 从环境变量定位 stack 目录.

use em_berry::Stack;
use std::env;
use std::path::{Path, PathBuf};

/// `$HOME/flyem` 下的某个路径. 找不到 home 目录时返回 `None`.
pub fn home_flyem_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("flyem");
    ans.extend(it);
    Some(ans)
}

/// 非空的环境变量 `key`.
fn non_empty_var(key: &str) -> Option<PathBuf> {
    env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// 获取源 stack 路径.
///
/// 1. 若环境变量 `$EM_SOURCE_STACK` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/flyem/source`.
pub fn source_dir_from_env_or_home() -> Option<PathBuf> {
    non_empty_var("EM_SOURCE_STACK").or_else(|| home_flyem_dir_with(["source"]))
}

/// 获取源 stack 的 base stack 路径 (`$EM_SOURCE_BASE`), 未设置时认为源 stack 自带 tiles.
pub fn source_base_dir_from_env() -> Option<PathBuf> {
    non_empty_var("EM_SOURCE_BASE")
}

/// 获取目标 stack 路径.
///
/// 1. 若环境变量 `$EM_TARGET_STACK` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/flyem/target`.
pub fn target_dir_from_env_or_home() -> Option<PathBuf> {
    non_empty_var("EM_TARGET_STACK").or_else(|| home_flyem_dir_with(["target"]))
}

/// 是否启用 superpixel 漂移检查. `$EM_CHECK_DRIFT` 为 `0`, `false`, `no`, `off`
/// (不区分大小写) 时关闭, 其余情况 (包括未设置) 开启.
pub fn check_drift_from_env() -> bool {
    env::var("EM_CHECK_DRIFT").map_or(true, |v| parse_switch(&v))
}

fn parse_switch(v: &str) -> bool {
    !["0", "false", "no", "off"]
        .iter()
        .any(|f| v.trim().eq_ignore_ascii_case(f))
}

/// 打开源 stack. 设置了 base 路径时, tiles 与元信息从 base stack 读取.
pub fn source_stack_from_env_or_home() -> Option<Stack> {
    let dir = source_dir_from_env_or_home()?;
    Some(match source_base_dir_from_env() {
        Some(base) => Stack::with_base(dir, base),
        None => Stack::new(dir),
    })
}

/// 打开目标 stack.
#[inline]
pub fn target_stack_from_env_or_home() -> Option<Stack> {
    target_dir_from_env_or_home().map(Stack::new)
}

#[cfg(test)]
mod tests {
    use super::{home_flyem_dir_with, parse_switch};

    #[test]
    fn test_parse_switch() {
        for v in ["0", "false", "No", " OFF "] {
            assert!(!parse_switch(v));
        }
        for v in ["1", "true", "yes", ""] {
            assert!(parse_switch(v));
        }
    }

    #[test]
    fn test_home_flyem_dir() {
        if let Some(p) = home_flyem_dir_with(["a", "b"]) {
            assert!(p.ends_with("flyem/a/b"));
        }
    }
}
