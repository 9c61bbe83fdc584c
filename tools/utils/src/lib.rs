//! 批处理工具依赖的通用组件.

use em_berry::{BodyId, BodySet};
use std::fs;
use std::io;
use std::path::Path;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: io::Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 解析 body 列表. 每个参数要么是一个 body 编号, 要么是 `@路径`,
/// 后者表示从文件中读取 body 编号 (空白分隔, `#` 开头的行被忽略).
pub fn parse_body_args<I, S>(args: I) -> io::Result<BodySet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ans = BodySet::new();
    for arg in args {
        let arg = arg.as_ref();
        match arg.strip_prefix('@') {
            Some(path) => ans.extend(read_body_list(path)?),
            None => {
                ans.insert(parse_body(arg)?);
            }
        }
    }
    Ok(ans)
}

/// 读取 body 列表文件.
pub fn read_body_list<P: AsRef<Path>>(path: P) -> io::Result<BodySet> {
    let text = fs::read_to_string(path)?;
    text.lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(parse_body)
        .collect()
}

fn parse_body(s: &str) -> io::Result<BodyId> {
    s.parse().map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, format!("invalid body id `{s}`"))
    })
}
