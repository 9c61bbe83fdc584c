//! superpixel -> segment -> body 文本表的读取, 合成与写出.

use crate::consts::filenames::{SEGMENT_TO_BODY, SUPERPIXEL_TO_SEGMENT};
use crate::consts::NO_BODY;
use crate::{BodyId, BodySet, StackError, StackResult};
use itertools::Itertools;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;

/// Raveler 中的 superpixel: 某一切片上的二维连通区域, 由 (切片, label) 唯一标识.
///
/// `label == 0` 代表背景, 不是真正的 superpixel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Superpixel {
    /// 切片编号.
    pub slice: u32,

    /// 切片内的 label.
    pub label: u32,
}

impl Superpixel {
    /// 直接初始化.
    #[inline]
    pub const fn new(slice: u32, label: u32) -> Self {
        Self { slice, label }
    }

    /// 是否为背景 (label 为 0)?
    #[inline]
    pub const fn is_background(&self) -> bool {
        self.label == 0
    }
}

/// body -> superpixels 反向索引. 只针对某个 body 子集构建.
pub type BodyToSuperpixelsMap = HashMap<BodyId, Vec<Superpixel>>;

/// 合成后的 superpixel -> body 表.
///
/// 查表未命中时返回 [`NO_BODY`], 与背景 superpixel 的结果相同.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuperpixelToBodyMap(HashMap<Superpixel, BodyId>);

impl Deref for SuperpixelToBodyMap {
    type Target = HashMap<Superpixel, BodyId>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<(Superpixel, BodyId)> for SuperpixelToBodyMap {
    fn from_iter<I: IntoIterator<Item = (Superpixel, BodyId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl SuperpixelToBodyMap {
    /// 查询 `sp` 所属 body. 未命中时返回 `0`.
    #[inline]
    pub fn body_of(&self, sp: &Superpixel) -> BodyId {
        self.0.get(sp).copied().unwrap_or(NO_BODY)
    }

    /// 修改或插入一条映射, 返回旧值.
    #[inline]
    pub fn insert(&mut self, sp: Superpixel, body: BodyId) -> Option<BodyId> {
        self.0.insert(sp, body)
    }

    /// 对全表做一次遍历, 只为 `bodies` 中的 body 收集 superpixel.
    ///
    /// 表可能有上千万项, 因此不提供针对全部 body 的版本.
    /// 每个 body 的 superpixel 按升序排列.
    pub fn body_to_superpixels(&self, bodies: &BodySet) -> BodyToSuperpixelsMap {
        let mut ans = BodyToSuperpixelsMap::new();
        for (sp, body) in self.0.iter() {
            if bodies.contains(body) {
                ans.entry(*body).or_default().push(*sp);
            }
        }
        ans.values_mut().for_each(|v| v.sort_unstable());
        ans
    }

    /// 从 stack 目录 `dir` 读取两张表并合成.
    ///
    /// 两张表并行读取, 都读完后再合成. superpixel 对应的 segment
    /// 在第二张表中不存在时, 该 superpixel 映射到 body `0`.
    pub fn read_txt_maps<P: AsRef<Path>>(dir: P) -> StackResult<Self> {
        let dir = dir.as_ref();
        let sp_path = dir.join(SUPERPIXEL_TO_SEGMENT);
        let seg_path = dir.join(SEGMENT_TO_BODY);
        log::info!("Loading superpixel->segment map: {}", sp_path.display());
        log::info!("Loading segment->body map: {}", seg_path.display());

        let (sp_to_segment, segment_to_body) = fork_join(
            || read_table(&sp_path, parse_superpixel_segment),
            || read_table(&seg_path, parse_fields::<2, BodyId>),
        );
        let sp_to_segment = sp_to_segment?;
        let segment_to_body: HashMap<BodyId, BodyId> = segment_to_body?
            .into_iter()
            .map(|[segment, body]| (segment, body))
            .collect();

        log::info!("Calculating superpixel->body map...");
        let mut ans = HashMap::with_capacity(sp_to_segment.len());
        for (sp, segment) in sp_to_segment {
            let body = segment_to_body.get(&segment).copied().unwrap_or(NO_BODY);
            ans.insert(sp, body);
        }
        log::info!("Maps loaded and computed: {} superpixels.", ans.len());
        Ok(Self(ans))
    }

    /// 为每个 (body, 切片) 分配一个 segment, 然后把两张表写到 `dir` 下.
    ///
    /// 背景 superpixel 统一映射到 segment `0`, 其 body 为 `0`.
    /// 输出按 superpixel / segment 升序, 两张表并行写出.
    pub fn write_txt_maps<P: AsRef<Path>>(&self, dir: P) -> StackResult<()> {
        let dir = dir.as_ref();
        let sp_path = dir.join(SUPERPIXEL_TO_SEGMENT);
        let seg_path = dir.join(SEGMENT_TO_BODY);

        let sorted: Vec<(Superpixel, BodyId)> = self
            .0
            .iter()
            .map(|(sp, body)| (*sp, *body))
            .sorted_unstable()
            .collect();

        // (body, slice) -> segment. 0 号 segment 保留给背景.
        let mut segments: HashMap<(BodyId, u32), i64> = HashMap::new();
        let mut sp_lines = Vec::with_capacity(sorted.len());
        let mut seg_lines = Vec::new();
        let mut has_background = false;
        for (sp, body) in sorted {
            let segment = if sp.is_background() {
                has_background = true;
                0
            } else {
                let next = segments.len() as i64 + 1;
                *segments.entry((body, sp.slice)).or_insert_with(|| {
                    seg_lines.push([next, body]);
                    next
                })
            };
            sp_lines.push([sp.slice as i64, sp.label as i64, segment]);
        }
        if has_background {
            seg_lines.insert(0, [0, NO_BODY]);
        }

        log::info!("Writing superpixel->segment map: {}", sp_path.display());
        log::info!("Writing segment->body map: {}", seg_path.display());
        let (a, b) = fork_join(
            || write_table(&sp_path, &sp_lines),
            || write_table(&seg_path, &seg_lines),
        );
        a?;
        b?;
        log::info!("Maps written.");
        Ok(())
    }
}

/// 该行是否应当跳过: 空行, 或以空格/`#` 开头的行.
#[inline]
fn is_skipped(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with([' ', '#'])
}

/// 解析一行中以空白分隔的前 `N` 个整数. 多余的列被忽略.
fn parse_fields<const N: usize, T: FromStr + Copy + Default>(line: &str) -> Option<[T; N]> {
    let mut ans = [T::default(); N];
    let mut tokens = line.split_whitespace();
    for slot in ans.iter_mut() {
        *slot = tokens.next()?.parse().ok()?;
    }
    Some(ans)
}

/// `slice label segment`. 切片和 label 必须在 `u32` 范围内.
fn parse_superpixel_segment(line: &str) -> Option<(Superpixel, BodyId)> {
    let [slice, label, segment] = parse_fields::<3, i64>(line)?;
    let sp = Superpixel::new(u32::try_from(slice).ok()?, u32::try_from(label).ok()?);
    Some((sp, segment))
}

/// 逐行读取文本表, 用 `parse` 解析每个数据行. 任何无法解析的数据行都是致命错误.
fn read_table<T>(path: &Path, parse: fn(&str) -> Option<T>) -> StackResult<Vec<T>> {
    let file = File::open(path).map_err(StackError::io(path))?;
    let mut ans = vec![];
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(StackError::io(path))?;
        if is_skipped(&line) {
            continue;
        }
        match parse(&line) {
            Some(row) => ans.push(row),
            None => {
                return Err(StackError::ParseLine {
                    path: path.to_owned(),
                    line_num: i + 1,
                    line,
                })
            }
        }
    }
    Ok(ans)
}

fn write_table<const N: usize>(path: &Path, rows: &[[i64; N]]) -> StackResult<()> {
    let file = File::create(path).map_err(StackError::io(path))?;
    let mut w = BufWriter::new(file);
    for row in rows {
        writeln!(&mut w, "{}", row.iter().join(" ")).map_err(StackError::io(path))?;
    }
    w.flush().map_err(StackError::io(path))
}

/// 同时运行两个独立任务并等待二者完成.
///
/// 任一任务 panic 时, panic 会在当前线程继续传播.
pub(crate) fn fork_join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            rayon::join(a, b)
        } else {
            std::thread::scope(|s| {
                let handle = s.spawn(b);
                let ra = a();
                let rb = handle
                    .join()
                    .unwrap_or_else(|e| std::panic::resume_unwind(e));
                (ra, rb)
            })
        }
    }
}
