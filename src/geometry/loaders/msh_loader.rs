/// MSHX1 文本网格加载器
///
/// 解析逐行的 MSHX1 文本格式并构建 `Mesh`。
///
/// # 文件结构
///
/// ```text
/// MSHX1
/// [STATICMESH]
/// GROUPS <n>
/// <n 个组块：若干指令行，GEOM <nv> <nt>，nv 行顶点，nt 行索引>
/// [MATERIALS <n> ...]
/// [TEXTURES <n> ...]
/// ```
///
/// 指令按不区分大小写的前缀匹配。格式错误的单行会被跳过或取默认值，
/// 结果记录在 `ParseReport` 中；只有魔数错误和 `GROUPS` 无法解析会中止整个解析。
use super::MeshLoader;
use crate::core::error::{ParseError, Result};
use crate::geometry::mesh::{
    Group, GroupFlags, IndexRef, Material, Mesh, Texture, MAX_GROUP_VERTICES,
};
use crate::geometry::synthesis::calc_normals;
use crate::geometry::vertex::Vertex;
use std::iter::{Enumerate, Peekable};
use std::path::Path;

/// 文件第一行必须是的魔数
pub const MAGIC: &str = "MSHX1";

/// 按 `GEOM` 声明的三角形数预留索引缓冲的上限，超出部分随读取增长
const MAX_RESERVED_INDICES: usize = 3 * MAX_GROUP_VERTICES;

/// 单行的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 完整解析
    Accepted,
    /// 已使用，但部分字段取了默认值
    Defaulted(DefaultReason),
    /// 被忽略
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// 字段不足，缺失的字段取默认值
    MissingFields { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 不认识的指令
    UnknownDirective,
    /// 指令缺少参数
    MissingValue,
    /// 参数无法解析
    MalformedValue,
    /// 负的材质/纹理编号
    NegativeReference,
}

/// 组被丢弃的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// `GEOM` 的参数无法解析
    BadGeom,
    /// 声明的顶点数超出 16 位索引范围
    TooManyVertices(usize),
    /// 顶点或索引行不足
    Truncated,
    /// 索引值超出顶点范围
    IndexOutOfRange { index: i64, vertex_count: usize },
    /// 顶点数或三角形数为零
    Empty,
    /// 在 `GEOM` 之前到达输入末尾
    EndOfInput,
}

/// 一行的记录（行号从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRecord {
    pub line: usize,
    pub outcome: LineOutcome,
}

/// 被丢弃的组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedGroup {
    /// 组在文件中的序号（从 0 开始）
    pub ordinal: usize,
    /// 发现问题的行号
    pub line: usize,
    pub reason: DropReason,
}

/// 解析报告
///
/// 每个指令行都有记录；几何数据行只有在取默认值或被忽略时才记录。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub lines: Vec<LineRecord>,
    pub dropped: Vec<DroppedGroup>,
    /// 已交给 `VertexBufferFactory` 预处理的组下标
    pub prepared: Vec<usize>,
}

impl ParseReport {
    fn record(&mut self, line: usize, outcome: LineOutcome) {
        if let LineOutcome::Skipped(reason) = outcome {
            tracing::debug!(line, ?reason, "忽略行");
        }
        self.lines.push(LineRecord { line, outcome });
    }

    fn drop_group(&mut self, ordinal: usize, line: usize, reason: DropReason) {
        tracing::warn!(group = ordinal, line, ?reason, "丢弃网格组");
        self.dropped.push(DroppedGroup { ordinal, line, reason });
    }

    /// 指定行的处理结果
    pub fn outcome(&self, line: usize) -> Option<LineOutcome> {
        self.lines.iter().find(|r| r.line == line).map(|r| r.outcome)
    }

    pub fn accepted(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter().filter(|r| r.outcome == LineOutcome::Accepted)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines
            .iter()
            .filter(|r| matches!(r.outcome, LineOutcome::Skipped(_)))
    }

    pub fn defaulted(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines
            .iter()
            .filter(|r| matches!(r.outcome, LineOutcome::Defaulted(_)))
    }

    /// 没有任何行被忽略或取默认值，也没有组被丢弃
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
            && self.lines.iter().all(|r| r.outcome == LineOutcome::Accepted)
    }
}

/// 解析结果：网格和报告
#[derive(Debug, Clone)]
pub struct ParsedMesh {
    pub mesh: Mesh,
    pub report: ParseReport,
}

/// 静态组的顶点缓冲区预处理
///
/// 投射阴影的组在加载完成后会交给它，实现方可以借此提前准备 GPU 缓冲区。
pub trait VertexBufferFactory {
    /// 返回 false 表示不支持或未处理，解析照常进行
    fn prepare(&mut self, grp: usize, group: &Group) -> bool;
}

/// 不做任何预处理
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVertexBuffers;

impl VertexBufferFactory for NoVertexBuffers {
    fn prepare(&mut self, _grp: usize, _group: &Group) -> bool {
        false
    }
}

/// 带行号和回看能力的行游标
struct LineCursor<'a> {
    lines: Peekable<Enumerate<std::str::Lines<'a>>>,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate().peekable(),
        }
    }

    /// 下一行（行号从 1 开始）
    fn next(&mut self) -> Option<(usize, &'a str)> {
        self.lines.next().map(|(i, line)| (i + 1, line))
    }

    /// 跳过空行后查看下一行，不消费它
    fn peek_non_blank(&mut self) -> Option<(usize, &'a str)> {
        while let Some(&(_, line)) = self.lines.peek() {
            if !line.trim().is_empty() {
                break;
            }
            self.lines.next();
        }
        self.lines.peek().map(|&(i, line)| (i + 1, line))
    }
}

/// 不区分大小写的关键字前缀匹配，返回关键字之后的部分
fn keyword<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let line = line.trim_start();
    let n = kw.len();
    if line.len() >= n && line.as_bytes()[..n].eq_ignore_ascii_case(kw.as_bytes()) {
        Some(&line[n..])
    } else {
        None
    }
}

/// 顺序读取最多 `max` 个浮点数，遇到第一个无法解析的字段即停止
fn scan_floats(s: &str, max: usize) -> Vec<f32> {
    s.split_whitespace()
        .take(max)
        .map_while(|t| t.parse::<f32>().ok())
        .collect()
}

/// 顺序读取最多 `max` 个整数
fn scan_ints(s: &str, max: usize) -> Vec<i64> {
    s.split_whitespace()
        .take(max)
        .map_while(|t| t.parse::<i64>().ok())
        .collect()
}

fn first_token(s: &str) -> Option<&str> {
    s.split_whitespace().next()
}

fn fill_outcome(expected: usize, found: usize) -> LineOutcome {
    if found >= expected {
        LineOutcome::Accepted
    } else {
        LineOutcome::Defaulted(DefaultReason::MissingFields { expected, found })
    }
}

/// 当前组块中由指令设置的属性
struct GroupHeader {
    material: IndexRef,
    texture: IndexRef,
    z_bias: u16,
    flags: GroupFlags,
    user_flag: u32,
    label: String,
    has_normals: bool,
    needs_normals: bool,
    flip: bool,
}

impl GroupHeader {
    fn new(static_mesh: bool) -> Self {
        Self {
            material: IndexRef::Inherit,
            texture: IndexRef::Inherit,
            z_bias: 0,
            flags: if static_mesh {
                GroupFlags::CAST_SHADOW
            } else {
                GroupFlags::empty()
            },
            user_flag: 0,
            label: String::new(),
            has_normals: true,
            needs_normals: false,
            flip: false,
        }
    }
}

/// 1 起始的材质/纹理编号；0 表示默认
fn parse_reference(rest: &str) -> std::result::Result<IndexRef, SkipReason> {
    match scan_ints(rest, 1).first() {
        None if first_token(rest).is_none() => Err(SkipReason::MissingValue),
        None => Err(SkipReason::MalformedValue),
        Some(&n) if n < 0 => Err(SkipReason::NegativeReference),
        Some(0) => Ok(IndexRef::Default),
        Some(&n) => u32::try_from(n - 1)
            .map(IndexRef::Explicit)
            .map_err(|_| SkipReason::MalformedValue),
    }
}

fn parse_hex(rest: &str) -> std::result::Result<u32, SkipReason> {
    let token = first_token(rest).ok_or(SkipReason::MissingValue)?;
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).map_err(|_| SkipReason::MalformedValue)
}

/// 单个组块的解析结果
enum GroupBlock {
    /// 组块结束，继续下一个组
    Done,
    /// 输入结束
    EndOfInput,
}

/// MSHX1 解析器
///
/// # 使用示例
///
/// ```rust
/// use msh_convert::geometry::loaders::msh_loader::MshParser;
///
/// let text = "MSHX1\nGROUPS 1\nGEOM 3 1\n0 0 0 0 0 1 0 0\n1 0 0 0 0 1 1 0\n0 1 0 0 0 1 0 1\n0 1 2\n";
/// let parsed = MshParser::new().parse_str(text).unwrap();
/// assert_eq!(parsed.mesh.group_count(), 1);
/// assert!(parsed.report.is_clean());
/// ```
pub struct MshParser<F = NoVertexBuffers> {
    factory: F,
}

impl MshParser<NoVertexBuffers> {
    pub fn new() -> Self {
        Self {
            factory: NoVertexBuffers,
        }
    }
}

impl Default for MshParser<NoVertexBuffers> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: VertexBufferFactory> MshParser<F> {
    /// 使用自定义的顶点缓冲区预处理
    pub fn with_factory(factory: F) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn into_factory(self) -> F {
        self.factory
    }

    /// 解析整段文本
    pub fn parse_str(&mut self, text: &str) -> Result<ParsedMesh> {
        let mut lines = LineCursor::new(text);
        let mut mesh = Mesh::new();
        let mut report = ParseReport::default();

        let first = lines.next().map(|(_, l)| l).unwrap_or("");
        if first.trim_end() != MAGIC {
            return Err(ParseError::BadMagic {
                found: first.trim_end().to_string(),
            }
            .into());
        }

        let mut static_mesh = false;
        let group_count = loop {
            let Some((n, line)) = lines.next() else {
                tracing::debug!("在 GROUPS 之前到达输入末尾，网格为空");
                return Ok(ParsedMesh { mesh, report });
            };

            if let Some(rest) = keyword(line, "GROUPS") {
                match scan_ints(rest, 1).first() {
                    Some(&count) if count >= 0 => {
                        report.record(n, LineOutcome::Accepted);
                        break count as usize;
                    }
                    _ => {
                        return Err(ParseError::BadGroupCount {
                            line: n,
                            text: line.to_string(),
                        }
                        .into());
                    }
                }
            } else if keyword(line, "STATICMESH").is_some() {
                static_mesh = true;
                report.record(n, LineOutcome::Accepted);
            } else if !line.trim().is_empty() {
                report.record(n, LineOutcome::Skipped(SkipReason::UnknownDirective));
            }
        };

        for ordinal in 0..group_count {
            match self.parse_group(&mut lines, ordinal, static_mesh, &mut mesh, &mut report) {
                GroupBlock::Done => {}
                GroupBlock::EndOfInput => break,
            }
        }

        Self::parse_materials(&mut lines, &mut mesh, &mut report);
        Self::parse_textures(&mut lines, &mut mesh, &mut report);

        mesh.recompute_derived();

        tracing::info!(
            groups = mesh.group_count(),
            materials = mesh.material_count(),
            textures = mesh.texture_count(),
            dropped = report.dropped.len(),
            skipped = report.skipped().count(),
            "MSHX1 解析完成"
        );

        Ok(ParsedMesh { mesh, report })
    }

    fn parse_group(
        &mut self,
        lines: &mut LineCursor<'_>,
        ordinal: usize,
        static_mesh: bool,
        mesh: &mut Mesh,
        report: &mut ParseReport,
    ) -> GroupBlock {
        let mut header = GroupHeader::new(static_mesh);

        // 指令行，直到 GEOM
        let (geom_line, nvtx, ntri) = loop {
            let Some((n, line)) = lines.next() else {
                report.drop_group(ordinal, 0, DropReason::EndOfInput);
                return GroupBlock::EndOfInput;
            };

            let outcome = if let Some(rest) = keyword(line, "MATERIAL") {
                parse_reference(rest).map(|r| header.material = r)
            } else if let Some(rest) = keyword(line, "TEXTURE") {
                parse_reference(rest).map(|r| header.texture = r)
            } else if let Some(rest) = keyword(line, "ZBIAS") {
                match first_token(rest) {
                    None => Err(SkipReason::MissingValue),
                    Some(t) => t
                        .parse::<u16>()
                        .map(|z| header.z_bias = z)
                        .map_err(|_| SkipReason::MalformedValue),
                }
            } else if let Some(rest) = keyword(line, "TEXWRAP") {
                first_token(rest).ok_or(SkipReason::MissingValue).map(|uv| {
                    if uv.contains('U') {
                        header.flags.insert(GroupFlags::WRAP_U);
                    }
                    if uv.contains('V') {
                        header.flags.insert(GroupFlags::WRAP_V);
                    }
                })
            } else if keyword(line, "NONORMAL").is_some() {
                header.has_normals = false;
                header.needs_normals = true;
                Ok(())
            } else if let Some(rest) = keyword(line, "FLAG") {
                parse_hex(rest).map(|f| header.user_flag = f)
            } else if keyword(line, "FLIP").is_some() {
                header.flip = true;
                Ok(())
            } else if let Some(rest) = keyword(line, "LABEL") {
                first_token(rest)
                    .ok_or(SkipReason::MissingValue)
                    .map(|l| header.label = l.to_string())
            } else if keyword(line, "STATIC").is_some() {
                header.flags.insert(GroupFlags::CAST_SHADOW);
                Ok(())
            } else if keyword(line, "DYNAMIC").is_some() {
                header.flags.toggle(GroupFlags::CAST_SHADOW);
                Ok(())
            } else if let Some(rest) = keyword(line, "GEOM") {
                match scan_ints(rest, 2).as_slice() {
                    &[nv, nt] if nv >= 0 && nt >= 0 => {
                        report.record(n, LineOutcome::Accepted);
                        let count = |c: i64| usize::try_from(c).unwrap_or(usize::MAX);
                        break (n, count(nv), count(nt));
                    }
                    _ => {
                        report.record(n, LineOutcome::Skipped(SkipReason::MalformedValue));
                        report.drop_group(ordinal, n, DropReason::BadGeom);
                        return GroupBlock::Done;
                    }
                }
            } else if line.trim().is_empty() {
                continue;
            } else {
                Err(SkipReason::UnknownDirective)
            };

            match outcome {
                Ok(()) => report.record(n, LineOutcome::Accepted),
                Err(reason) => report.record(n, LineOutcome::Skipped(reason)),
            }
        };

        if nvtx > MAX_GROUP_VERTICES {
            // 仍需消费声明的行，保持后续组的同步
            for _ in 0..nvtx.saturating_add(ntri) {
                if lines.next().is_none() {
                    break;
                }
            }
            report.drop_group(ordinal, geom_line, DropReason::TooManyVertices(nvtx));
            return GroupBlock::Done;
        }

        // 顶点行
        let expected = if header.has_normals { 8 } else { 5 };
        let mut vertices = Vec::with_capacity(nvtx);
        for _ in 0..nvtx {
            let Some((n, line)) = lines.next() else {
                report.drop_group(ordinal, geom_line, DropReason::Truncated);
                return GroupBlock::EndOfInput;
            };

            let mut f = scan_floats(line, expected);
            let found = f.len();
            f.resize(expected, 0.0);

            let vertex = if header.has_normals {
                if found < 6 {
                    header.needs_normals = true;
                }
                Vertex::new([f[0], f[1], f[2]], [f[3], f[4], f[5]], [f[6], f[7]])
            } else {
                Vertex::new([f[0], f[1], f[2]], [0.0, 0.0, 0.0], [f[3], f[4]])
            };
            vertices.push(vertex);

            if found < expected {
                report.record(n, fill_outcome(expected, found));
            }
        }

        // 索引行
        let mut indices = Vec::with_capacity(ntri.saturating_mul(3).min(MAX_RESERVED_INDICES));
        let mut bad_index = None;
        for _ in 0..ntri {
            let Some((n, line)) = lines.next() else {
                report.drop_group(ordinal, geom_line, DropReason::Truncated);
                return GroupBlock::EndOfInput;
            };

            let mut tri = scan_ints(line, 3);
            let found = tri.len();
            tri.resize(3, 0);

            for &index in &tri {
                if index < 0 || index as usize >= nvtx {
                    bad_index.get_or_insert((n, index));
                }
                indices.push(index.clamp(0, u16::MAX as i64) as u16);
            }

            if found < 3 {
                report.record(n, fill_outcome(3, found));
            }
        }

        if let Some((n, index)) = bad_index {
            report.drop_group(
                ordinal,
                n,
                DropReason::IndexOutOfRange {
                    index,
                    vertex_count: nvtx,
                },
            );
            return GroupBlock::Done;
        }

        if header.flip {
            for triangle in indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }

        if vertices.is_empty() || indices.is_empty() {
            report.drop_group(ordinal, geom_line, DropReason::Empty);
            return GroupBlock::Done;
        }

        if header.needs_normals {
            calc_normals(&mut vertices, &indices, true);
        }

        let group = Group::new(vertices, indices)
            .with_material(header.material)
            .with_texture(header.texture)
            .with_z_bias(header.z_bias)
            .with_flags(header.flags)
            .with_user_flag(header.user_flag)
            .with_label(header.label);

        let grp = mesh.add_group(group);
        tracing::debug!(
            group = grp,
            vertices = nvtx,
            triangles = ntri,
            synthesized_normals = header.needs_normals,
            "添加网格组"
        );

        if header.flags.contains(GroupFlags::CAST_SHADOW) {
            if let Some(group) = mesh.group(grp) {
                if self.factory.prepare(grp, group) {
                    report.prepared.push(grp);
                }
            }
        }

        GroupBlock::Done
    }

    /// 可选的 `MATERIALS <n>` 块
    ///
    /// 先是 n 行材质名，再是 n 个材质：一行 `MATERIAL <name>` 加四行颜色
    /// （漫反射 rgba、环境光 rgba、高光 rgba + 指数、自发光 rgba）。
    fn parse_materials(lines: &mut LineCursor<'_>, mesh: &mut Mesh, report: &mut ParseReport) {
        let Some((n, line)) = lines.peek_non_blank() else {
            return;
        };
        let Some(rest) = keyword(line, "MATERIALS") else {
            return;
        };
        lines.next();

        let count = match scan_ints(rest, 1).first() {
            Some(&c) if c >= 0 => c as usize,
            _ => {
                report.record(n, LineOutcome::Skipped(SkipReason::MalformedValue));
                return;
            }
        };
        report.record(n, LineOutcome::Accepted);

        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            let Some((_, name)) = lines.next() else {
                return;
            };
            names.push(name.trim().to_string());
        }

        for name in names {
            let Some((n, header)) = lines.next() else {
                return;
            };
            let outcome = if keyword(header, "MATERIAL").is_some() {
                LineOutcome::Accepted
            } else {
                LineOutcome::Skipped(SkipReason::UnknownDirective)
            };
            report.record(n, outcome);

            let mut channels = [[0.0f32; 5]; 4];
            let mut found = [0usize; 4];
            for (k, width) in [4usize, 4, 5, 4].into_iter().enumerate() {
                let Some((n, line)) = lines.next() else {
                    tracing::debug!(material = %name, "材质不完整，未添加");
                    return;
                };
                let values = scan_floats(line, width);
                found[k] = values.len();
                channels[k][..values.len()].copy_from_slice(&values);
                if values.len() < width {
                    report.record(n, fill_outcome(width, values.len()));
                }
            }

            let alpha_of = |k: usize, fallback: f32| if found[k] >= 4 { channels[k][3] } else { fallback };
            let diffuse_alpha = alpha_of(0, 1.0);
            let rgba = |k: usize| {
                [channels[k][0], channels[k][1], channels[k][2], alpha_of(k, diffuse_alpha)]
            };

            let material = Material {
                diffuse: rgba(0),
                ambient: rgba(1),
                specular: rgba(2),
                emissive: rgba(3),
                power: if found[2] >= 5 { channels[2][4] } else { 0.0 },
                name,
            };
            mesh.add_material(material);
        }
    }

    /// 可选的 `TEXTURES <n>` 块，每行 `<文件名> [标志]`
    fn parse_textures(lines: &mut LineCursor<'_>, mesh: &mut Mesh, report: &mut ParseReport) {
        let Some((n, line)) = lines.peek_non_blank() else {
            return;
        };
        let Some(rest) = keyword(line, "TEXTURES") else {
            return;
        };
        lines.next();

        let count = match scan_ints(rest, 1).first() {
            Some(&c) if c >= 0 => c as usize,
            _ => {
                report.record(n, LineOutcome::Skipped(SkipReason::MalformedValue));
                return;
            }
        };
        report.record(n, LineOutcome::Accepted);

        for _ in 0..count {
            let Some((n, line)) = lines.next() else {
                return;
            };
            let mut tokens = line.split_whitespace();
            let name = match tokens.next() {
                Some("0") => "",
                Some(name) => name,
                None => {
                    report.record(n, fill_outcome(1, 0));
                    ""
                }
            };
            let prefer_uncompressed = tokens
                .next()
                .map_or(false, |flag| flag.starts_with(['D', 'd']));

            mesh.add_texture(Texture {
                name: name.to_string(),
                prefer_uncompressed,
            });
        }
    }
}

/// MSHX1 格式加载器
///
/// 实现 `MeshLoader` trait；需要解析报告时使用 `load_with_report`。
///
/// ```rust,no_run
/// use msh_convert::geometry::loaders::{MeshLoader, MshLoader};
/// use std::path::Path;
///
/// let mesh = MshLoader::load_from_file(Path::new("model.msh"))?;
/// println!("加载了 {} 个组", mesh.group_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MshLoader;

impl MshLoader {
    /// 读取文件并返回网格和解析报告
    pub fn load_with_report(path: &Path) -> Result<ParsedMesh> {
        if !path.exists() {
            return Err(ParseError::FileNotFound(path.to_path_buf()).into());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ParseError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "读取 MSHX1 文件");
        MshParser::new().parse_str(&text)
    }
}

impl MeshLoader for MshLoader {
    fn load_from_file(path: &Path) -> Result<Mesh> {
        Self::load_with_report(path).map(|parsed| parsed.mesh)
    }

    fn load_from_memory(data: &[u8]) -> Result<Mesh> {
        let text = String::from_utf8_lossy(data);
        MshParser::new().parse_str(&text).map(|parsed| parsed.mesh)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["msh"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MshError;

    const TRIANGLE: &str = "\
MSHX1
GROUPS 1
GEOM 3 1
0 0 0 0 0 1 0 0
1 0 0 0 0 1 1 0
0 1 0 0 0 1 0 1
0 1 2
";

    fn parse(text: &str) -> ParsedMesh {
        MshParser::new().parse_str(text).unwrap()
    }

    #[test]
    fn test_supported_extensions() {
        assert!(MshLoader::supported_extensions().contains(&"msh"));
    }

    #[test]
    fn test_minimal_triangle() {
        let parsed = parse(TRIANGLE);
        let mesh = &parsed.mesh;

        assert_eq!(mesh.group_count(), 1);
        assert_eq!(mesh.material_count(), 0);
        assert_eq!(mesh.texture_count(), 0);
        assert!(mesh.has_valid_derived());

        let group = mesh.group(0).unwrap();
        assert_eq!(group.vertex_count(), 3);
        assert_eq!(group.indices, vec![0, 1, 2]);
        assert_eq!(group.material, IndexRef::Inherit);
        assert_eq!(group.vertices[1].texcoord, [1.0, 0.0]);
        assert!(parsed.report.is_clean());
    }

    #[test]
    fn test_index_counts_and_ranges() {
        let text = "\
MSHX1
GROUPS 1
GEOM 4 2
0 0 0 0 1 0 0 0
1 0 0 0 1 0 1 0
1 0 1 0 1 0 1 1
0 0 1 0 1 0 0 1
0 2 1
0 3 2
";
        let group = parse(text).mesh.group(0).unwrap().clone();
        assert_eq!(group.index_count(), 3 * 2);
        assert!(group.indices.iter().all(|&i| (i as usize) < 4));
    }

    #[test]
    fn test_bad_magic() {
        let err = MshParser::new().parse_str("MSHX2\nGROUPS 0\n").unwrap_err();
        assert!(matches!(err, MshError::Parse(ParseError::BadMagic { .. })));
        assert_eq!(err.exit_code(), 4);

        assert!(MshParser::new().parse_str("").is_err());
    }

    #[test]
    fn test_magic_allows_trailing_whitespace() {
        let text = TRIANGLE.replacen("MSHX1", "MSHX1  \r", 1);
        assert_eq!(parse(&text).mesh.group_count(), 1);
    }

    #[test]
    fn test_bad_group_count() {
        let err = MshParser::new().parse_str("MSHX1\nGROUPS many\n").unwrap_err();
        assert!(matches!(err, MshError::Parse(ParseError::BadGroupCount { line: 2, .. })));
    }

    #[test]
    fn test_eof_before_groups_is_empty() {
        let parsed = parse("MSHX1\nSTATICMESH\n");
        assert_eq!(parsed.mesh.group_count(), 0);
    }

    #[test]
    fn test_group_directives() {
        let text = "\
MSHX1
GROUPS 1
material 2
TEXTURE 0
ZBIAS 3
TEXWRAP UV
FLAG 0x1F
LABEL hull extra
STATIC
GEOM 3 1
0 0 0 0 0 1 0 0
1 0 0 0 0 1 1 0
0 1 0 0 0 1 0 1
0 1 2
MATERIALS 2
red
blue
MATERIAL red
1 0 0 1
1 0 0 1
0 0 0 1 5
0 0 0 1
MATERIAL blue
0 0 1 1
0 0 1 1
0 0 0 1 5
0 0 0 1
";
        let parsed = parse(text);
        let group = parsed.mesh.group(0).unwrap();

        assert_eq!(group.material, IndexRef::Explicit(1));
        assert_eq!(group.texture, IndexRef::Default);
        assert_eq!(group.z_bias, 3);
        assert_eq!(
            group.flags,
            GroupFlags::WRAP_U | GroupFlags::WRAP_V | GroupFlags::CAST_SHADOW
        );
        assert_eq!(group.user_flag, 0x1F);
        assert_eq!(group.label, "hull");
        assert_eq!(parsed.report.outcome(3), Some(LineOutcome::Accepted));
    }

    #[test]
    fn test_static_mesh_and_dynamic_toggle() {
        let text = "\
MSHX1
STATICMESH
GROUPS 2
GEOM 3 1
0 0 0 0 0 1 0 0
1 0 0 0 0 1 1 0
0 1 0 0 0 1 0 1
0 1 2
DYNAMIC
GEOM 3 1
0 0 0 0 0 1 0 0
1 0 0 0 0 1 1 0
0 1 0 0 0 1 0 1
0 1 2
";
        let mesh = parse(text).mesh;
        assert!(mesh.group(0).unwrap().flags.contains(GroupFlags::CAST_SHADOW));
        assert!(!mesh.group(1).unwrap().flags.contains(GroupFlags::CAST_SHADOW));

        // 非静态网格中 DYNAMIC 反而设置阴影位
        let toggled = parse(&text.replace("STATICMESH\n", "")).mesh;
        assert!(!toggled.group(0).unwrap().flags.contains(GroupFlags::CAST_SHADOW));
        assert!(toggled.group(1).unwrap().flags.contains(GroupFlags::CAST_SHADOW));
    }

    #[test]
    fn test_nonormal_synthesizes_normals() {
        let text = "\
MSHX1
GROUPS 1
NONORMAL
GEOM 3 1
0 0 0 0 0
1 0 0 1 0
0 1 0 0 1
0 1 2
";
        let mesh = parse(text).mesh;
        let group = mesh.group(0).unwrap();
        for v in &group.vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-5);
        }
        assert_eq!(group.vertices[2].texcoord, [0.0, 1.0]);
    }

    #[test]
    fn test_short_vertex_line_forces_synthesis() {
        let text = "\
MSHX1
GROUPS 1
GEOM 3 1
0 0 0 0 0 1 0 0
1 0 0
0 1 0 0 0 1 0 1
0 1 2
";
        let parsed = parse(text);
        let group = parsed.mesh.group(0).unwrap();

        assert!((group.vertices[1].normal[2] - 1.0).abs() < 1e-5);
        // 已有的法线保持不变
        assert_eq!(group.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(
            parsed.report.outcome(5),
            Some(LineOutcome::Defaulted(DefaultReason::MissingFields {
                expected: 8,
                found: 3
            }))
        );
    }

    #[test]
    fn test_flip_swaps_winding() {
        let text = TRIANGLE.replace("GEOM 3 1", "FLIP\nGEOM 3 1");
        let group = parse(&text).mesh.group(0).unwrap().clone();
        assert_eq!(group.indices, vec![0, 2, 1]);
    }

    #[test]
    fn test_out_of_range_index_drops_group() {
        let text = TRIANGLE.replace("0 1 2", "0 1 3");
        let parsed = parse(&text);
        assert_eq!(parsed.mesh.group_count(), 0);
        assert!(matches!(
            parsed.report.dropped[0].reason,
            DropReason::IndexOutOfRange { index: 3, vertex_count: 3 }
        ));
    }

    #[test]
    fn test_truncated_group_is_dropped() {
        let text = "\
MSHX1
GROUPS 2
GEOM 3 1
0 0 0 0 0 1 0 0
1 0 0 0 0 1 1 0
0 1 0 0 0 1 0 1
0 1 2
GEOM 3 1
0 0 0 0 0 1 0 0
";
        let parsed = parse(text);
        assert_eq!(parsed.mesh.group_count(), 1);
        assert_eq!(parsed.report.dropped.len(), 1);
        assert_eq!(parsed.report.dropped[0].ordinal, 1);
        assert_eq!(parsed.report.dropped[0].reason, DropReason::Truncated);
    }

    #[test]
    fn test_huge_triangle_count_is_truncated() {
        for count in ["100000000000", "4000000000000000000"] {
            let text = format!(
                "MSHX1\nGROUPS 1\nGEOM 3 {}\n0 0 0 0 0 1 0 0\n1 0 0 0 0 1 1 0\n0 1 0 0 0 1 0 1\n0 1 2\n",
                count
            );
            let parsed = parse(&text);
            assert_eq!(parsed.mesh.group_count(), 0);
            assert_eq!(parsed.report.dropped.len(), 1);
            assert_eq!(parsed.report.dropped[0].reason, DropReason::Truncated);
        }
    }

    #[test]
    fn test_huge_vertex_count_is_dropped() {
        let text = "MSHX1\nGROUPS 1\nGEOM 9000000000000000000 9000000000000000000\n0 0 0\n";
        let parsed = parse(text);
        assert_eq!(parsed.mesh.group_count(), 0);
        assert_eq!(
            parsed.report.dropped[0].reason,
            DropReason::TooManyVertices(9_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_bad_geom_skips_only_that_group() {
        let text = format!("MSHX1\nGROUPS 2\nGEOM x y\n{}", &TRIANGLE["MSHX1\nGROUPS 1\n".len()..]);
        let parsed = parse(&text);
        assert_eq!(parsed.mesh.group_count(), 1);
        assert_eq!(parsed.report.dropped[0].reason, DropReason::BadGeom);
        assert_eq!(
            parsed.report.outcome(3),
            Some(LineOutcome::Skipped(SkipReason::MalformedValue))
        );
    }

    #[test]
    fn test_empty_group_not_added() {
        let text = "MSHX1\nGROUPS 2\nGEOM 0 0\nGEOM 3 1\n0 0 0\n1 0 0\n0 1 0\n0 1 2\n";
        let parsed = parse(text);
        assert_eq!(parsed.mesh.group_count(), 1);
        assert_eq!(parsed.report.dropped[0].reason, DropReason::Empty);
    }

    #[test]
    fn test_unknown_and_malformed_directives() {
        let text = TRIANGLE.replace(
            "GEOM 3 1",
            "SHININESS 4\nZBIAS high\nMATERIAL -2\nGEOM 3 1",
        );
        let parsed = parse(&text);
        let report = &parsed.report;

        assert_eq!(report.outcome(3), Some(LineOutcome::Skipped(SkipReason::UnknownDirective)));
        assert_eq!(report.outcome(4), Some(LineOutcome::Skipped(SkipReason::MalformedValue)));
        assert_eq!(report.outcome(5), Some(LineOutcome::Skipped(SkipReason::NegativeReference)));
        assert_eq!(report.skipped().count(), 3);
        assert_eq!(parsed.mesh.group_count(), 1);
        assert_eq!(parsed.mesh.group(0).unwrap().material, IndexRef::Inherit);
    }

    #[test]
    fn test_materials_block() {
        let text = format!(
            "{}MATERIALS 2\nsteel plate\nglass\nMATERIAL steel\n0.5 0.5 0.5 0.8\n0.2 0.2 0.2\n1 1 1 1 20\n0 0 0\nMATERIAL glass\n0 0 1\n0 0 0 0\n0 0 0 0\n0 0 0 0\n",
            TRIANGLE
        );
        let parsed = parse(&text);
        let mesh = &parsed.mesh;
        assert_eq!(mesh.material_count(), 2);

        let steel = mesh.material(0).unwrap();
        assert_eq!(steel.name, "steel plate");
        assert_eq!(steel.diffuse, [0.5, 0.5, 0.5, 0.8]);
        // 缺失的 alpha 取漫反射 alpha
        assert_eq!(steel.ambient, [0.2, 0.2, 0.2, 0.8]);
        assert_eq!(steel.specular, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(steel.power, 20.0);
        assert_eq!(steel.emissive, [0.0, 0.0, 0.0, 0.8]);

        let glass = mesh.material(1).unwrap();
        assert_eq!(glass.diffuse, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(glass.power, 0.0);
    }

    #[test]
    fn test_truncated_material_not_added() {
        let text = format!("{}MATERIALS 1\nsteel\nMATERIAL steel\n1 1 1 1\n", TRIANGLE);
        assert_eq!(parse(&text).mesh.material_count(), 0);
    }

    #[test]
    fn test_textures_block_without_materials() {
        let text = format!("{}\nTEXTURES 3\nhull.dds D\n0\nglass.dds\n", TRIANGLE);
        let mesh = parse(&text).mesh;

        assert_eq!(mesh.texture_count(), 3);
        assert_eq!(mesh.texture_name(0), Some("hull.dds"));
        assert!(mesh.textures()[0].prefer_uncompressed);
        assert_eq!(mesh.texture_name(1), Some(""));
        assert!(!mesh.textures()[2].prefer_uncompressed);
    }

    #[test]
    fn test_out_of_range_material_reconciled() {
        let text = TRIANGLE.replace("GEOM 3 1", "MATERIAL 4\nGEOM 3 1");
        let mesh = parse(&text).mesh;
        assert_eq!(mesh.group(0).unwrap().material, IndexRef::Default);
    }

    struct Recorder(Vec<usize>);

    impl VertexBufferFactory for Recorder {
        fn prepare(&mut self, grp: usize, _group: &Group) -> bool {
            self.0.push(grp);
            true
        }
    }

    #[test]
    fn test_static_groups_reach_factory() {
        let text = TRIANGLE.replace("GEOM 3 1", "STATIC\nGEOM 3 1");
        let mut parser = MshParser::with_factory(Recorder(Vec::new()));
        let parsed = parser.parse_str(&text).unwrap();

        assert_eq!(parsed.report.prepared, vec![0]);
        assert_eq!(parser.into_factory().0, vec![0]);

        // 默认实现不处理任何组
        let parsed = parse(&text);
        assert!(parsed.report.prepared.is_empty());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let err = MshLoader::load_from_file(Path::new("nonexistent.msh")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_load_from_memory() {
        let mesh = MshLoader::load_from_memory(TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.group_count(), 1);
    }
}
