//! 转换流程
//!
//! MSHX1 文本 → `Mesh` → CMSH 二进制。
//!
//! ```text
//! MshLoader::load_with_report ──→ 检查组数 ──→ CmshWriter::write_file
//!          │                                          │
//!          └── ParseReport（忽略的行、丢弃的组）        └── 写出字节数
//! ```

use std::path::{Path, PathBuf};

use crate::core::error::{ExportError, Result};
use crate::export::{CmshWriter, ExportOptions, MeshWriter};
use crate::geometry::loaders::msh_loader::{MshLoader, ParseReport};
use crate::geometry::mesh::{IndexRef, Mesh};
use crate::{convert_info, convert_warn};

/// 一次转换的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub groups: usize,
    pub materials: usize,
    pub textures: usize,
    /// 写出的字节数
    pub bytes: usize,
    pub report: ParseReport,
}

fn describe_ref(r: IndexRef) -> String {
    match r {
        IndexRef::Explicit(i) => i.to_string(),
        IndexRef::Default => "default".to_string(),
        IndexRef::Inherit => "inherit".to_string(),
    }
}

fn log_mesh(mesh: &Mesh) {
    convert_info!(
        groups = mesh.group_count(),
        materials = mesh.material_count(),
        textures = mesh.texture_count(),
        "网格统计"
    );

    for (i, group) in mesh.groups().iter().enumerate() {
        convert_info!(
            group = i,
            label = %group.label,
            material = %describe_ref(group.material),
            texture = %describe_ref(group.texture),
            vertices = group.vertex_count(),
            indices = group.index_count(),
            "网格组"
        );
    }
}

fn log_report(report: &ParseReport) {
    for dropped in &report.dropped {
        convert_warn!(
            group = dropped.ordinal,
            line = dropped.line,
            reason = ?dropped.reason,
            "组未被转换"
        );
    }

    let skipped = report.skipped().count();
    if skipped > 0 {
        convert_warn!(lines = skipped, "部分行被忽略");
    }
}

/// 导出已有的网格
///
/// 没有任何组的网格视为转换失败，不会创建输出文件。
pub fn export_mesh(mesh: &Mesh, output: &Path, options: &ExportOptions) -> Result<usize> {
    if mesh.group_count() == 0 {
        return Err(ExportError::EmptyMesh.into());
    }

    log_mesh(mesh);
    CmshWriter::write_file(mesh, options, output)
}

/// 转换单个文件
///
/// # 错误
///
/// - 输入文件不存在或无法读取
/// - 结构性解析错误（魔数、`GROUPS`）
/// - 结果网格不包含任何组
/// - 校验失败
/// - 输出文件无法写入
pub fn convert_file(input: &Path, output: &Path, options: &ExportOptions) -> Result<ConversionSummary> {
    convert_info!(input = %input.display(), output = %output.display(), "开始转换");

    let parsed = MshLoader::load_with_report(input)?;
    log_report(&parsed.report);

    let mesh = parsed.mesh;
    let bytes = export_mesh(&mesh, output, options)?;

    convert_info!(bytes, "转换完成");

    Ok(ConversionSummary {
        output: output.to_path_buf(),
        groups: mesh.group_count(),
        materials: mesh.material_count(),
        textures: mesh.texture_count(),
        bytes,
        report: parsed.report,
    })
}
