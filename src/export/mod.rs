//! 导出模块
//!
//! 把 `Mesh` 写成二进制资源文件。
//!
//! # 支持的格式
//!
//! - **CMSH**: `_CMSHX1_` 定长小端二进制格式

use crate::core::error::{ExportError, Result};
use crate::geometry::mesh::Mesh;
use std::io::Write;
use std::path::Path;

pub mod cmsh;

pub use cmsh::CmshWriter;

/// 导出选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// 顶点按 位置/法线/纹理坐标 交错存储；否则为三个并列数组
    pub flatten_vertices: bool,

    /// 写出材质名称
    pub material_names: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            flatten_vertices: false,
            material_names: true,
        }
    }
}

/// 网格写出器 trait
///
/// 与 `MeshLoader` 对应。`encode` 是纯函数：同样的网格和选项总是得到同样的字节。
pub trait MeshWriter {
    /// 编码为字节序列
    ///
    /// 网格校验失败时返回错误，不产生任何字节。
    fn encode(mesh: &Mesh, options: &ExportOptions) -> Result<Vec<u8>>;

    /// 输出文件的默认扩展名（不含点号）
    fn extension() -> &'static str;

    /// 编码后写入任意 `Write`
    fn write_to<W: Write>(mesh: &Mesh, options: &ExportOptions, mut writer: W) -> Result<()> {
        let bytes = Self::encode(mesh, options)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// 编码后写入文件
    ///
    /// 先完成编码再创建文件，校验失败时不会留下输出文件。
    fn write_file(mesh: &Mesh, options: &ExportOptions, path: &Path) -> Result<usize> {
        let bytes = Self::encode(mesh, options)?;

        let unwritable = |e: std::io::Error| ExportError::OutputUnwritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut file = std::fs::File::create(path).map_err(unwritable)?;
        file.write_all(&bytes).map_err(unwritable)?;
        file.flush().map_err(unwritable)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "写出文件");
        Ok(bytes.len())
    }
}
