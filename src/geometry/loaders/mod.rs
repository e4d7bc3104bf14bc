/// 网格加载器模块
///
/// 提供统一的网格加载接口和具体格式的实现。
///
/// # 支持的格式
///
/// - **MSH**: MSHX1 逐行文本格式
///
/// # 使用示例
///
/// ```rust,no_run
/// use msh_convert::geometry::loaders::{MeshLoader, MshLoader};
/// use std::path::Path;
///
/// let mesh = MshLoader::load_from_file(Path::new("model.msh"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
use crate::core::error::{ParseError, Result};
use crate::geometry::mesh::Mesh;
use std::path::Path;

pub mod msh_loader;

// 重新导出加载器
pub use msh_loader::{MshLoader, MshParser, ParseReport, ParsedMesh};

/// 网格加载器 trait
///
/// 定义统一的加载接口，所有格式的加载器都实现此 trait。
///
/// # 实现要求
///
/// - 加载器是无状态的（使用关联函数）
/// - 返回 CPU 侧的 `Mesh`
/// - 结构性错误返回错误；单行格式问题应尽量容忍
pub trait MeshLoader {
    /// 从文件路径加载网格
    ///
    /// # 错误
    ///
    /// - 文件不存在或无法读取
    /// - 文件格式的结构性错误
    fn load_from_file(path: &Path) -> Result<Mesh>;

    /// 从内存数据加载网格
    fn load_from_memory(data: &[u8]) -> Result<Mesh>;

    /// 支持的文件扩展名列表（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

/// 根据文件扩展名选择合适的加载器
///
/// ```rust,no_run
/// use msh_convert::geometry::loaders::load_mesh;
/// use std::path::Path;
///
/// let mesh = load_mesh(Path::new("model.msh"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_mesh(path: &Path) -> Result<Mesh> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ParseError::UnsupportedFormat("无法确定文件扩展名".to_string()))?;

    if MshLoader::supported_extensions().contains(&extension.as_str()) {
        MshLoader::load_from_file(path)
    } else {
        Err(ParseError::UnsupportedFormat(format!("不支持的文件格式: .{}", extension)).into())
    }
}
