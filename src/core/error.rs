//! 错误处理模块
//!
//! 定义了转换器中使用的统一错误类型。
//!
//! # 错误分类
//!
//! - `ConfigError`：配置文件或命令行参数错误
//! - `ParseError`：文本网格的结构性解析错误（魔数错误、`GROUPS` 无法解析）
//! - `GeometryError`：几何操作的参数错误（组索引越界、球面片参数无效）
//! - `ExportError`：导出前的校验失败或输出文件不可写
//!
//! 局部可恢复的解析问题（单行格式错误、截断的组）不会成为错误，
//! 而是记录在 `ParseReport` 中。

use std::fmt;
use std::path::PathBuf;

/// 转换器统一的 Result 类型
pub type Result<T> = std::result::Result<T, MshError>;

/// 转换器的错误类型
#[derive(Debug)]
pub enum MshError {
    /// 配置错误
    Config(ConfigError),

    /// 文本网格解析错误
    Parse(ParseError),

    /// 几何操作错误
    Geometry(GeometryError),

    /// 导出错误
    Export(ExportError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 文本网格解析错误
///
/// 只有会让整个加载过程中止的错误才出现在这里。
#[derive(Debug)]
pub enum ParseError {
    /// 输入文件不存在
    FileNotFound(PathBuf),

    /// 输入文件无法读取
    Unreadable { path: PathBuf, reason: String },

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 第一行不是 `MSHX1`
    BadMagic { found: String },

    /// `GROUPS` 指令后的数量无法解析
    BadGroupCount { line: usize, text: String },
}

/// 几何操作错误
#[derive(Debug)]
pub enum GeometryError {
    /// 组索引越界
    GroupOutOfRange { index: usize, count: usize },

    /// 球面片参数无效
    InvalidPatch(String),

    /// 组数据不满足索引约束，无法处理
    InvalidGroup { index: usize, reason: String },
}

/// 导出相关的错误
#[derive(Debug)]
pub enum ExportError {
    /// 网格不包含任何组
    EmptyMesh,

    /// 导出前的数据校验失败
    Validation(String),

    /// 输出文件无法创建或写入
    OutputUnwritable { path: PathBuf, reason: String },
}

impl MshError {
    /// 命令行使用的退出码
    ///
    /// | 退出码 | 含义 |
    /// |--------|------|
    /// | 1 | 配置错误或其他内部错误 |
    /// | 3 | 输入文件无法读取 |
    /// | 4 | 转换失败（结构性解析错误或网格为空） |
    /// | 5 | 输出文件无法写入 |
    /// | 10 | 校验失败 |
    pub fn exit_code(&self) -> i32 {
        match self {
            MshError::Parse(ParseError::FileNotFound(_))
            | MshError::Parse(ParseError::Unreadable { .. }) => 3,
            MshError::Parse(_) | MshError::Export(ExportError::EmptyMesh) => 4,
            MshError::Export(ExportError::OutputUnwritable { .. }) => 5,
            MshError::Export(ExportError::Validation(_)) => 10,
            _ => 1,
        }
    }
}

impl fmt::Display for MshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MshError::Config(e) => write!(f, "Configuration error: {}", e),
            MshError::Parse(e) => write!(f, "Mesh parse error: {}", e),
            MshError::Geometry(e) => write!(f, "Geometry error: {}", e),
            MshError::Export(e) => write!(f, "Export error: {}", e),
            MshError::Io(e) => write!(f, "IO error: {}", e),
            MshError::Log(msg) => write!(f, "Log error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FileNotFound(path) => write!(f, "Mesh file not found: {}", path.display()),
            ParseError::Unreadable { path, reason } => {
                write!(f, "Could not read '{}': {}", path.display(), reason)
            }
            ParseError::UnsupportedFormat(msg) => write!(f, "Unsupported mesh format: {}", msg),
            ParseError::BadMagic { found } => {
                write!(f, "Expected 'MSHX1' on the first line, found '{}'", found)
            }
            ParseError::BadGroupCount { line, text } => {
                write!(f, "Line {}: could not parse group count from '{}'", line, text)
            }
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::GroupOutOfRange { index, count } => {
                write!(f, "Group index {} out of range ({} groups)", index, count)
            }
            GeometryError::InvalidPatch(msg) => write!(f, "Invalid sphere patch: {}", msg),
            GeometryError::InvalidGroup { index, reason } => {
                write!(f, "Group {} is invalid: {}", index, reason)
            }
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptyMesh => write!(f, "Mesh contains no groups"),
            ExportError::Validation(msg) => write!(f, "Converted mesh failed validation: {}", msg),
            ExportError::OutputUnwritable { path, reason } => {
                write!(f, "Could not create '{}': {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for MshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MshError::Io(e) => Some(e),
            MshError::Config(e) => Some(e),
            MshError::Parse(e) => Some(e),
            MshError::Geometry(e) => Some(e),
            MshError::Export(e) => Some(e),
            MshError::Log(_) => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for ParseError {}
impl std::error::Error for GeometryError {}
impl std::error::Error for ExportError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for MshError {
    fn from(err: std::io::Error) -> Self {
        MshError::Io(err)
    }
}

impl From<ConfigError> for MshError {
    fn from(err: ConfigError) -> Self {
        MshError::Config(err)
    }
}

impl From<ParseError> for MshError {
    fn from(err: ParseError) -> Self {
        MshError::Parse(err)
    }
}

impl From<GeometryError> for MshError {
    fn from(err: GeometryError) -> Self {
        MshError::Geometry(err)
    }
}

impl From<ExportError> for MshError {
    fn from(err: ExportError) -> Self {
        MshError::Export(err)
    }
}
