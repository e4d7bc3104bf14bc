//! 配置管理模块
//!
//! 提供转换器配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (msh_convert.toml)
//!
//! ```toml
//! [output]
//! extension = "cmsh"
//! flatten_vertices = false   # 等价于 -s
//! material_names = true      # -m 会关闭它
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! log_file = "msh_convert.log"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::export::ExportOptions;

/// 转换器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 未指定输出路径时使用的扩展名（不含点号）
    #[serde(default = "default_extension")]
    pub extension: String,

    /// 顶点属性交错写入单个数组
    #[serde(default)]
    pub flatten_vertices: bool,

    /// 写入材质名称
    #[serde(default = "default_material_names")]
    pub material_names: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 一次命令行调用中给出的路径
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// 输入文件（位置参数或 `-i`）
    pub input: Option<PathBuf>,

    /// 输出文件（位置参数或 `-o`）
    pub output: Option<PathBuf>,
}

fn default_extension() -> String { "cmsh".to_string() }
fn default_material_names() -> bool { true }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "msh_convert.log".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            flatten_vertices: false,
            material_names: default_material_names(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 第一个参数视为程序名并跳过。
    ///
    /// 支持的参数：
    /// - `-i <path>`: 输入文件
    /// - `-o <path>`: 输出文件
    /// - `-s`: 顶点属性交错写入单个数组
    /// - `-m`: 不保留材质名称
    ///
    /// 其余参数依次作为输入、输出路径；多出的参数被忽略。
    pub fn apply_args<I>(&mut self, args: I) -> Invocation
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().skip(1).map(|s| s.as_ref().to_string()).collect();
        let mut invocation = Invocation::default();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-s" => self.output.flatten_vertices = true,
                "-m" => self.output.material_names = false,
                "-i" => {
                    if let Some(path) = iter.next() {
                        invocation.input = Some(PathBuf::from(path));
                    }
                }
                "-o" => {
                    if let Some(path) = iter.next() {
                        invocation.output = Some(PathBuf::from(path));
                    }
                }
                _ if invocation.input.is_none() => invocation.input = Some(PathBuf::from(arg)),
                _ if invocation.output.is_none() => invocation.output = Some(PathBuf::from(arg)),
                _ => {}
            }
        }

        invocation
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        let ext = &self.output.extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(ConfigError::InvalidValue {
                field: "output.extension".to_string(),
                reason: "Extension must be a non-empty name without '.' or path separators".to_string(),
            }.into());
        }

        Ok(())
    }

    /// 导出选项
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            flatten_vertices: self.output.flatten_vertices,
            material_names: self.output.material_names,
        }
    }

    /// 推导默认输出路径：替换输入文件的扩展名，没有扩展名时追加
    pub fn default_output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.output.extension)
    }
}
