//! msh_convert - MSHX1 文本网格到 CMSH 二进制资源的转换器
//!
//! 本库提供网格数据模型、几何处理工具、程序化球面片生成、
//! MSHX1 文本解析和 CMSH 二进制导出。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、日志、配置、错误处理）
//! - `geometry`: 网格模型、几何工具、球面片生成器和加载器
//! - `export`: 二进制写出器
//! - `convert`: 文件到文件的转换流程
//!
//! # 使用示例
//!
//! ```no_run
//! use msh_convert::convert::convert_file;
//! use msh_convert::export::ExportOptions;
//! use std::path::Path;
//!
//! let summary = convert_file(
//!     Path::new("hull.msh"),
//!     Path::new("hull.cmsh"),
//!     &ExportOptions::default(),
//! )?;
//! println!("写出 {} 个组", summary.groups);
//! # Ok::<(), msh_convert::core::MshError>(())
//! ```

pub mod core;
pub mod geometry;
pub mod export;
pub mod convert;
