//! 核心功能模块
//!
//! 提供转换器的基础功能，与具体的网格格式无关。
//!
//! # 模块组织
//!
//! - `math`：nalgebra 类型别名与向量工具函数
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载设置并由命令行覆盖
//! - `error`：错误处理，定义统一的错误类型

pub mod math;
pub mod log;
pub mod config;
pub mod error;

// 重新导出常用类型，方便使用
pub use math::{Vector3, Matrix4};
pub use error::{Result, MshError};
pub use config::{Config, Invocation};
