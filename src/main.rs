//! msh_convert - MSHX1 → CMSH 命令行转换器
//!
//! # 使用方法
//!
//! ```bash
//! # 输出到 hull.cmsh
//! msh_convert hull.msh
//!
//! # 指定输出，顶点交错存储，不保留材质名
//! msh_convert -i hull.msh -o out/hull.cmsh -s -m
//! ```
//!
//! # 退出码
//!
//! | 退出码 | 含义 |
//! |--------|------|
//! | 0 | 成功，或未给出输入文件（打印用法） |
//! | 1 | 配置错误 |
//! | 3 | 输入文件无法读取 |
//! | 4 | 转换失败 |
//! | 5 | 输出文件无法写入 |
//! | 10 | 校验失败 |

use msh_convert::convert::convert_file;
use msh_convert::core::{log, Config};
use tracing::{error, info};

const USAGE: &str = "\
Usage: msh_convert [-i] <input> [-o] <output> [-s] [-m]
\t-i:\tInput File
\t-o:\tOutput File
\t-m:\tDo Not Preserve Material Names
\t-s:\tAll Vertex Elements in Single Array
";

/// 应用程序入口点
///
/// # 流程
///
/// 1. 加载配置文件（msh_convert.toml）
/// 2. 应用命令行参数覆盖
/// 3. 验证配置
/// 4. 初始化日志系统
/// 5. 转换并按错误类型设置退出码
fn main() {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("msh_convert.toml");

    // 2. 应用命令行参数
    let invocation = config.apply_args(std::env::args());

    let Some(input) = invocation.input else {
        println!("{}", USAGE);
        return;
    };

    // 3. 验证配置
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(e.exit_code());
    }

    // 4. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    if let Err(e) = log::init_logger(config.logging.level, config.logging.file_output, log_file) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
    info!(version = env!("CARGO_PKG_VERSION"), "msh_convert starting");

    // 5. 转换
    let output = invocation
        .output
        .unwrap_or_else(|| config.default_output_path(&input));
    let options = config.export_options();

    match convert_file(&input, &output, &options) {
        Ok(summary) => {
            info!(
                output = %summary.output.display(),
                groups = summary.groups,
                materials = summary.materials,
                textures = summary.textures,
                bytes = summary.bytes,
                "Conversion finished"
            );
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
