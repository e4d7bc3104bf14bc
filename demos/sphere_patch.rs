/// 球面片生成示例
///
/// 生成一块极冠球面片，调整位姿后导出为 CMSH 文件，并加载示例 MSHX1 文件。
///
/// 运行方式：
/// ```
/// cargo run --example sphere_patch
/// ```

use anyhow::Context;
use msh_convert::core::Config;
use msh_convert::export::{CmshWriter, ExportOptions, MeshWriter};
use msh_convert::geometry::loaders::MshLoader;
use msh_convert::geometry::{RotAxis, SpherePatch};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    // 初始化日志系统，级别取自配置文件
    let config = Config::from_file_or_default("msh_convert.toml");
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.logging.level))
        .init();

    println!("=== msh_convert 球面片示例 ===\n");

    let patch = SpherePatch::new(16, 4, 3, 6);
    let mut mesh = patch.build().context("球面片参数无效")?;

    println!("球面片:");
    println!("  顶点数: {}", patch.vertex_count());
    println!("  三角形数: {}", patch.triangle_count());

    // 放大到半径 10，绕 Y 轴转 45°，再抬高
    mesh.scale(10.0, 10.0, 10.0);
    mesh.rotate(RotAxis::Y, std::f32::consts::FRAC_PI_4);
    mesh.translate(0.0, 2.0, 0.0);

    let group = mesh.group(0).context("网格没有组")?;
    println!("  重心: {:?}", group.centroid());
    println!("  包围半径: {:.3}", group.radius());

    let output = std::env::temp_dir().join("sphere_patch.cmsh");
    let bytes = CmshWriter::write_file(&mesh, &ExportOptions::default(), &output)?;
    println!("\n✓ 写出 {} 字节到 {}", bytes, output.display());

    // 加载示例文本网格
    let sample = Path::new("assets/quad.msh");
    let parsed = MshLoader::load_with_report(sample)
        .with_context(|| format!("无法加载 {}", sample.display()))?;

    println!("\n{}:", sample.display());
    println!("  组数: {}", parsed.mesh.group_count());
    println!("  材质数: {}", parsed.mesh.material_count());
    println!("  纹理数: {}", parsed.mesh.texture_count());
    println!("  忽略的行: {}", parsed.report.skipped().count());

    Ok(())
}
