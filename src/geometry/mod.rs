/// 几何体模块
///
/// 网格数据模型、几何处理工具、球面片生成器以及文本网格加载器。
///
/// # 模块结构
///
/// - `vertex`: 顶点数据结构定义
/// - `mesh`: 网格组、材质、纹理引用和网格容器
/// - `transform`: 缩放、平移、旋转和矩阵变换
/// - `synthesis`: 法线与纹理坐标合成
/// - `sphere`: 程序化球面片
/// - `loaders`: 文本格式加载器
///
/// # 架构设计
///
/// ```text
/// 文件 (MSHX1)          SpherePatch
///     ↓                     ↓
/// MshLoader ──────────→  Mesh (CPU侧数据)
///                           ↓
///                      export::CmshWriter
/// ```
///
/// # 使用示例
///
/// ```rust,no_run
/// use msh_convert::geometry::loaders::{MeshLoader, MshLoader};
/// use std::path::Path;
///
/// let mesh = MshLoader::load_from_file(Path::new("model.msh"))?;
///
/// println!("组数: {}", mesh.group_count());
/// println!("材质数: {}", mesh.material_count());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```

pub mod vertex;
pub mod mesh;
pub mod transform;
pub mod synthesis;
pub mod sphere;
pub mod loaders;

// 重新导出常用类型
pub use vertex::Vertex;
pub use mesh::{Group, GroupFlags, IndexRef, Material, Mesh, MeshFlags, Texture};
pub use sphere::SpherePatch;
pub use transform::RotAxis;
