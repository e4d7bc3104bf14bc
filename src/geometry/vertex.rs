/// 顶点定义模块
///
/// 定义网格组使用的顶点结构：位置、法线和纹理坐标。

use bytemuck::{Pod, Zeroable};

/// 带法线和纹理坐标的顶点
///
/// 内存布局与 CMSH 交错顶点记录一致，使用 `#[repr(C)]` 保证顺序和对齐。
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - normal: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - **总计**: 32 bytes
///
/// # 示例
///
/// ```rust
/// use msh_convert::geometry::vertex::Vertex;
///
/// let vertex = Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
/// assert_eq!(vertex.texcoord, [0.5, 0.5]);
/// ```
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 法线向量 (nx, ny, nz)
    ///
    /// 有效时为单位向量；全零表示缺失，可由法线合成补齐。
    pub normal: [f32; 3],

    /// 纹理坐标 (u, v)
    pub texcoord: [f32; 2],
}

impl Vertex {
    /// 创建一个新的顶点
    #[inline]
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// 只有位置的顶点（法线与纹理坐标为零）
    #[inline]
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::default()
        }
    }

    /// 法线长度的平方
    #[inline]
    pub fn normal_length_squared(&self) -> f32 {
        let n = self.normal;
        n[0] * n[0] + n[1] * n[1] + n[2] * n[2]
    }
}
