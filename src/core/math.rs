//! 数学工具模块
//!
//! 基于 `nalgebra` 的类型别名，以及几何处理中直接作用于 `[f32; 3]`
//! 的小工具函数（顶点结构使用原始数组，见 `geometry::vertex`）。

pub use nalgebra::{
    Matrix3 as Mat3, Matrix4 as Mat4,
    Vector3 as Vec3, Vector4 as Vec4,
};

pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix3 = Mat3<f32>;
pub type Matrix4 = Mat4<f32>;

/// 数学常量
pub mod constants {
    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 计算两个3D向量的叉乘
#[inline]
pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// 计算两个3D向量的点乘
#[inline]
pub fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// a - b
#[inline]
pub fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// 向量长度
#[inline]
pub fn length(v: [f32; 3]) -> f32 {
    dot(v, v).sqrt()
}

/// 归一化3D向量
///
/// 长度为零（低于 `EPSILON`）时返回零向量。
#[inline]
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = length(v);

    if len < constants::EPSILON {
        [0.0, 0.0, 0.0]
    } else {
        let inv = 1.0 / len;
        [v[0] * inv, v[1] * inv, v[2] * inv]
    }
}

/// 数组转 nalgebra 向量
#[inline]
pub fn to_vector(v: [f32; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}
