//! 顶点属性合成模块
//!
//! 为缺少法线或纹理坐标的网格组补齐这些数据：
//! - 角度加权的顶点法线合成
//! - 球面投影的纹理坐标生成

use std::f32::consts::PI;

use crate::core::error::{GeometryError, Result};
use crate::core::math::{cross, length, normalize, sub};
use super::mesh::Mesh;
use super::vertex::Vertex;

/// 法线长度平方不超过该值时视为缺失
pub const MISSING_NORMAL_THRESHOLD: f32 = 0.1;

/// 面法线长度低于该值的三角形视为退化
pub const DEGENERATE_EPSILON: f32 = 1e-8;

/// 由余弦定理计算夹角
///
/// `adj0`/`adj1` 为夹角两侧的边长，`opp` 为对边边长。
/// `acos` 的参数被截断到 [-1, 1]，避免舍入误差产生 NaN。
#[inline]
fn interior_angle(adj0: f32, adj1: f32, opp: f32) -> f32 {
    let c = (adj0 * adj0 + adj1 * adj1 - opp * opp) / (2.0 * adj0 * adj1);
    c.clamp(-1.0, 1.0).acos()
}

/// 角度加权的顶点法线合成
///
/// # 算法
///
/// 1. 标记需要重算的顶点：`missing_only` 时只标记法线长度平方
///    不超过 `MISSING_NORMAL_THRESHOLD` 的顶点，否则标记全部顶点；
///    被标记顶点的法线清零
/// 2. 对每个至少包含一个被标记顶点的三角形 (v0, v1, v2)：
///    - face_normal = cross(v1 - v0, v2 - v0)，长度小于 `DEGENERATE_EPSILON` 时跳过
///    - 归一化后，按该三角形在各被标记顶点处的内角加权累加
/// 3. 归一化所有被标记的顶点法线
///
/// 没有任何非退化三角形贡献的被标记顶点保持零法线。
/// 未被标记的顶点不会被写入，逐位保持原值。
/// 含越界索引的三角形被忽略。
///
/// # 参数
///
/// - `vertices`: 顶点数组（法线字段将被更新）
/// - `indices`: 索引数组，每 3 个构成一个三角形
/// - `missing_only`: 是否只补齐缺失的法线
pub fn calc_normals(vertices: &mut [Vertex], indices: &[u16], missing_only: bool) {
    let flagged: Vec<bool> = vertices
        .iter_mut()
        .map(|v| {
            let recompute = !missing_only || v.normal_length_squared() <= MISSING_NORMAL_THRESHOLD;
            if recompute {
                v.normal = [0.0, 0.0, 0.0];
            }
            recompute
        })
        .collect();

    for triangle in indices.chunks_exact(3) {
        let tri = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if tri.iter().any(|&i| i >= vertices.len()) {
            continue;
        }
        if !tri.iter().any(|&i| flagged[i]) {
            continue;
        }

        let p0 = vertices[tri[0]].position;
        let p1 = vertices[tri[1]].position;
        let p2 = vertices[tri[2]].position;

        let v01 = sub(p1, p0);
        let v02 = sub(p2, p0);
        let v12 = sub(p2, p1);

        let face_normal = cross(v01, v02);
        let len = length(face_normal);
        if len < DEGENERATE_EPSILON {
            continue;
        }
        let nm = [face_normal[0] / len, face_normal[1] / len, face_normal[2] / len];

        let d01 = length(v01);
        let d02 = length(v02);
        let d12 = length(v12);

        let angles = [
            interior_angle(d01, d02, d12),
            interior_angle(d01, d12, d02),
            interior_angle(d02, d12, d01),
        ];

        for (&i, &angle) in tri.iter().zip(angles.iter()) {
            if flagged[i] {
                let n = &mut vertices[i].normal;
                n[0] += nm[0] * angle;
                n[1] += nm[1] * angle;
                n[2] += nm[2] * angle;
            }
        }
    }

    for (vertex, &recompute) in vertices.iter_mut().zip(flagged.iter()) {
        if recompute {
            vertex.normal = normalize(vertex.normal);
        }
    }
}

/// 球面投影纹理坐标
///
/// 对归一化后的位置：`u = atan2(z, x) / 2π`（回绕到 [0, 1)），`v = acos(y) / π`。
/// 只适用于大致以原点为中心的闭合形体。
pub fn calc_tex_coords(vertices: &mut [Vertex]) {
    for v in vertices.iter_mut() {
        let [x, y, z] = normalize(v.position);
        let theta = y.clamp(-1.0, 1.0).acos();
        let phi = z.atan2(x);
        let phi = if phi >= 0.0 { phi } else { phi + 2.0 * PI };
        v.texcoord = [phi / (2.0 * PI), theta / PI];
    }
}

impl Mesh {
    /// 为单个组合成法线
    ///
    /// 组的索引不合法（数量不是 3 的倍数或越界）时返回 `GeometryError::InvalidGroup`，
    /// 法线保持不变。
    pub fn calc_normals(&mut self, grp: usize, missing_only: bool) -> Result<()> {
        let group = self.group_slot(grp)?;
        group
            .validate()
            .map_err(|reason| GeometryError::InvalidGroup { index: grp, reason })?;
        calc_normals(&mut group.vertices, &group.indices, missing_only);
        Ok(())
    }

    /// 为单个组生成球面投影纹理坐标
    pub fn calc_tex_coords(&mut self, grp: usize) -> Result<()> {
        calc_tex_coords(&mut self.group_slot(grp)?.vertices);
        Ok(())
    }
}
