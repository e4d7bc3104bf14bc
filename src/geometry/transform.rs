//! 几何变换模块
//!
//! 对单个组或整个网格就地执行缩放、平移、旋转、一般矩阵变换和纹理坐标缩放。
//!
//! # 派生数据
//!
//! | 操作 | 派生数据有效时 |
//! |------|----------------|
//! | 缩放 | 重新计算该组 |
//! | 平移 | 重心增量平移，半径不变 |
//! | 旋转 | 重心增量旋转，半径不变 |
//! | 矩阵变换 | 重新计算该组 |
//! | 纹理坐标缩放 | 不受影响 |

use crate::core::error::Result;
use crate::core::math::{normalize, Matrix3, Matrix4, Vector3, Vector4};
use super::mesh::{Group, Mesh};
use super::vertex::Vertex;

/// 旋转轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotAxis {
    X,
    Y,
    Z,
}

/// 绕坐标轴旋转一个点（或方向）
///
/// 在与轴正交的平面内做标准的二维旋转，`c`/`s` 为角度的余弦和正弦。
///
/// - X: `y' = c·y − s·z`, `z' = s·y + c·z`
/// - Y: `x' = c·x − s·z`, `z' = s·x + c·z`
/// - Z: `x' = c·x − s·y`, `y' = s·x + c·y`
#[inline]
pub fn rotate_point(p: [f32; 3], axis: RotAxis, c: f32, s: f32) -> [f32; 3] {
    let [x, y, z] = p;
    match axis {
        RotAxis::X => [x, c * y - s * z, s * y + c * z],
        RotAxis::Y => [c * x - s * z, y, s * x + c * z],
        RotAxis::Z => [c * x - s * y, s * x + c * y, z],
    }
}

/// 按分量缩放顶点位置
///
/// 非均匀缩放时法线乘以 `(sy·sz, sx·sz, sx·sy)` 后重新归一化
/// （对角缩放矩阵逆转置的简化形式）；均匀缩放不改变法线。
/// 三个因子先除以其中绝对值最大者，很小的缩放也不会把法线压到零。
pub fn scale_vertices(vertices: &mut [Vertex], sx: f32, sy: f32, sz: f32) {
    for v in vertices.iter_mut() {
        v.position[0] *= sx;
        v.position[1] *= sy;
        v.position[2] *= sz;
    }

    if sx == sy && sx == sz {
        return;
    }

    let (snx, sny, snz) = (sy * sz, sx * sz, sx * sy);
    let peak = snx.abs().max(sny.abs()).max(snz.abs());
    if peak == 0.0 {
        for v in vertices.iter_mut() {
            v.normal = [0.0, 0.0, 0.0];
        }
        return;
    }
    let (snx, sny, snz) = (snx / peak, sny / peak, snz / peak);
    for v in vertices.iter_mut() {
        v.normal = normalize([v.normal[0] * snx, v.normal[1] * sny, v.normal[2] * snz]);
    }
}

/// 平移顶点位置
pub fn translate_vertices(vertices: &mut [Vertex], dx: f32, dy: f32, dz: f32) {
    for v in vertices.iter_mut() {
        v.position[0] += dx;
        v.position[1] += dy;
        v.position[2] += dz;
    }
}

/// 绕坐标轴旋转顶点位置和法线
pub fn rotate_vertices(vertices: &mut [Vertex], axis: RotAxis, angle: f32) {
    let (s, c) = angle.sin_cos();
    for v in vertices.iter_mut() {
        v.position = rotate_point(v.position, axis, c, s);
        v.normal = rotate_point(v.normal, axis, c, s);
    }
}

/// 用 4×4 齐次矩阵变换顶点
///
/// 采用列向量约定（`p' = M · [x, y, z, 1]ᵀ`），位置做透视除法；
/// 法线只使用左上角 3×3 部分（不含平移），按最大元素归一后作用，
/// 变换后重新归一化。
pub fn transform_vertices(vertices: &mut [Vertex], mat: &Matrix4) {
    let mut normal_matrix: Matrix3 = mat.fixed_view::<3, 3>(0, 0).into_owned();
    let peak = normal_matrix.amax();
    if peak > 0.0 {
        normal_matrix /= peak;
    }

    for v in vertices.iter_mut() {
        let p = mat * Vector4::new(v.position[0], v.position[1], v.position[2], 1.0);
        let inv_w = 1.0 / p.w;
        v.position = [p.x * inv_w, p.y * inv_w, p.z * inv_w];

        let n = normal_matrix * Vector3::new(v.normal[0], v.normal[1], v.normal[2]);
        v.normal = normalize([n.x, n.y, n.z]);
    }
}

/// 缩放纹理坐标
pub fn scale_texcoords(vertices: &mut [Vertex], su: f32, sv: f32) {
    for v in vertices.iter_mut() {
        v.texcoord[0] *= su;
        v.texcoord[1] *= sv;
    }
}

fn translate_group_in_place(group: &mut Group, derived_valid: bool, dx: f32, dy: f32, dz: f32) {
    translate_vertices(&mut group.vertices, dx, dy, dz);
    if derived_valid {
        *group.centroid_mut() += Vector3::new(dx, dy, dz);
    }
}

fn rotate_group_in_place(group: &mut Group, derived_valid: bool, axis: RotAxis, angle: f32) {
    rotate_vertices(&mut group.vertices, axis, angle);
    if derived_valid {
        let (s, c) = angle.sin_cos();
        let cnt = group.centroid_mut();
        let [x, y, z] = rotate_point([cnt.x, cnt.y, cnt.z], axis, c, s);
        *cnt = Vector3::new(x, y, z);
    }
}

impl Mesh {
    /// 缩放单个组
    pub fn scale_group(&mut self, grp: usize, sx: f32, sy: f32, sz: f32) -> Result<()> {
        let derived_valid = self.has_valid_derived();
        let group = self.group_slot(grp)?;
        scale_vertices(&mut group.vertices, sx, sy, sz);
        if derived_valid {
            group.compute_bounds();
        }
        Ok(())
    }

    /// 缩放整个网格
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        let derived_valid = self.has_valid_derived();
        for group in self.groups_mut() {
            scale_vertices(&mut group.vertices, sx, sy, sz);
            if derived_valid {
                group.compute_bounds();
            }
        }
    }

    /// 平移单个组
    pub fn translate_group(&mut self, grp: usize, dx: f32, dy: f32, dz: f32) -> Result<()> {
        let derived_valid = self.has_valid_derived();
        translate_group_in_place(self.group_slot(grp)?, derived_valid, dx, dy, dz);
        Ok(())
    }

    /// 平移整个网格
    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        let derived_valid = self.has_valid_derived();
        for group in self.groups_mut() {
            translate_group_in_place(group, derived_valid, dx, dy, dz);
        }
    }

    /// 绕坐标轴旋转单个组（弧度）
    pub fn rotate_group(&mut self, grp: usize, axis: RotAxis, angle: f32) -> Result<()> {
        let derived_valid = self.has_valid_derived();
        rotate_group_in_place(self.group_slot(grp)?, derived_valid, axis, angle);
        Ok(())
    }

    /// 绕坐标轴旋转整个网格（弧度）
    pub fn rotate(&mut self, axis: RotAxis, angle: f32) {
        let derived_valid = self.has_valid_derived();
        for group in self.groups_mut() {
            rotate_group_in_place(group, derived_valid, axis, angle);
        }
    }

    /// 用一般矩阵变换单个组
    ///
    /// 一般变换可能改变形状，派生数据有效时会完整重算。
    pub fn transform_group(&mut self, grp: usize, mat: &Matrix4) -> Result<()> {
        let derived_valid = self.has_valid_derived();
        let group = self.group_slot(grp)?;
        transform_vertices(&mut group.vertices, mat);
        if derived_valid {
            group.compute_bounds();
        }
        Ok(())
    }

    /// 用一般矩阵变换整个网格
    pub fn transform(&mut self, mat: &Matrix4) {
        let derived_valid = self.has_valid_derived();
        for group in self.groups_mut() {
            transform_vertices(&mut group.vertices, mat);
            if derived_valid {
                group.compute_bounds();
            }
        }
    }

    /// 缩放单个组的纹理坐标
    pub fn tex_scale_group(&mut self, grp: usize, su: f32, sv: f32) -> Result<()> {
        scale_texcoords(&mut self.group_slot(grp)?.vertices, su, sv);
        Ok(())
    }

    /// 缩放整个网格的纹理坐标
    pub fn tex_scale(&mut self, su: f32, sv: f32) {
        for group in self.groups_mut() {
            scale_texcoords(&mut group.vertices, su, sv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::Group;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-5)
    }

    fn sample_mesh() -> Mesh {
        let vertices = vec![
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.5, 1.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.5]),
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        ];
        Mesh::new_with_group(Group::new(vertices, vec![0, 1, 2]))
    }

    #[test]
    fn test_rotate_point_quarter_turns() {
        assert!(approx(rotate_point([0.0, 1.0, 0.0], RotAxis::X, 0.0, 1.0), [0.0, 0.0, 1.0]));
        assert!(approx(rotate_point([1.0, 0.0, 0.0], RotAxis::Y, 0.0, 1.0), [0.0, 0.0, 1.0]));
        assert!(approx(rotate_point([1.0, 0.0, 0.0], RotAxis::Z, 0.0, 1.0), [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_uniform_scale_keeps_normals() {
        let mut mesh = sample_mesh();
        mesh.scale(2.0, 2.0, 2.0);

        let group = mesh.group(0).unwrap();
        assert_eq!(group.vertices[0].position, [2.0, 0.0, 0.0]);
        assert_eq!(group.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_non_uniform_scale_renormalizes_normals() {
        let mut vertices = vec![Vertex::new([1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 0.0])];
        scale_vertices(&mut vertices, 2.0, 1.0, 1.0);

        let n = vertices[0].normal;
        // (1*1, 1*2, 0) 归一化
        let inv = 1.0 / 5.0f32.sqrt();
        assert!(approx(n, [inv, 2.0 * inv, 0.0]));
        assert_eq!(vertices[0].position, [2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_tiny_non_uniform_scale_keeps_unit_normals() {
        let mut vertices = vec![
            Vertex::new([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 1.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
        ];
        scale_vertices(&mut vertices, 1e-4, 1e-4, 1.0);

        assert!(approx(vertices[0].normal, [0.0, 0.0, 1.0]));
        assert!(approx(vertices[1].normal, [1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_tiny_matrix_scale_keeps_unit_normals() {
        let mut vertices = vec![Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0])];
        let mat = Matrix4::new_nonuniform_scaling(&Vector3::new(1e-4, 1e-7, 1e-4));
        transform_vertices(&mut vertices, &mat);
        assert!(approx(vertices[0].normal, [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_rotate_whole_mesh_updates_every_centroid() {
        let mut mesh = sample_mesh();
        mesh.add_group(Group::new(vec![Vertex::at(0.0, 2.0, 0.0)], vec![0, 0, 0]));
        mesh.recompute_derived();
        mesh.rotate(RotAxis::Z, std::f32::consts::FRAC_PI_2);

        let c = mesh.group(1).unwrap().centroid();
        assert!((c - Vector3::new(-2.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_scale_recomputes_radius() {
        let mut mesh = sample_mesh();
        let before = mesh.group(0).unwrap().radius();
        mesh.scale_group(0, 3.0, 3.0, 3.0).unwrap();
        let after = mesh.group(0).unwrap().radius();
        assert!((after - 3.0 * before).abs() < 1e-5);
    }

    #[test]
    fn test_translate_shifts_centroid_incrementally() {
        let mut mesh = sample_mesh();
        let c0 = mesh.group(0).unwrap().centroid();
        let r0 = mesh.group(0).unwrap().radius();

        mesh.translate(1.0, -2.0, 3.0);

        let group = mesh.group(0).unwrap();
        assert!((group.centroid() - (c0 + Vector3::new(1.0, -2.0, 3.0))).norm() < 1e-6);
        assert_eq!(group.radius(), r0);
        assert_eq!(group.vertices[2].position, [1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_translate_without_derived_leaves_centroid() {
        let mut mesh = Mesh::new();
        mesh.add_group(Group::new(vec![Vertex::at(1.0, 1.0, 1.0)], Vec::new()));
        mesh.translate(5.0, 0.0, 0.0);
        assert_eq!(mesh.group(0).unwrap().centroid(), Vector3::zeros());
    }

    #[test]
    fn test_rotate_group_updates_centroid() {
        let mut mesh = sample_mesh();
        mesh.rotate_group(0, RotAxis::Z, std::f32::consts::FRAC_PI_2).unwrap();

        let group = mesh.group(0).unwrap();
        assert!(approx(group.vertices[0].position, [0.0, 1.0, 0.0]));
        assert!(approx(group.vertices[0].normal, [0.0, 0.0, 1.0]));

        let mut expected = mesh.clone();
        expected.recompute_derived();
        let c = group.centroid();
        let e = expected.group(0).unwrap().centroid();
        assert!((c - e).norm() < 1e-5);
    }

    #[test]
    fn test_transform_translation_matrix() {
        let mut mesh = sample_mesh();
        let mat = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 5.0));
        mesh.transform(&mat);

        let group = mesh.group(0).unwrap();
        assert!(approx(group.vertices[0].position, [1.0, 0.0, 5.0]));
        // 平移不影响法线
        assert!(approx(group.vertices[0].normal, [0.0, 0.0, 1.0]));
        assert!((group.centroid().z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_perspective_divide() {
        let mut vertices = vec![Vertex::new([2.0, 4.0, 6.0], [0.0, 1.0, 0.0], [0.0, 0.0])];
        let mut mat = Matrix4::identity();
        mat[(3, 3)] = 2.0;
        transform_vertices(&mut vertices, &mat);
        assert!(approx(vertices[0].position, [1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_tex_scale() {
        let mut mesh = sample_mesh();
        mesh.tex_scale_group(0, 2.0, 0.5).unwrap();
        assert_eq!(mesh.group(0).unwrap().vertices[0].texcoord, [1.0, 0.5]);
        assert!(mesh.tex_scale_group(1, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_group_out_of_range() {
        let mut mesh = sample_mesh();
        assert!(mesh.scale_group(4, 1.0, 1.0, 1.0).is_err());
        assert!(mesh.translate_group(4, 1.0, 1.0, 1.0).is_err());
        assert!(mesh.rotate_group(4, RotAxis::X, 1.0).is_err());
        assert!(mesh.transform_group(4, &Matrix4::identity()).is_err());
    }
}
