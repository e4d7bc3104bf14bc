//! 球面片生成器
//!
//! 程序化生成单位球面上的一块经纬矩形区域，结果是只含一个组的 `Mesh`。
//!
//! # 参数
//!
//! - `nlng`：整个球面的经度划分数
//! - `nlat`：赤道到极点的纬度带数
//! - `ilat`：目标纬度带（0 为赤道带，`nlat - 1` 为极冠带）
//! - `res`：片内的纬向细分数（生成 `res + 1` 圈顶点）
//! - `bseg`：底圈的经向分段数，默认 `(nlat - ilat) * res`
//! - `reduce`：极冠模式，每往里一圈少一个分段，最终收敛到极点
//! - `outside`：法线和绕序朝外（从球外观察）
//!
//! # 示例
//!
//! ```rust
//! use msh_convert::geometry::sphere::SpherePatch;
//!
//! let mesh = SpherePatch::new(8, 4, 3, 2).build().unwrap();
//! assert_eq!(mesh.group_count(), 1);
//! ```

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::core::error::{GeometryError, Result};
use super::mesh::{Group, Mesh, MAX_GROUP_VERTICES};
use super::vertex::Vertex;

/// 球面片参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpherePatch {
    pub nlng: u32,
    pub nlat: u32,
    pub ilat: u32,
    pub res: u32,
    /// 底圈分段数；`None` 或极冠带时使用默认值
    pub bseg: Option<u32>,
    pub reduce: bool,
    pub outside: bool,
}

impl SpherePatch {
    /// 创建参数，`reduce` 和 `outside` 默认为 true
    pub fn new(nlng: u32, nlat: u32, ilat: u32, res: u32) -> Self {
        Self {
            nlng,
            nlat,
            ilat,
            res,
            bseg: None,
            reduce: true,
            outside: true,
        }
    }

    pub fn with_bseg(mut self, bseg: u32) -> Self {
        self.bseg = Some(bseg);
        self
    }

    pub fn with_reduce(mut self, reduce: bool) -> Self {
        self.reduce = reduce;
        self
    }

    pub fn with_outside(mut self, outside: bool) -> Self {
        self.outside = outside;
        self
    }

    /// 实际使用的底圈分段数
    ///
    /// 默认值超出 `u32` 时饱和到 `u32::MAX`，`build` 会拒绝这样的参数。
    pub fn base_segments(&self) -> u32 {
        self.checked_base_segments().unwrap_or(u32::MAX)
    }

    fn checked_base_segments(&self) -> Option<u32> {
        let bands = self.nlat.saturating_sub(self.ilat);
        match self.bseg {
            Some(bseg) if bands != 1 => Some(bseg),
            _ => bands.checked_mul(self.res),
        }
    }

    /// 第 `ring` 圈的分段数
    #[inline]
    fn ring_segments(&self, bseg: u32, ring: u32) -> u32 {
        if self.reduce {
            bseg - ring
        } else {
            bseg
        }
    }

    /// 顶点数：`(bseg+1)(res+1)`，极冠模式减去 `res(res+1)/2`
    pub fn vertex_count(&self) -> usize {
        let bseg = self.base_segments() as usize;
        let res = self.res as usize;
        let full = bseg.saturating_add(1).saturating_mul(res.saturating_add(1));
        if self.reduce {
            full.saturating_sub(res.saturating_mul(res.saturating_add(1)) / 2)
        } else {
            full
        }
    }

    /// 三角形数：极冠模式 `res(2·bseg − res)`，否则 `2·res·bseg`
    pub fn triangle_count(&self) -> usize {
        let bseg = self.base_segments() as usize;
        let res = self.res as usize;
        if self.reduce {
            res.saturating_mul(bseg.saturating_mul(2).saturating_sub(res))
        } else {
            res.saturating_mul(bseg).saturating_mul(2)
        }
    }

    fn check(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(GeometryError::InvalidPatch(msg).into()) };

        if self.nlng == 0 || self.nlat == 0 || self.res == 0 {
            return invalid(format!(
                "nlng, nlat and res must be positive (got {}, {}, {})",
                self.nlng, self.nlat, self.res
            ));
        }
        if self.ilat >= self.nlat {
            return invalid(format!("ilat {} outside 0..{}", self.ilat, self.nlat));
        }

        let Some(bseg) = self.checked_base_segments() else {
            return invalid(format!(
                "default base segment count ({} - {}) * {} overflows",
                self.nlat, self.ilat, self.res
            ));
        };
        if bseg == 0 {
            return invalid("base segment count must be positive".to_string());
        }
        if self.reduce && bseg < self.res {
            return invalid(format!(
                "reduced patch needs bseg >= res (bseg {}, res {})",
                bseg, self.res
            ));
        }

        let nvtx = self.vertex_count();
        if nvtx > MAX_GROUP_VERTICES {
            return invalid(format!(
                "{} vertices exceed the 16-bit index range",
                nvtx
            ));
        }

        Ok(())
    }

    /// 生成网格
    ///
    /// 角度用 f64 计算后再转为 f32。结果的材质和纹理引用为 `Inherit`，派生数据有效。
    pub fn build(&self) -> Result<Mesh> {
        self.check()?;

        let bseg = self.base_segments();
        let res = self.res;

        let min_lat = FRAC_PI_2 * self.ilat as f64 / self.nlat as f64;
        let max_lat = FRAC_PI_2 * (self.ilat + 1) as f64 / self.nlat as f64;
        let max_lng = TAU / self.nlng as f64;

        let mut vertices = Vec::with_capacity(self.vertex_count());
        for i in 0..=res {
            let lat = min_lat + (max_lat - min_lat) * i as f64 / res as f64;
            let (slat, clat) = lat.sin_cos();
            let nseg = self.ring_segments(bseg, i);

            for j in 0..=nseg {
                let lng = if nseg > 0 {
                    max_lng * j as f64 / nseg as f64
                } else {
                    0.0
                };
                let (slng, clng) = lng.sin_cos();

                let p = [(clat * clng) as f32, slat as f32, (clat * slng) as f32];
                let n = if self.outside { p } else { [-p[0], -p[1], -p[2]] };
                let u = if nseg > 0 { j as f32 / nseg as f32 } else { 0.5 };
                let v = (res - i) as f32 / res as f32;

                vertices.push(Vertex::new(p, n, [u, v]));
            }
        }

        let mut indices: Vec<u16> = Vec::with_capacity(self.triangle_count() * 3);
        let mut ofs0 = 0u32;
        for i in 0..res {
            let nseg = self.ring_segments(bseg, i);
            let ofs1 = ofs0 + nseg + 1;

            for j in 0..nseg {
                indices.extend_from_slice(&[
                    (ofs0 + j) as u16,
                    (ofs1 + j) as u16,
                    (ofs0 + j + 1) as u16,
                ]);
                if self.reduce && j + 1 == nseg {
                    break;
                }
                indices.extend_from_slice(&[
                    (ofs0 + j + 1) as u16,
                    (ofs1 + j) as u16,
                    (ofs1 + j + 1) as u16,
                ]);
            }
            ofs0 = ofs1;
        }

        if !self.outside {
            for triangle in indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }

        tracing::debug!(
            nlng = self.nlng,
            nlat = self.nlat,
            ilat = self.ilat,
            vertices = vertices.len(),
            triangles = indices.len() / 3,
            "生成球面片"
        );

        Ok(Mesh::new_with_group(Group::new(vertices, indices)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh::IndexRef;

    fn len(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_polar_patch_counts() {
        for (nlat, res) in [(1, 1), (4, 2), (6, 5), (8, 16)] {
            let patch = SpherePatch::new(12, nlat, nlat - 1, res);
            let mesh = patch.build().unwrap();
            let group = mesh.group(0).unwrap();

            // 极冠带 bseg = res
            let bseg = res as usize;
            let res = res as usize;
            assert_eq!(group.vertex_count(), (bseg + 1) * (res + 1) - res * (res + 1) / 2);
            assert_eq!(group.triangle_count(), res * (2 * bseg - res));
            assert!(group.validate().is_ok());
        }
    }

    #[test]
    fn test_unit_sphere_positions_and_normals() {
        let mesh = SpherePatch::new(8, 4, 3, 6).build().unwrap();
        for v in &mesh.group(0).unwrap().vertices {
            assert!((len(v.position) - 1.0).abs() < 1e-5);
            assert!((len(v.normal) - 1.0).abs() < 1e-5);
            assert_eq!(v.position, v.normal);
        }
    }

    #[test]
    fn test_pole_vertex() {
        let mesh = SpherePatch::new(8, 2, 1, 3).build().unwrap();
        let group = mesh.group(0).unwrap();
        let pole = group.vertices.last().unwrap();

        assert!((pole.position[1] - 1.0).abs() < 1e-6);
        assert_eq!(pole.texcoord, [0.5, 0.0]);
    }

    #[test]
    fn test_full_patch_counts() {
        let patch = SpherePatch::new(8, 4, 0, 3).with_reduce(false);
        assert_eq!(patch.base_segments(), 12);

        let mesh = patch.build().unwrap();
        let group = mesh.group(0).unwrap();
        assert_eq!(group.vertex_count(), 13 * 4);
        assert_eq!(group.triangle_count(), 2 * 3 * 12);
    }

    #[test]
    fn test_explicit_bseg_ignored_at_pole() {
        let inner = SpherePatch::new(8, 4, 1, 2).with_bseg(5).with_reduce(false);
        assert_eq!(inner.base_segments(), 5);

        let polar = SpherePatch::new(8, 4, 3, 2).with_bseg(5);
        assert_eq!(polar.base_segments(), 2);
    }

    #[test]
    fn test_inside_reverses_every_triangle() {
        let outside = SpherePatch::new(8, 4, 0, 2).with_reduce(false).build().unwrap();
        let inside = SpherePatch::new(8, 4, 0, 2)
            .with_reduce(false)
            .with_outside(false)
            .build()
            .unwrap();

        let a = outside.group(0).unwrap();
        let b = inside.group(0).unwrap();

        for (ta, tb) in a.indices.chunks_exact(3).zip(b.indices.chunks_exact(3)) {
            assert_eq!([ta[0], ta[2], ta[1]], [tb[0], tb[1], tb[2]]);
        }
        for (va, vb) in a.vertices.iter().zip(b.vertices.iter()) {
            assert_eq!(va.position, vb.position);
            assert_eq!(va.normal, [-vb.normal[0], -vb.normal[1], -vb.normal[2]]);
        }
    }

    #[test]
    fn test_group_defaults() {
        let mesh = SpherePatch::new(4, 1, 0, 2).build().unwrap();
        assert!(mesh.has_valid_derived());

        let group = mesh.group(0).unwrap();
        assert_eq!(group.material, IndexRef::Inherit);
        assert_eq!(group.texture, IndexRef::Inherit);
        assert!(group.radius() > 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SpherePatch::new(0, 4, 0, 2).build().is_err());
        assert!(SpherePatch::new(8, 4, 4, 2).build().is_err());
        assert!(SpherePatch::new(8, 4, 0, 0).build().is_err());
        // 极冠模式下 bseg 小于 res
        assert!(SpherePatch::new(8, 4, 0, 4).with_bseg(2).build().is_err());
        // 超出 16 位索引
        assert!(SpherePatch::new(8, 4, 0, 200).with_reduce(false).build().is_err());
        // 默认底圈分段数溢出 u32
        assert!(SpherePatch::new(8, 100_000, 0, 100_000).build().is_err());
        assert!(SpherePatch::new(8, u32::MAX, 0, u32::MAX).build().is_err());
        assert!(SpherePatch::new(8, u32::MAX, u32::MAX - 1, u32::MAX).with_bseg(u32::MAX).build().is_err());
    }

    #[test]
    fn test_counts_saturate_for_huge_parameters() {
        let patch = SpherePatch::new(8, 100_000, 0, 100_000);
        assert_eq!(patch.base_segments(), u32::MAX);
        assert!(patch.vertex_count() > MAX_GROUP_VERTICES);
        assert!(patch.triangle_count() > 0);
    }
}
