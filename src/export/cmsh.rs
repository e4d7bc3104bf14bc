//! CMSH 二进制写出器
//!
//! # 文件布局（小端）
//!
//! ```text
//! 魔数          8 字节 "_CMSHX1_"
//! 组数          u32
//! 材质数        u32
//! 纹理数        u32
//! 标志          u32  bit0 = 顶点分数组存储, bit1 = 包含材质名
//!
//! 每个组：
//!   标签长度 u32（含结尾 NUL）+ 标签字节 + NUL
//!   材质 u32, 纹理 u32, 标志 u32, 用户标志 u32, z-bias u32
//!   顶点数 u32, 索引数 u32
//!   交错:   顶点数 × (位置 12 + 法线 12 + 纹理坐标 8)
//!   分数组: 全部位置, 全部法线, 全部纹理坐标
//!   索引:   索引数 × u32
//!
//! 每个材质：
//!   [名称长度 u32 + 名称字节 + NUL]   仅当包含材质名
//!   漫反射 4×f32, 环境光 3×f32, 高光 3×f32, 自发光 3×f32, 高光指数 f32
//!
//! 每个纹理：
//!   名称长度 u32 + 名称字节 + NUL
//! ```
//!
//! 材质和纹理引用按 `IndexRef::to_raw` 编码。

use super::{ExportOptions, MeshWriter};
use crate::core::error::Result;
use crate::geometry::mesh::{Group, Material, Mesh};
use crate::geometry::vertex::Vertex;

/// 文件魔数
pub const MAGIC: &[u8; 8] = b"_CMSHX1_";

/// 文件头大小（字节）
pub const HEADER_SIZE: usize = 24;

/// 标志位：顶点分数组存储
pub const FLAG_SEPARATE_ARRAYS: u32 = 0x01;

/// 标志位：包含材质名
pub const FLAG_MATERIAL_NAMES: u32 = 0x02;

/// CMSH 格式写出器
pub struct CmshWriter;

/// 小端字节缓冲
struct ByteBuf {
    bytes: Vec<u8>,
}

impl ByteBuf {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn put_u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn put_f32s(&mut self, values: &[f32]) {
        for v in values {
            self.bytes.extend_from_slice(&v.to_le_bytes());
        }
    }

    /// 长度前缀字符串：长度包含结尾 NUL，遇到内嵌的 NUL 截断
    fn put_str(&mut self, s: &str) {
        let raw = label_bytes(s);
        self.put_u32(raw.len() as u32 + 1);
        self.bytes.extend_from_slice(raw);
        self.bytes.push(0);
    }

    fn put_vertices_interleaved(&mut self, vertices: &[Vertex]) {
        if cfg!(target_endian = "little") {
            // Vertex 是 #[repr(C)] 的 32 字节记录，与文件布局一致
            self.bytes.extend_from_slice(bytemuck::cast_slice(vertices));
        } else {
            for v in vertices {
                self.put_f32s(&v.position);
                self.put_f32s(&v.normal);
                self.put_f32s(&v.texcoord);
            }
        }
    }

    fn put_vertices_separate(&mut self, vertices: &[Vertex]) {
        for v in vertices {
            self.put_f32s(&v.position);
        }
        for v in vertices {
            self.put_f32s(&v.normal);
        }
        for v in vertices {
            self.put_f32s(&v.texcoord);
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl CmshWriter {
    /// 编码后的文件大小
    pub fn encoded_len(mesh: &Mesh, options: &ExportOptions) -> usize {
        let groups: usize = mesh
            .groups()
            .iter()
            .map(|g| {
                4 + label_bytes(&g.label).len() + 1
                    + 7 * 4
                    + g.vertex_count() * std::mem::size_of::<Vertex>()
                    + g.index_count() * 4
            })
            .sum();
        let materials: usize = mesh
            .materials()
            .iter()
            .map(|m| {
                let name = if options.material_names {
                    4 + label_bytes(&m.name).len() + 1
                } else {
                    0
                };
                name + 14 * 4
            })
            .sum();
        let textures: usize = mesh
            .textures()
            .iter()
            .map(|t| 4 + label_bytes(&t.name).len() + 1)
            .sum();

        HEADER_SIZE + groups + materials + textures
    }

    fn write_group(buf: &mut ByteBuf, group: &Group, options: &ExportOptions) {
        buf.put_str(&group.label);
        buf.put_u32(group.material.to_raw());
        buf.put_u32(group.texture.to_raw());
        buf.put_u32(group.flags.bits());
        buf.put_u32(group.user_flag);
        buf.put_u32(group.z_bias as u32);
        buf.put_u32(group.vertex_count() as u32);
        buf.put_u32(group.index_count() as u32);

        if options.flatten_vertices {
            buf.put_vertices_interleaved(&group.vertices);
        } else {
            buf.put_vertices_separate(&group.vertices);
        }

        for &index in &group.indices {
            buf.put_u32(index as u32 & 0xFFFF);
        }
    }

    fn write_material(buf: &mut ByteBuf, material: &Material, options: &ExportOptions) {
        if options.material_names {
            buf.put_str(&material.name);
        }
        buf.put_f32s(&material.diffuse);
        buf.put_f32s(&material.ambient[..3]);
        buf.put_f32s(&material.specular[..3]);
        buf.put_f32s(&material.emissive[..3]);
        buf.put_f32s(&[material.power]);
    }
}

fn label_bytes(s: &str) -> &[u8] {
    let raw = s.as_bytes();
    raw.iter().position(|&b| b == 0).map_or(raw, |end| &raw[..end])
}

impl MeshWriter for CmshWriter {
    fn encode(mesh: &Mesh, options: &ExportOptions) -> Result<Vec<u8>> {
        mesh.validate()?;

        let mut buf = ByteBuf::with_capacity(Self::encoded_len(mesh, options));

        let mut flags = 0;
        if !options.flatten_vertices {
            flags |= FLAG_SEPARATE_ARRAYS;
        }
        if options.material_names {
            flags |= FLAG_MATERIAL_NAMES;
        }

        buf.bytes.extend_from_slice(MAGIC);
        buf.put_u32(mesh.group_count() as u32);
        buf.put_u32(mesh.material_count() as u32);
        buf.put_u32(mesh.texture_count() as u32);
        buf.put_u32(flags);

        for group in mesh.groups() {
            Self::write_group(&mut buf, group, options);
        }
        for material in mesh.materials() {
            Self::write_material(&mut buf, material, options);
        }
        for texture in mesh.textures() {
            buf.put_str(&texture.name);
        }

        Ok(buf.into_inner())
    }

    fn extension() -> &'static str {
        "cmsh"
    }
}
