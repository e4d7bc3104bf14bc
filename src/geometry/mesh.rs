/// 网格数据结构模块
///
/// 定义 CPU 侧的网格模型：网格组（`Group`）、材质（`Material`）、
/// 纹理引用（`Texture`）以及拥有它们的容器 `Mesh`。
///
/// # 所有权
///
/// ```text
/// Mesh ─┬─ Vec<Group> ─┬─ Vec<Vertex>
///       │              └─ Vec<u16>（组内局部索引）
///       ├─ Vec<Material>
///       └─ Vec<Texture>
/// ```
///
/// 组对材质和纹理的引用是 `IndexRef`。每当材质或纹理列表的长度变化，
/// 越界的 `Explicit` 引用都会被降级为 `Default`，`Inherit` 永远不会被自动修改。

use crate::core::error::{ExportError, GeometryError, Result};
use crate::core::math::{to_vector, Vector3};
use super::vertex::Vertex;

/// 16 位索引能寻址的最大顶点数
pub const MAX_GROUP_VERTICES: usize = u16::MAX as usize + 1;

/// 组对材质或纹理的引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexRef {
    /// 列表中的下标（从 0 开始）
    Explicit(u32),

    /// 使用内置的中性材质 / 不使用纹理
    Default,

    /// 交由调用方（渲染器）的上下文决定
    Inherit,
}

impl IndexRef {
    /// `Default` 在二进制文件中的编码
    pub const DEFAULT_RAW: u32 = 0xFFFF_FFFF;

    /// `Inherit` 在二进制文件中的编码
    pub const INHERIT_RAW: u32 = 0xFFFF_FFFE;

    /// 编码为 32 位整数
    #[inline]
    pub fn to_raw(self) -> u32 {
        match self {
            IndexRef::Explicit(i) => i,
            IndexRef::Default => Self::DEFAULT_RAW,
            IndexRef::Inherit => Self::INHERIT_RAW,
        }
    }

    /// 从 32 位整数解码
    #[inline]
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            Self::DEFAULT_RAW => IndexRef::Default,
            Self::INHERIT_RAW => IndexRef::Inherit,
            i => IndexRef::Explicit(i),
        }
    }

    /// 显式下标（如果有）
    #[inline]
    pub fn explicit(self) -> Option<u32> {
        match self {
            IndexRef::Explicit(i) => Some(i),
            _ => None,
        }
    }

    /// 按列表长度校正：越界的显式引用降级为 `Default`
    #[inline]
    pub fn reconcile(self, len: usize) -> Self {
        match self {
            IndexRef::Explicit(i) if i as usize >= len => IndexRef::Default,
            other => other,
        }
    }

    /// 列表中删除了 `removed` 之后的引用
    ///
    /// 指向被删项的引用重置为 0，指向其后的引用减一。
    #[inline]
    fn after_removal(self, removed: u32) -> Self {
        match self {
            IndexRef::Explicit(i) if i == removed => IndexRef::Explicit(0),
            IndexRef::Explicit(i) if i > removed => IndexRef::Explicit(i - 1),
            other => other,
        }
    }
}

/// 网格组标志位
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupFlags(u32);

impl GroupFlags {
    /// U 方向纹理环绕
    pub const WRAP_U: GroupFlags = GroupFlags(0x01);
    /// V 方向纹理环绕
    pub const WRAP_V: GroupFlags = GroupFlags(0x02);
    /// 投射阴影（静态组）
    pub const CAST_SHADOW: GroupFlags = GroupFlags(0x04);

    pub const fn empty() -> Self {
        GroupFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        GroupFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: GroupFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: GroupFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: GroupFlags) {
        self.0 &= !other.0;
    }

    pub fn toggle(&mut self, other: GroupFlags) {
        self.0 ^= other.0;
    }
}

impl std::ops::BitOr for GroupFlags {
    type Output = GroupFlags;

    fn bitor(self, rhs: GroupFlags) -> GroupFlags {
        GroupFlags(self.0 | rhs.0)
    }
}

/// 网格级标志位
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MeshFlags(u32);

impl MeshFlags {
    /// 网格投射阴影
    pub const CASTS_SHADOW: MeshFlags = MeshFlags(0x01);
    /// 阴影标志对整个网格生效，而不是使用各组自己的标志
    pub const GLOBAL_SHADOW: MeshFlags = MeshFlags(0x02);

    pub const fn from_bits(bits: u32) -> Self {
        MeshFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: MeshFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MeshFlags {
    type Output = MeshFlags;

    fn bitor(self, rhs: MeshFlags) -> MeshFlags {
        MeshFlags(self.0 | rhs.0)
    }
}

/// 材质
///
/// 四个颜色通道均为 RGBA。
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    /// 高光指数
    pub power: f32,
    /// 材质名称（可为空）
    pub name: String,
}

impl Material {
    /// 内置的中性材质（白色漫反射，无高光，无自发光）
    pub fn neutral() -> Self {
        Self {
            diffuse: [1.0, 1.0, 1.0, 1.0],
            ambient: [1.0, 1.0, 1.0, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emissive: [0.0, 0.0, 0.0, 1.0],
            power: 0.0,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::neutral()
    }
}

/// 纹理引用
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Texture {
    /// 纹理文件名；空字符串表示“无纹理”
    pub name: String,

    /// 倾向于不压缩加载（仅作提示，下游未使用）
    pub prefer_uncompressed: bool,
}

impl Texture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefer_uncompressed: false,
        }
    }
}

/// 网格组
///
/// 一个独立索引的子网格，拥有自己的顶点和索引缓冲区。
/// 索引是组内局部的，每 3 个构成一个三角形。
///
/// # 示例
///
/// ```rust
/// use msh_convert::geometry::mesh::{Group, IndexRef};
/// use msh_convert::geometry::vertex::Vertex;
///
/// let group = Group::new(
///     vec![Vertex::at(0.0, 0.0, 0.0), Vertex::at(1.0, 0.0, 0.0), Vertex::at(0.0, 1.0, 0.0)],
///     vec![0, 1, 2],
/// )
/// .with_material(IndexRef::Explicit(0))
/// .with_label("hull");
///
/// assert_eq!(group.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 三角形索引（组内局部）
    pub indices: Vec<u16>,

    /// 材质引用
    pub material: IndexRef,

    /// 纹理引用
    pub texture: IndexRef,

    /// 渲染排序提示，核心不解释其含义
    pub z_bias: u16,

    /// 标志位
    pub flags: GroupFlags,

    /// 用户标志，原样传递
    pub user_flag: u32,

    /// 显示标签（可为空）
    pub label: String,

    centroid: Vector3,
    radius: f32,
}

impl Group {
    /// 创建网格组
    ///
    /// 默认材质和纹理引用为 `Inherit`，z-bias 和标志为 0。
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u16>) -> Self {
        Self {
            vertices,
            indices,
            material: IndexRef::Inherit,
            texture: IndexRef::Inherit,
            z_bias: 0,
            flags: GroupFlags::empty(),
            user_flag: 0,
            label: String::new(),
            centroid: Vector3::zeros(),
            radius: 0.0,
        }
    }

    pub fn with_material(mut self, material: IndexRef) -> Self {
        self.material = material;
        self
    }

    pub fn with_texture(mut self, texture: IndexRef) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_z_bias(mut self, z_bias: u16) -> Self {
        self.z_bias = z_bias;
        self
    }

    pub fn with_flags(mut self, flags: GroupFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_user_flag(mut self, user_flag: u32) -> Self {
        self.user_flag = user_flag;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 组的重心（顶点位置均值）
    ///
    /// 仅在 `Mesh::has_valid_derived()` 为真时有意义。
    #[inline]
    pub fn centroid(&self) -> Vector3 {
        self.centroid
    }

    /// 组的包围半径（重心到最远顶点的距离）
    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub(crate) fn centroid_mut(&mut self) -> &mut Vector3 {
        &mut self.centroid
    }

    /// 重新计算重心和包围半径
    ///
    /// 没有顶点的组得到零重心和零半径。
    pub(crate) fn compute_bounds(&mut self) {
        if self.vertices.is_empty() {
            self.centroid = Vector3::zeros();
            self.radius = 0.0;
            return;
        }

        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + to_vector(v.position));
        let centroid = sum / self.vertices.len() as f32;

        let d2max = self.vertices.iter().fold(0.0f32, |max, v| {
            max.max((to_vector(v.position) - centroid).norm_squared())
        });

        self.centroid = centroid;
        self.radius = d2max.sqrt();
    }

    fn reconcile_refs(&mut self, material_count: usize, texture_count: usize) {
        self.material = self.material.reconcile(material_count);
        self.texture = self.texture.reconcile(texture_count);
    }

    /// 验证组数据的有效性
    ///
    /// 检查：
    /// - 索引数量是3的倍数
    /// - 有索引时必须有顶点
    /// - 所有索引都在顶点范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "索引数量必须是3的倍数，当前为: {}",
                self.indices.len()
            ));
        }

        if !self.indices.is_empty() && self.vertices.is_empty() {
            return Err(format!(
                "组包含 {} 个索引但没有顶点",
                self.indices.len()
            ));
        }

        let vertex_count = self.vertices.len();
        if let Some(i) = self.indices.iter().position(|&index| index as usize >= vertex_count) {
            let index = self.indices[i];
            return Err(format!(
                "索引 {} 处的值 {} 超出顶点范围 (0-{})",
                i,
                index,
                vertex_count.saturating_sub(1)
            ));
        }

        Ok(())
    }
}

/// 网格模型
///
/// 拥有全部网格组、材质和纹理引用。组的插入顺序即组下标；
/// 删除组会使其后所有组的下标减一。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    groups: Vec<Group>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    derived_valid: bool,
    modulate_material_alpha: bool,
    flags: MeshFlags,
}

impl Mesh {
    /// 创建空网格
    pub fn new() -> Self {
        Self::default()
    }

    /// 由单个组创建网格，并计算派生数据
    pub fn new_with_group(group: Group) -> Self {
        let mut mesh = Self::new();
        mesh.add_group(group);
        mesh.recompute_derived();
        mesh
    }

    /// 释放全部组、材质和纹理
    pub fn clear(&mut self) {
        self.groups.clear();
        self.materials.clear();
        self.textures.clear();
        self.derived_valid = false;
    }

    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[inline]
    pub fn group(&self, grp: usize) -> Option<&Group> {
        self.groups.get(grp)
    }

    /// 可变访问一个组
    ///
    /// 修改顶点位置后派生数据会过期，需要调用 `recompute_derived`。
    #[inline]
    pub fn group_mut(&mut self, grp: usize) -> Option<&mut Group> {
        self.groups.get_mut(grp)
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub(crate) fn group_slot(&mut self, grp: usize) -> Result<&mut Group> {
        let count = self.groups.len();
        self.groups
            .get_mut(grp)
            .ok_or_else(|| GeometryError::GroupOutOfRange { index: grp, count }.into())
    }

    /// 组的用户标志；越界返回 0
    #[inline]
    pub fn group_user_flag(&self, grp: usize) -> u32 {
        self.groups.get(grp).map_or(0, |g| g.user_flag)
    }

    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[inline]
    pub fn material(&self, idx: usize) -> Option<&Material> {
        self.materials.get(idx)
    }

    #[inline]
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    #[inline]
    pub fn texture_name(&self, idx: usize) -> Option<&str> {
        self.textures.get(idx).map(|t| t.name.as_str())
    }

    /// 派生数据（重心/半径）当前是否有效
    #[inline]
    pub fn has_valid_derived(&self) -> bool {
        self.derived_valid
    }

    #[inline]
    pub fn flags(&self) -> MeshFlags {
        self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: MeshFlags) {
        self.flags = flags;
    }

    /// 材质 alpha 是否与纹理 alpha 相乘
    #[inline]
    pub fn modulates_material_alpha(&self) -> bool {
        self.modulate_material_alpha
    }

    #[inline]
    pub fn enable_material_alpha(&mut self, enable: bool) {
        self.modulate_material_alpha = enable;
    }

    /// 添加一个组并返回它的下标
    ///
    /// 如果派生数据有效，新组的派生数据会立即计算，引用也会被校正。
    pub fn add_group(&mut self, mut group: Group) -> usize {
        if self.derived_valid {
            group.compute_bounds();
            group.reconcile_refs(self.materials.len(), self.textures.len());
        }
        self.groups.push(group);
        self.groups.len() - 1
    }

    /// 复制给定的顶点和索引，添加为新组
    pub fn add_group_copy(&mut self, vertices: &[Vertex], indices: &[u16]) -> usize {
        self.add_group(Group::new(vertices.to_vec(), indices.to_vec()))
    }

    /// 向已有组追加几何数据
    ///
    /// `indices` 从 0 开始，追加时自动加上原有顶点数作为偏移。
    /// 组不存在、索引越界或合并后超出 16 位索引范围时返回 false，组保持不变。
    pub fn add_group_block(&mut self, grp: usize, vertices: &[Vertex], indices: &[u16]) -> bool {
        let derived_valid = self.derived_valid;
        let Some(group) = self.groups.get_mut(grp) else {
            return false;
        };

        let offset = group.vertices.len();
        if offset + vertices.len() > MAX_GROUP_VERTICES
            || indices.len() % 3 != 0
            || indices.iter().any(|&i| i as usize >= vertices.len())
        {
            return false;
        }

        group.vertices.extend_from_slice(vertices);
        group.indices.extend(indices.iter().map(|&i| (i as usize + offset) as u16));

        if derived_valid {
            group.compute_bounds();
        }
        true
    }

    /// 删除一个组
    ///
    /// 越界返回 false。其后组的下标全部减一，调用方不应跨删除缓存组下标。
    pub fn remove_group(&mut self, grp: usize) -> bool {
        if grp >= self.groups.len() {
            return false;
        }
        self.groups.remove(grp);
        true
    }

    /// 把另一个网格的每个组深拷贝追加到当前网格
    ///
    /// 只复制几何数据：新组的引用为 `Inherit`，标志、z-bias、用户标志和标签均为默认值。
    /// `other` 的材质和纹理不会被合并。
    pub fn merge(&mut self, other: &Mesh) {
        for group in &other.groups {
            self.add_group_copy(&group.vertices, &group.indices);
        }
    }

    /// 添加材质并返回它的下标
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.reconcile_all();
        self.materials.len() - 1
    }

    /// 删除材质
    ///
    /// 引用被删材质的组重置为材质 0，引用其后材质的组下标减一；
    /// `Default` / `Inherit` 不受影响。越界返回 false。
    pub fn remove_material(&mut self, idx: usize) -> bool {
        if idx >= self.materials.len() {
            return false;
        }
        let removed = idx as u32;
        for group in &mut self.groups {
            group.material = group.material.after_removal(removed);
        }
        self.materials.remove(idx);
        self.reconcile_all();
        true
    }

    /// 添加纹理并返回它的下标
    pub fn add_texture(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.reconcile_all();
        self.textures.len() - 1
    }

    /// 删除纹理，引用调整规则与 `remove_material` 相同
    pub fn remove_texture(&mut self, idx: usize) -> bool {
        if idx >= self.textures.len() {
            return false;
        }
        let removed = idx as u32;
        for group in &mut self.groups {
            group.texture = group.texture.after_removal(removed);
        }
        self.textures.remove(idx);
        self.reconcile_all();
        true
    }

    /// 重新计算全部组的派生数据，并校正所有材质/纹理引用
    pub fn recompute_derived(&mut self) {
        let (materials, textures) = (self.materials.len(), self.textures.len());
        for group in &mut self.groups {
            group.compute_bounds();
            group.reconcile_refs(materials, textures);
        }
        self.derived_valid = true;
    }

    /// 重新计算单个组的派生数据
    pub fn recompute_group(&mut self, grp: usize) -> Result<()> {
        self.group_slot(grp)?.compute_bounds();
        Ok(())
    }

    fn reconcile_all(&mut self) {
        let (materials, textures) = (self.materials.len(), self.textures.len());
        for group in &mut self.groups {
            group.reconcile_refs(materials, textures);
        }
    }

    /// 验证网格数据的有效性
    ///
    /// 逐组调用 `Group::validate`，失败时返回 `ExportError::Validation`。
    pub fn validate(&self) -> Result<()> {
        for (i, group) in self.groups.iter().enumerate() {
            group
                .validate()
                .map_err(|e| ExportError::Validation(format!("组 {}: {}", i, e)))?;
        }
        Ok(())
    }
}
