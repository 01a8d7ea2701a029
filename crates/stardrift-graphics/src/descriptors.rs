//! Immutable descriptors handed to the resource factories.

use glam::UVec2;

use crate::types::BufferUsage;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectType {
    #[default]
    Unlit,
    Lit,
    Billboard,
    Ui,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialDescriptor {
    pub effect: EffectType,
    pub lighting: bool,
    pub vertex_colors: bool,
    pub alpha_test: bool,
    pub instanced: bool,
    pub textures: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    #[default]
    Rgba8888,
    Rgb888,
    Luminance8,
    Depth,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureSampleMode {
    #[default]
    LinearClamp,
    NearestClamp,
    LinearRepeat,
    NearestRepeat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub format: TextureFormat,
    pub data_size: UVec2,
    pub sample_mode: TextureSampleMode,
    pub generate_mipmaps: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Solid,
    Additive,
    Alpha,
    AlphaPremultiplied,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    #[default]
    Back,
    Front,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderStateDesc {
    pub blend_mode: BlendMode,
    pub cull_mode: CullMode,
    pub depth_test: bool,
    pub depth_write: bool,
}

impl Default for RenderStateDesc {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Solid,
            cull_mode: CullMode::Back,
            depth_test: true,
            depth_write: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderTargetDesc {
    pub width: u32,
    pub height: u32,
    pub color_format: TextureFormat,
    pub depth_format: Option<TextureFormat>,
    pub allow_depth_texture: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexAttrib {
    Position,
    Normal,
    Diffuse,
    Uv0,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexBufferDesc {
    pub attribs: Vec<VertexAttrib>,
    pub num_vertices: u32,
    pub usage: BufferUsage,
}
