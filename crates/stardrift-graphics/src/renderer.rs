//! The renderer contract and the state shared by every backend.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use glam::{DMat4, Mat4, Vec2, Vec3};
use thiserror::Error;
use tracing::debug;

use crate::descriptors::{
    MaterialDescriptor, RenderStateDesc, RenderTargetDesc, TextureDescriptor, VertexBufferDesc,
};
use crate::resources::{
    IndexBuffer, InstanceBuffer, Material, RenderState, RenderTarget, Texture, VertexBuffer,
};
use crate::stats::Stats;
use crate::types::{
    BufferUsage, Color, Light, MatrixMode, PrimitiveType, RendererType, Scissor, ScreendumpState,
    Viewport, MAX_LIGHTS,
};
use crate::vertex_array::VertexArray;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    #[error("{operation} is not supported by this renderer")]
    Unsupported { operation: &'static str },
    #[error("frame failed: {0}")]
    FrameFailed(&'static str),
    #[error("{0} stack underflow")]
    StackUnderflow(&'static str),
    #[error("{count} lights requested, at most {max} supported", max = MAX_LIGHTS)]
    InvalidLightCount { count: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

pub type RenderResult = Result<(), RendererError>;

pub(crate) fn unsupported(operation: &'static str) -> RenderResult {
    Err(RendererError::Unsupported { operation })
}

/// The platform window a renderer presents into.
pub trait Window {
    fn set_grab(&mut self, grabbed: bool);
    fn set_relative_mouse_mode(&mut self, enabled: bool);
}

/// Composite cache key: (resource category, resource name).
pub type TextureCacheKey = (String, String);

/// State every backend carries: surface size, lighting, stats and the
/// texture cache. Dropping the base releases every cached texture.
pub struct RendererBase {
    window: Box<dyn Window>,
    width: u32,
    height: u32,
    ambient: Color,
    lights: [Light; MAX_LIGHTS],
    num_lights: usize,
    stats: Stats,
    textures: BTreeMap<TextureCacheKey, Rc<dyn Texture>>,
}

impl RendererBase {
    pub fn new(window: Box<dyn Window>, width: u32, height: u32) -> Self {
        Self {
            window,
            width,
            height,
            ambient: Color::BLACK,
            lights: [Light::default(); MAX_LIGHTS],
            num_lights: 0,
            stats: Stats::default(),
            textures: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    pub fn set_ambient(&mut self, color: Color) {
        self.ambient = color;
    }

    pub fn light(&self, idx: usize) -> Option<&Light> {
        self.lights.get(idx)
    }

    pub fn num_lights(&self) -> usize {
        self.num_lights
    }

    /// Copy `lights` into the fixed light array; unused slots are reset.
    pub fn store_lights(&mut self, lights: &[Light]) -> RenderResult {
        if lights.len() > MAX_LIGHTS {
            return Err(RendererError::InvalidLightCount {
                count: lights.len(),
            });
        }
        self.lights = [Light::default(); MAX_LIGHTS];
        self.lights[..lights.len()].copy_from_slice(lights);
        self.num_lights = lights.len();
        Ok(())
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub fn window_mut(&mut self) -> &mut dyn Window {
        self.window.as_mut()
    }

    pub fn cached_texture(&self, category: &str, name: &str) -> Option<Rc<dyn Texture>> {
        self.textures
            .get(&(category.to_string(), name.to_string()))
            .cloned()
    }

    pub fn add_cached_texture(&mut self, category: &str, name: &str, texture: Rc<dyn Texture>) {
        self.remove_cached_texture(category, name);
        self.textures
            .insert((category.to_string(), name.to_string()), texture);
    }

    pub fn remove_cached_texture(&mut self, category: &str, name: &str) {
        if self
            .textures
            .remove(&(category.to_string(), name.to_string()))
            .is_some()
        {
            debug!(category, name, "released cached texture");
        }
    }

    pub fn remove_all_cached_textures(&mut self) {
        self.textures.clear();
    }

    pub fn cached_texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl Drop for RendererBase {
    fn drop(&mut self) {
        self.remove_all_cached_textures();
    }
}

impl fmt::Debug for RendererBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererBase")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("ambient", &self.ambient)
            .field("num_lights", &self.num_lights)
            .field("cached_textures", &self.textures.len())
            .finish()
    }
}

/// Renderer base contract. Operations return `Err` when they fail or the
/// backend does not support them; callers check and degrade.
///
/// 2D drawing is generally understood to be for UI use (unlit, ortho
/// projection). Every draw takes an explicit render state and material;
/// the only implicit state is the matrix stack and viewport.
pub trait Renderer {
    fn base(&self) -> &RendererBase;
    fn base_mut(&mut self) -> &mut RendererBase;

    fn name(&self) -> &'static str;
    fn renderer_type(&self) -> RendererType;

    fn write_renderer_info(&self, _out: &mut dyn fmt::Write) -> fmt::Result {
        Ok(())
    }

    fn check_render_errors(&self, _func: &str, _line: u32) {}

    fn supports_instancing(&self) -> bool;

    fn window_width(&self) -> u32 {
        self.base().width()
    }

    fn window_height(&self) -> u32 {
        self.base().height()
    }

    fn display_aspect(&self) -> f32 {
        self.base().width() as f32 / self.base().height().max(1) as f32
    }

    fn max_aa_samples(&self) -> u32;

    /// Supported minimum near and maximum far plane distances.
    fn near_far_range(&self) -> Option<(f32, f32)>;

    fn begin_frame(&mut self) -> RenderResult;
    fn end_frame(&mut self) -> RenderResult;
    /// UI traditionally draws between `end_frame` and `swap_buffers`.
    fn swap_buffers(&mut self) -> RenderResult;

    /// `None` renders to the screen.
    fn set_render_target(&mut self, target: Option<&dyn RenderTarget>) -> RenderResult;

    /// Clear color and depth buffers.
    fn clear_screen(&mut self) -> RenderResult;
    fn clear_depth_buffer(&mut self) -> RenderResult;
    fn set_clear_color(&mut self, color: Color) -> RenderResult;

    fn set_viewport(&mut self, viewport: Viewport) -> RenderResult;

    /// Set the model view matrix.
    fn set_transform(&mut self, m: Mat4) -> RenderResult;

    /// Double-precision convenience for simulation-space transforms.
    fn set_transform_f64(&mut self, m: DMat4) -> RenderResult {
        self.set_transform(m.as_mat4())
    }

    /// `fov` is the vertical field of view in degrees.
    fn set_perspective_projection(&mut self, fov: f32, aspect: f32, near: f32, far: f32)
        -> RenderResult;
    fn set_orthographic_projection(
        &mut self,
        xmin: f32,
        xmax: f32,
        ymin: f32,
        ymax: f32,
        zmin: f32,
        zmax: f32,
    ) -> RenderResult;
    fn set_projection(&mut self, m: Mat4) -> RenderResult;

    fn set_render_state(&mut self, state: &dyn RenderState) -> RenderResult;

    fn set_depth_range(&mut self, znear: f64, zfar: f64) -> RenderResult;

    fn set_wireframe_mode(&mut self, enabled: bool) -> RenderResult;

    /// At most `MAX_LIGHTS` lights.
    fn set_lights(&mut self, lights: &[Light]) -> RenderResult;

    fn light(&self, idx: usize) -> Option<&Light> {
        self.base().light(idx)
    }

    fn num_lights(&self) -> usize {
        0
    }

    fn set_ambient_color(&mut self, color: Color) -> RenderResult;

    fn ambient_color(&self) -> Color {
        self.base().ambient()
    }

    /// `None` disables scissoring.
    fn set_scissor(&mut self, scissor: Option<Scissor>) -> RenderResult;

    /// Unindexed triangle draw from a transient vertex array.
    fn draw_triangles(
        &mut self,
        vertices: &VertexArray,
        state: &dyn RenderState,
        material: &dyn Material,
        primitive: PrimitiveType,
    ) -> RenderResult;

    /// Batch of textured quads of uniform size, for particles etc.
    fn draw_point_sprites(
        &mut self,
        positions: &[Vec3],
        state: &dyn RenderState,
        material: &dyn Material,
        size: f32,
    ) -> RenderResult;

    /// Point sprites with a per-sprite offset and size.
    fn draw_point_sprites_sized(
        &mut self,
        positions: &[Vec3],
        offsets: &[Vec2],
        sizes: &[f32],
        state: &dyn RenderState,
        material: &dyn Material,
    ) -> RenderResult;

    /// Complex unchanging geometry stored in GPU buffers.
    fn draw_buffer(
        &mut self,
        vertices: &dyn VertexBuffer,
        state: &dyn RenderState,
        material: &dyn Material,
        primitive: PrimitiveType,
    ) -> RenderResult;

    fn draw_buffer_indexed(
        &mut self,
        vertices: &dyn VertexBuffer,
        indices: &dyn IndexBuffer,
        state: &dyn RenderState,
        material: &dyn Material,
        primitive: PrimitiveType,
    ) -> RenderResult;

    fn draw_buffer_instanced(
        &mut self,
        vertices: &dyn VertexBuffer,
        state: &dyn RenderState,
        material: &dyn Material,
        instances: &dyn InstanceBuffer,
        primitive: PrimitiveType,
    ) -> RenderResult;

    fn draw_buffer_indexed_instanced(
        &mut self,
        vertices: &dyn VertexBuffer,
        indices: &dyn IndexBuffer,
        state: &dyn RenderState,
        material: &dyn Material,
        instances: &dyn InstanceBuffer,
        primitive: PrimitiveType,
    ) -> RenderResult;

    /// Creates a unique material. The caller owns it.
    fn create_material(&mut self, descriptor: &MaterialDescriptor) -> Box<dyn Material>;
    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Box<dyn Texture>;
    fn create_render_state(&mut self, descriptor: &RenderStateDesc) -> Box<dyn RenderState>;
    /// `None` if off-screen targets are unsupported.
    fn create_render_target(&mut self, descriptor: &RenderTargetDesc) -> Option<Box<dyn RenderTarget>>;
    fn create_vertex_buffer(&mut self, descriptor: &VertexBufferDesc) -> Box<dyn VertexBuffer>;
    fn create_index_buffer(&mut self, size: u32, usage: BufferUsage) -> Box<dyn IndexBuffer>;
    fn create_instance_buffer(&mut self, size: u32, usage: BufferUsage) -> Box<dyn InstanceBuffer>;

    fn cached_texture(&self, category: &str, name: &str) -> Option<Rc<dyn Texture>> {
        self.base().cached_texture(category, name)
    }

    /// Replaces any texture already cached under the same key.
    fn add_cached_texture(&mut self, category: &str, name: &str, texture: Rc<dyn Texture>) {
        self.base_mut().add_cached_texture(category, name, texture);
    }

    fn remove_cached_texture(&mut self, category: &str, name: &str) {
        self.base_mut().remove_cached_texture(category, name);
    }

    fn remove_all_cached_textures(&mut self) {
        self.base_mut().remove_all_cached_textures();
    }

    fn reload_shaders(&mut self) -> RenderResult;

    fn current_model_view(&self) -> Mat4;
    fn current_projection(&self) -> Mat4;
    fn current_viewport(&self) -> Viewport;

    fn matrix_mode(&self) -> MatrixMode;
    fn set_matrix_mode(&mut self, mode: MatrixMode);
    fn push_matrix(&mut self);
    /// Popping the last matrix of a stack leaves it untouched.
    fn pop_matrix(&mut self);
    fn load_identity(&mut self);
    fn load_matrix(&mut self, m: Mat4);
    fn translate(&mut self, x: f32, y: f32, z: f32);
    fn scale(&mut self, x: f32, y: f32, z: f32);

    /// Save the full render state; paired with `pop_state` by `StateTicket`.
    fn push_state(&mut self);
    fn pop_state(&mut self);

    fn screendump(&mut self, _state: &mut ScreendumpState) -> RenderResult {
        unsupported("screendump")
    }

    fn frame_grab(&mut self, _state: &mut ScreendumpState) -> RenderResult {
        unsupported("frame grab")
    }

    fn stats(&self) -> &Stats {
        self.base().stats()
    }

    /// Grabbing the pointer also switches to relative mouse motion.
    fn set_grab(&mut self, grabbed: bool) {
        let window = self.base_mut().window_mut();
        window.set_grab(grabbed);
        window.set_relative_mouse_mode(grabbed);
    }
}
