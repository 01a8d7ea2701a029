//! A renderer with no GPU behind it.
//!
//! Keeps the full matrix and state stacks and records every draw as a
//! `DrawCommand`, so simulation code and tests can run without a display.
//! Render targets and instancing are opt-in capabilities; when disabled the
//! backend reports them unsupported like a limited driver would.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};
use tracing::warn;

use crate::descriptors::{
    MaterialDescriptor, RenderStateDesc, RenderTargetDesc, TextureDescriptor, VertexBufferDesc,
};
use crate::renderer::{unsupported, RenderResult, Renderer, RendererBase, RendererError, Window};
use crate::resources::{
    IndexBuffer, InstanceBuffer, Material, RenderState, RenderTarget, Texture, VertexBuffer,
};
use crate::stats::StatType;
use crate::types::{
    BufferUsage, Color, Light, MatrixMode, PrimitiveType, RendererType, Scissor, Viewport,
};
use crate::vertex_array::VertexArray;

/// Pointer flags last applied to the headless window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowFlags {
    pub grabbed: bool,
    pub relative_mouse: bool,
}

/// Window stand-in; the renderer keeps a second handle to its flags.
#[derive(Debug, Default, Clone)]
pub struct HeadlessWindow {
    flags: Rc<Cell<WindowFlags>>,
}

impl Window for HeadlessWindow {
    fn set_grab(&mut self, grabbed: bool) {
        let mut flags = self.flags.get();
        flags.grabbed = grabbed;
        self.flags.set(flags);
    }

    fn set_relative_mouse_mode(&mut self, enabled: bool) {
        let mut flags = self.flags.get();
        flags.relative_mouse = enabled;
        self.flags.set(flags);
    }
}

/// Optional capabilities of the headless backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub render_targets: bool,
    pub instancing: bool,
}

/// One recorded draw submission.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Triangles {
        vertices: usize,
        primitive: PrimitiveType,
        model_view: Mat4,
    },
    PointSprites {
        count: usize,
        model_view: Mat4,
    },
    Buffer {
        vertices: u32,
        indices: Option<u32>,
        instances: Option<u32>,
        primitive: PrimitiveType,
        model_view: Mat4,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedState {
    matrix_mode: MatrixMode,
    model_view: Mat4,
    projection: Mat4,
    viewport: Viewport,
    scissor: Option<Scissor>,
    wireframe: bool,
    depth_range: (f64, f64),
    render_state: Option<RenderStateDesc>,
}

pub struct HeadlessRenderer {
    base: RendererBase,
    window: Rc<Cell<WindowFlags>>,
    caps: Capabilities,
    clear_color: Color,
    viewport: Viewport,
    matrix_mode: MatrixMode,
    model_view: Vec<Mat4>,
    projection: Vec<Mat4>,
    states: Vec<SavedState>,
    scissor: Option<Scissor>,
    wireframe: bool,
    depth_range: (f64, f64),
    render_state: Option<RenderStateDesc>,
    render_target: Option<RenderTargetDesc>,
    in_frame: bool,
    failing_frames: u32,
    frames_presented: u64,
    commands: Vec<DrawCommand>,
    rejected: Vec<&'static str>,
}

impl HeadlessRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_capabilities(width, height, Capabilities::default())
    }

    pub fn with_capabilities(width: u32, height: u32, caps: Capabilities) -> Self {
        let window = HeadlessWindow::default();
        let flags = Rc::clone(&window.flags);
        Self {
            base: RendererBase::new(Box::new(window), width, height),
            window: flags,
            caps,
            clear_color: Color::BLACK,
            viewport: Viewport::new(0, 0, width as i32, height as i32),
            matrix_mode: MatrixMode::ModelView,
            model_view: vec![Mat4::IDENTITY],
            projection: vec![Mat4::IDENTITY],
            states: Vec::new(),
            scissor: None,
            wireframe: false,
            depth_range: (0.0, 1.0),
            render_state: None,
            render_target: None,
            in_frame: false,
            failing_frames: 0,
            frames_presented: 0,
            commands: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Make the next `count` calls to `begin_frame` fail, as a lost device would.
    pub fn fail_next_frames(&mut self, count: u32) {
        self.failing_frames = count;
    }

    /// Report `operation` as unsupported from now on, as a limited driver
    /// would. Covers "clear color", "clear screen" and "perspective projection".
    pub fn reject_operation(&mut self, operation: &'static str) {
        if !self.rejected.contains(&operation) {
            self.rejected.push(operation);
        }
    }

    /// Draws recorded since the last `begin_frame`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn window_flags(&self) -> WindowFlags {
        self.window.get()
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn scissor(&self) -> Option<Scissor> {
        self.scissor
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn state_depth(&self) -> usize {
        self.states.len()
    }

    pub fn matrix_depth(&self, mode: MatrixMode) -> usize {
        match mode {
            MatrixMode::ModelView => self.model_view.len(),
            MatrixMode::Projection => self.projection.len(),
        }
    }

    pub fn depth_range(&self) -> (f64, f64) {
        self.depth_range
    }

    fn check_supported(&self, operation: &'static str) -> RenderResult {
        if self.rejected.contains(&operation) {
            unsupported(operation)
        } else {
            Ok(())
        }
    }

    fn require_frame(&self) -> RenderResult {
        if self.in_frame {
            Ok(())
        } else {
            Err(RendererError::FrameFailed("no frame in progress"))
        }
    }

    fn current_stack(&mut self) -> &mut Vec<Mat4> {
        match self.matrix_mode {
            MatrixMode::ModelView => &mut self.model_view,
            MatrixMode::Projection => &mut self.projection,
        }
    }

    fn top(&mut self) -> &mut Mat4 {
        let stack = self.current_stack();
        let last = stack.len() - 1;
        &mut stack[last]
    }

    fn record(&mut self, command: DrawCommand, tris: u64) {
        let stats = self.base.stats_mut();
        stats.add(StatType::DrawCalls, 1);
        stats.add(StatType::DrawTris, tris);
        self.commands.push(command);
    }
}

fn triangle_count(vertices: u64, primitive: PrimitiveType) -> u64 {
    match primitive {
        PrimitiveType::Triangles => vertices / 3,
        PrimitiveType::TriangleStrip | PrimitiveType::TriangleFan => vertices.saturating_sub(2),
        _ => 0,
    }
}

impl fmt::Debug for HeadlessRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessRenderer")
            .field("base", &self.base)
            .field("caps", &self.caps)
            .field("in_frame", &self.in_frame)
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl Renderer for HeadlessRenderer {
    fn base(&self) -> &RendererBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RendererBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "Headless"
    }

    fn renderer_type(&self) -> RendererType {
        RendererType::Headless
    }

    fn write_renderer_info(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "Renderer: {}", self.name())?;
        writeln!(out, "Surface: {}x{}", self.base.width(), self.base.height())?;
        writeln!(out, "Render targets: {}", self.caps.render_targets)?;
        writeln!(out, "Instancing: {}", self.caps.instancing)
    }

    fn supports_instancing(&self) -> bool {
        self.caps.instancing
    }

    fn max_aa_samples(&self) -> u32 {
        0
    }

    fn near_far_range(&self) -> Option<(f32, f32)> {
        Some((0.0001, 1.0e9))
    }

    fn begin_frame(&mut self) -> RenderResult {
        if self.in_frame {
            return Err(RendererError::FrameFailed("frame already in progress"));
        }
        if self.failing_frames > 0 {
            self.failing_frames -= 1;
            return Err(RendererError::FrameFailed("device unavailable"));
        }
        self.in_frame = true;
        self.commands.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult {
        self.require_frame()?;
        self.in_frame = false;
        Ok(())
    }

    fn swap_buffers(&mut self) -> RenderResult {
        if self.in_frame {
            return Err(RendererError::FrameFailed("swap before end of frame"));
        }
        self.base.stats_mut().next_frame();
        self.frames_presented += 1;
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<&dyn RenderTarget>) -> RenderResult {
        match target {
            None => {
                self.render_target = None;
                Ok(())
            }
            Some(_) if !self.caps.render_targets => unsupported("render targets"),
            Some(t) => {
                self.render_target = Some(*t.descriptor());
                Ok(())
            }
        }
    }

    fn clear_screen(&mut self) -> RenderResult {
        self.check_supported("clear screen")?;
        self.require_frame()
    }

    fn clear_depth_buffer(&mut self) -> RenderResult {
        self.require_frame()
    }

    fn set_clear_color(&mut self, color: Color) -> RenderResult {
        self.check_supported("clear color")?;
        self.clear_color = color;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> RenderResult {
        self.viewport = viewport;
        Ok(())
    }

    fn set_transform(&mut self, m: Mat4) -> RenderResult {
        let last = self.model_view.len() - 1;
        self.model_view[last] = m;
        Ok(())
    }

    fn set_perspective_projection(
        &mut self,
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> RenderResult {
        self.check_supported("perspective projection")?;
        self.set_projection(Mat4::perspective_rh_gl(fov.to_radians(), aspect, near, far))
    }

    fn set_orthographic_projection(
        &mut self,
        xmin: f32,
        xmax: f32,
        ymin: f32,
        ymax: f32,
        zmin: f32,
        zmax: f32,
    ) -> RenderResult {
        self.set_projection(Mat4::orthographic_rh_gl(xmin, xmax, ymin, ymax, zmin, zmax))
    }

    fn set_projection(&mut self, m: Mat4) -> RenderResult {
        let last = self.projection.len() - 1;
        self.projection[last] = m;
        Ok(())
    }

    fn set_render_state(&mut self, state: &dyn RenderState) -> RenderResult {
        self.render_state = Some(*state.descriptor());
        Ok(())
    }

    fn set_depth_range(&mut self, znear: f64, zfar: f64) -> RenderResult {
        self.depth_range = (znear, zfar);
        Ok(())
    }

    fn set_wireframe_mode(&mut self, enabled: bool) -> RenderResult {
        self.wireframe = enabled;
        Ok(())
    }

    fn set_lights(&mut self, lights: &[Light]) -> RenderResult {
        self.base.store_lights(lights)
    }

    fn num_lights(&self) -> usize {
        self.base.num_lights()
    }

    fn set_ambient_color(&mut self, color: Color) -> RenderResult {
        self.base.set_ambient(color);
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Option<Scissor>) -> RenderResult {
        self.scissor = scissor;
        Ok(())
    }

    fn draw_triangles(
        &mut self,
        vertices: &VertexArray,
        state: &dyn RenderState,
        _material: &dyn Material,
        primitive: PrimitiveType,
    ) -> RenderResult {
        self.require_frame()?;
        self.set_render_state(state)?;
        let model_view = self.current_model_view();
        let count = vertices.vertex_count();
        self.record(
            DrawCommand::Triangles {
                vertices: count,
                primitive,
                model_view,
            },
            triangle_count(count as u64, primitive),
        );
        Ok(())
    }

    fn draw_point_sprites(
        &mut self,
        positions: &[Vec3],
        state: &dyn RenderState,
        _material: &dyn Material,
        _size: f32,
    ) -> RenderResult {
        self.require_frame()?;
        self.set_render_state(state)?;
        let model_view = self.current_model_view();
        self.base
            .stats_mut()
            .add(StatType::DrawPointSprites, positions.len() as u64);
        self.record(
            DrawCommand::PointSprites {
                count: positions.len(),
                model_view,
            },
            0,
        );
        Ok(())
    }

    fn draw_point_sprites_sized(
        &mut self,
        positions: &[Vec3],
        offsets: &[Vec2],
        sizes: &[f32],
        state: &dyn RenderState,
        material: &dyn Material,
    ) -> RenderResult {
        if offsets.len() != positions.len() || sizes.len() != positions.len() {
            warn!(
                positions = positions.len(),
                offsets = offsets.len(),
                sizes = sizes.len(),
                "point sprite arrays differ in length"
            );
            return Err(RendererError::InvalidArgument(
                "point sprite arrays differ in length",
            ));
        }
        self.draw_point_sprites(positions, state, material, 0.0)
    }

    fn draw_buffer(
        &mut self,
        vertices: &dyn VertexBuffer,
        state: &dyn RenderState,
        _material: &dyn Material,
        primitive: PrimitiveType,
    ) -> RenderResult {
        self.require_frame()?;
        self.set_render_state(state)?;
        let model_view = self.current_model_view();
        let count = vertices.vertex_count();
        self.record(
            DrawCommand::Buffer {
                vertices: count,
                indices: None,
                instances: None,
                primitive,
                model_view,
            },
            triangle_count(count as u64, primitive),
        );
        Ok(())
    }

    fn draw_buffer_indexed(
        &mut self,
        vertices: &dyn VertexBuffer,
        indices: &dyn IndexBuffer,
        state: &dyn RenderState,
        _material: &dyn Material,
        primitive: PrimitiveType,
    ) -> RenderResult {
        self.require_frame()?;
        self.set_render_state(state)?;
        let model_view = self.current_model_view();
        let index_count = indices.index_count();
        self.record(
            DrawCommand::Buffer {
                vertices: vertices.vertex_count(),
                indices: Some(index_count),
                instances: None,
                primitive,
                model_view,
            },
            triangle_count(index_count as u64, primitive),
        );
        Ok(())
    }

    fn draw_buffer_instanced(
        &mut self,
        vertices: &dyn VertexBuffer,
        state: &dyn RenderState,
        _material: &dyn Material,
        instances: &dyn InstanceBuffer,
        primitive: PrimitiveType,
    ) -> RenderResult {
        if !self.caps.instancing {
            return unsupported("instanced drawing");
        }
        self.require_frame()?;
        self.set_render_state(state)?;
        let model_view = self.current_model_view();
        let count = vertices.vertex_count();
        let instance_count = instances.instance_count();
        self.base
            .stats_mut()
            .add(StatType::DrawInstances, instance_count as u64);
        self.record(
            DrawCommand::Buffer {
                vertices: count,
                indices: None,
                instances: Some(instance_count),
                primitive,
                model_view,
            },
            triangle_count(count as u64, primitive) * instance_count as u64,
        );
        Ok(())
    }

    fn draw_buffer_indexed_instanced(
        &mut self,
        vertices: &dyn VertexBuffer,
        indices: &dyn IndexBuffer,
        state: &dyn RenderState,
        _material: &dyn Material,
        instances: &dyn InstanceBuffer,
        primitive: PrimitiveType,
    ) -> RenderResult {
        if !self.caps.instancing {
            return unsupported("instanced drawing");
        }
        self.require_frame()?;
        self.set_render_state(state)?;
        let model_view = self.current_model_view();
        let index_count = indices.index_count();
        let instance_count = instances.instance_count();
        self.base
            .stats_mut()
            .add(StatType::DrawInstances, instance_count as u64);
        self.record(
            DrawCommand::Buffer {
                vertices: vertices.vertex_count(),
                indices: Some(index_count),
                instances: Some(instance_count),
                primitive,
                model_view,
            },
            triangle_count(index_count as u64, primitive) * instance_count as u64,
        );
        Ok(())
    }

    fn create_material(&mut self, descriptor: &MaterialDescriptor) -> Box<dyn Material> {
        self.base.stats_mut().add(StatType::MaterialsCreated, 1);
        Box::new(HeadlessMaterial {
            descriptor: *descriptor,
            diffuse: Color::WHITE,
        })
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Box<dyn Texture> {
        self.base.stats_mut().add(StatType::TexturesCreated, 1);
        Box::new(HeadlessTexture {
            descriptor: *descriptor,
        })
    }

    fn create_render_state(&mut self, descriptor: &RenderStateDesc) -> Box<dyn RenderState> {
        Box::new(HeadlessRenderState {
            descriptor: *descriptor,
        })
    }

    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDesc,
    ) -> Option<Box<dyn RenderTarget>> {
        if !self.caps.render_targets {
            return None;
        }
        Some(Box::new(HeadlessRenderTarget {
            descriptor: *descriptor,
        }))
    }

    fn create_vertex_buffer(&mut self, descriptor: &VertexBufferDesc) -> Box<dyn VertexBuffer> {
        self.base.stats_mut().add(StatType::BuffersCreated, 1);
        Box::new(HeadlessVertexBuffer {
            descriptor: descriptor.clone(),
            vertices: 0,
        })
    }

    fn create_index_buffer(&mut self, size: u32, usage: BufferUsage) -> Box<dyn IndexBuffer> {
        self.base.stats_mut().add(StatType::BuffersCreated, 1);
        Box::new(HeadlessIndexBuffer {
            size,
            usage,
            indices: Vec::new(),
        })
    }

    fn create_instance_buffer(&mut self, size: u32, usage: BufferUsage) -> Box<dyn InstanceBuffer> {
        self.base.stats_mut().add(StatType::BuffersCreated, 1);
        Box::new(HeadlessInstanceBuffer {
            size,
            usage,
            instances: 0,
        })
    }

    fn reload_shaders(&mut self) -> RenderResult {
        Ok(())
    }

    fn current_model_view(&self) -> Mat4 {
        *self.model_view.last().unwrap_or(&Mat4::IDENTITY)
    }

    fn current_projection(&self) -> Mat4 {
        *self.projection.last().unwrap_or(&Mat4::IDENTITY)
    }

    fn current_viewport(&self) -> Viewport {
        self.viewport
    }

    fn matrix_mode(&self) -> MatrixMode {
        self.matrix_mode
    }

    fn set_matrix_mode(&mut self, mode: MatrixMode) {
        self.matrix_mode = mode;
    }

    fn push_matrix(&mut self) {
        let top = *self.top();
        self.current_stack().push(top);
    }

    fn pop_matrix(&mut self) {
        let mode = self.matrix_mode;
        let stack = self.current_stack();
        if stack.len() > 1 {
            stack.pop();
        } else {
            warn!(?mode, "matrix stack underflow ignored");
        }
    }

    fn load_identity(&mut self) {
        *self.top() = Mat4::IDENTITY;
    }

    fn load_matrix(&mut self, m: Mat4) {
        *self.top() = m;
    }

    fn translate(&mut self, x: f32, y: f32, z: f32) {
        let top = self.top();
        *top *= Mat4::from_translation(Vec3::new(x, y, z));
    }

    fn scale(&mut self, x: f32, y: f32, z: f32) {
        let top = self.top();
        *top *= Mat4::from_scale(Vec3::new(x, y, z));
    }

    fn push_state(&mut self) {
        let saved = SavedState {
            matrix_mode: self.matrix_mode,
            model_view: self.current_model_view(),
            projection: self.current_projection(),
            viewport: self.viewport,
            scissor: self.scissor,
            wireframe: self.wireframe,
            depth_range: self.depth_range,
            render_state: self.render_state,
        };
        self.states.push(saved);
    }

    fn pop_state(&mut self) {
        let Some(saved) = self.states.pop() else {
            warn!("render state stack underflow ignored");
            return;
        };
        self.matrix_mode = saved.matrix_mode;
        let mv = self.model_view.len() - 1;
        self.model_view[mv] = saved.model_view;
        let pj = self.projection.len() - 1;
        self.projection[pj] = saved.projection;
        self.viewport = saved.viewport;
        self.scissor = saved.scissor;
        self.wireframe = saved.wireframe;
        self.depth_range = saved.depth_range;
        self.render_state = saved.render_state;
    }
}

#[derive(Debug)]
struct HeadlessTexture {
    descriptor: TextureDescriptor,
}

impl Texture for HeadlessTexture {
    fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }
}

#[derive(Debug)]
struct HeadlessMaterial {
    descriptor: MaterialDescriptor,
    diffuse: Color,
}

impl Material for HeadlessMaterial {
    fn descriptor(&self) -> &MaterialDescriptor {
        &self.descriptor
    }

    fn set_diffuse(&mut self, color: Color) {
        self.diffuse = color;
    }

    fn diffuse(&self) -> Color {
        self.diffuse
    }
}

#[derive(Debug)]
struct HeadlessRenderState {
    descriptor: RenderStateDesc,
}

impl RenderState for HeadlessRenderState {
    fn descriptor(&self) -> &RenderStateDesc {
        &self.descriptor
    }
}

#[derive(Debug)]
struct HeadlessRenderTarget {
    descriptor: RenderTargetDesc,
}

impl RenderTarget for HeadlessRenderTarget {
    fn descriptor(&self) -> &RenderTargetDesc {
        &self.descriptor
    }
}

#[derive(Debug)]
struct HeadlessVertexBuffer {
    descriptor: VertexBufferDesc,
    vertices: u32,
}

impl VertexBuffer for HeadlessVertexBuffer {
    fn descriptor(&self) -> &VertexBufferDesc {
        &self.descriptor
    }

    fn populate(&mut self, vertices: &VertexArray) -> bool {
        if vertices.vertex_count() > self.descriptor.num_vertices as usize {
            return false;
        }
        self.vertices = vertices.vertex_count() as u32;
        true
    }

    fn vertex_count(&self) -> u32 {
        self.vertices
    }
}

#[derive(Debug)]
struct HeadlessIndexBuffer {
    size: u32,
    usage: BufferUsage,
    indices: Vec<u32>,
}

impl IndexBuffer for HeadlessIndexBuffer {
    fn size(&self) -> u32 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn populate(&mut self, indices: &[u32]) -> bool {
        if indices.len() > self.size as usize {
            return false;
        }
        self.indices = indices.to_vec();
        true
    }

    fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[derive(Debug)]
struct HeadlessInstanceBuffer {
    size: u32,
    usage: BufferUsage,
    instances: u32,
}

impl InstanceBuffer for HeadlessInstanceBuffer {
    fn size(&self) -> u32 {
        self.size
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn populate(&mut self, transforms: &[Mat4]) -> bool {
        if transforms.len() > self.size as usize {
            return false;
        }
        self.instances = transforms.len() as u32;
        true
    }

    fn instance_count(&self) -> u32 {
        self.instances
    }
}
