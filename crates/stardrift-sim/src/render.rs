//! Drawing missiles through the renderer contract.

use std::rc::Rc;

use glam::{DMat3, DMat4, DVec3, Vec3};
use hecs::Entity;
use tracing::warn;

use stardrift_core::components::Body;
use stardrift_core::constants::MISSILE_EXHAUST_OFFSET;
use stardrift_graphics::descriptors::{
    BlendMode, EffectType, MaterialDescriptor, RenderStateDesc, TextureDescriptor,
    VertexAttrib, VertexBufferDesc,
};
use stardrift_graphics::resources::{Material, RenderState, Texture, VertexBuffer};
use stardrift_graphics::types::BufferUsage;
use stardrift_graphics::vertex_array::VertexArray;
use stardrift_graphics::{Color, MatrixMode, MatrixTicket, PrimitiveType, RenderResult, Renderer};

use crate::missile::Missile;
use crate::propulsion::Propulsion;
use crate::space::Space;

pub const FLARE_TEXTURE_CATEGORY: &str = "effect";
pub const FLARE_TEXTURE_NAME: &str = "thruster_flare";

/// Point-sprite size of a flare at full forward thrust.
const FLARE_SIZE: f32 = 6.0;

/// Viewpoint in root-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    pub orient: DMat3,
}

impl Camera {
    pub fn looking_from(position: DVec3) -> Self {
        Self {
            position,
            orient: DMat3::IDENTITY,
        }
    }

    /// World-to-view transform.
    pub fn view_transform(&self) -> DMat4 {
        (DMat4::from_translation(self.position) * DMat4::from_mat3(self.orient)).inverse()
    }
}

/// GPU resources shared by every missile.
pub struct MissileGraphics {
    model: Box<dyn VertexBuffer>,
    model_state: Box<dyn RenderState>,
    model_material: Box<dyn Material>,
    flare_state: Box<dyn RenderState>,
    flare_material: Box<dyn Material>,
    flare_texture: Rc<dyn Texture>,
}

impl MissileGraphics {
    pub fn new(renderer: &mut dyn Renderer) -> Self {
        let vertices = dart();
        let mut model = renderer.create_vertex_buffer(&VertexBufferDesc {
            attribs: vertices.attribs().to_vec(),
            num_vertices: vertices.vertex_count() as u32,
            usage: BufferUsage::Static,
        });
        if !model.populate(&vertices) {
            warn!("missile model did not fit its vertex buffer");
        }

        let flare_texture = match renderer.cached_texture(FLARE_TEXTURE_CATEGORY, FLARE_TEXTURE_NAME) {
            Some(texture) => texture,
            None => {
                let texture: Rc<dyn Texture> = Rc::from(renderer.create_texture(&TextureDescriptor {
                    generate_mipmaps: true,
                    ..Default::default()
                }));
                renderer.add_cached_texture(
                    FLARE_TEXTURE_CATEGORY,
                    FLARE_TEXTURE_NAME,
                    Rc::clone(&texture),
                );
                texture
            }
        };

        let model_material = renderer.create_material(&MaterialDescriptor {
            effect: EffectType::Lit,
            lighting: true,
            ..Default::default()
        });
        let mut flare_material = renderer.create_material(&MaterialDescriptor {
            effect: EffectType::Billboard,
            textures: 1,
            ..Default::default()
        });
        flare_material.set_diffuse(Color::from_rgba_u8(255, 200, 140, 255));

        Self {
            model,
            model_state: renderer.create_render_state(&RenderStateDesc::default()),
            model_material,
            flare_state: renderer.create_render_state(&RenderStateDesc {
                blend_mode: BlendMode::Additive,
                depth_write: false,
                ..Default::default()
            }),
            flare_material,
            flare_texture,
        }
    }

    pub fn flare_texture(&self) -> &Rc<dyn Texture> {
        &self.flare_texture
    }
}

/// A slim four-sided dart pointing down -Z.
fn dart() -> VertexArray {
    let nose = Vec3::new(0.0, 0.0, -4.0);
    let tail = [
        Vec3::new(0.5, 0.0, 4.0),
        Vec3::new(0.0, 0.5, 4.0),
        Vec3::new(-0.5, 0.0, 4.0),
        Vec3::new(0.0, -0.5, 4.0),
    ];
    let mut va = VertexArray::new(&[VertexAttrib::Position, VertexAttrib::Normal]);
    for i in 0..tail.len() {
        let a = tail[i];
        let b = tail[(i + 1) % tail.len()];
        let normal = (a - nose).cross(b - nose).normalize_or_zero();
        va.add_lit(nose, normal);
        va.add_lit(a, normal);
        va.add_lit(b, normal);
    }
    va
}

/// Draw one missile. Dead missiles draw nothing.
pub fn render_missile(
    space: &Space,
    missile: Entity,
    renderer: &mut dyn Renderer,
    gfx: &MissileGraphics,
    view: DMat4,
) -> RenderResult {
    if !space.is_alive(missile) || space.world.get::<&Missile>(missile).is_err() {
        return Ok(());
    }
    let Ok(body) = space.world.get::<&Body>(missile) else {
        return Ok(());
    };
    let position = space.frame_origin(body.frame) + body.position;
    let model = view * DMat4::from_translation(position) * DMat4::from_mat3(body.orient);
    let thrust = space
        .world
        .get::<&Propulsion>(missile)
        .map(|p| if p.is_thrusting() { p.lin_thruster_state().length() } else { 0.0 })
        .unwrap_or(0.0);

    let mut ticket = MatrixTicket::new(renderer, MatrixMode::ModelView);
    ticket.load_matrix(model.as_mat4());
    if thrust > 0.0 {
        let exhaust = MISSILE_EXHAUST_OFFSET.as_vec3();
        ticket.draw_point_sprites(
            &[exhaust],
            gfx.flare_state.as_ref(),
            gfx.flare_material.as_ref(),
            FLARE_SIZE * thrust as f32,
        )?;
    }
    ticket.draw_buffer(
        gfx.model.as_ref(),
        gfx.model_state.as_ref(),
        gfx.model_material.as_ref(),
        PrimitiveType::Triangles,
    )
}

/// Draw every live missile from `camera`.
pub fn render_missiles(
    space: &Space,
    renderer: &mut dyn Renderer,
    gfx: &MissileGraphics,
    camera: &Camera,
) -> RenderResult {
    let view = camera.view_transform();
    let missiles: Vec<Entity> = space
        .world
        .query::<&Missile>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    for missile in missiles {
        render_missile(space, missile, renderer, gfx, view)?;
    }
    Ok(())
}
