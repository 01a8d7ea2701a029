//! Transient client-side vertex data for immediate draws and buffer uploads.

use glam::{Vec2, Vec3};

use crate::descriptors::VertexAttrib;
use crate::types::Color;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexArray {
    attribs: Vec<VertexAttrib>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub diffuse: Vec<Color>,
    pub uv0: Vec<Vec2>,
}

impl VertexArray {
    pub fn new(attribs: &[VertexAttrib]) -> Self {
        Self {
            attribs: attribs.to_vec(),
            ..Default::default()
        }
    }

    pub fn has_attrib(&self, attrib: VertexAttrib) -> bool {
        self.attribs.contains(&attrib)
    }

    pub fn attribs(&self) -> &[VertexAttrib] {
        &self.attribs
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.diffuse.clear();
        self.uv0.clear();
    }

    pub fn add(&mut self, position: Vec3) {
        self.positions.push(position);
    }

    pub fn add_colored(&mut self, position: Vec3, color: Color) {
        self.positions.push(position);
        self.diffuse.push(color);
    }

    pub fn add_lit(&mut self, position: Vec3, normal: Vec3) {
        self.positions.push(position);
        self.normals.push(normal);
    }

    pub fn add_textured(&mut self, position: Vec3, color: Color, uv: Vec2) {
        self.positions.push(position);
        self.diffuse.push(color);
        self.uv0.push(uv);
    }
}
