//! Backend-owned GPU resources.
//!
//! Callers hold these as trait objects and never inspect backend handles.

use glam::Mat4;

use crate::descriptors::{
    MaterialDescriptor, RenderStateDesc, RenderTargetDesc, TextureDescriptor, VertexBufferDesc,
};
use crate::types::{BufferUsage, Color};
use crate::vertex_array::VertexArray;

pub trait Texture {
    fn descriptor(&self) -> &TextureDescriptor;
}

pub trait Material {
    fn descriptor(&self) -> &MaterialDescriptor;
    fn set_diffuse(&mut self, color: Color);
    fn diffuse(&self) -> Color;
}

pub trait RenderState {
    fn descriptor(&self) -> &RenderStateDesc;
}

pub trait RenderTarget {
    fn descriptor(&self) -> &RenderTargetDesc;
}

pub trait VertexBuffer {
    fn descriptor(&self) -> &VertexBufferDesc;
    /// Upload vertices. Returns false if the array does not fit.
    fn populate(&mut self, vertices: &VertexArray) -> bool;
    fn vertex_count(&self) -> u32;
}

pub trait IndexBuffer {
    fn size(&self) -> u32;
    fn usage(&self) -> BufferUsage;
    /// Upload indices. Returns false if they do not fit.
    fn populate(&mut self, indices: &[u32]) -> bool;
    fn index_count(&self) -> u32;
}

pub trait InstanceBuffer {
    fn size(&self) -> u32;
    fn usage(&self) -> BufferUsage;
    /// Upload per-instance transforms. Returns false if they do not fit.
    fn populate(&mut self, transforms: &[Mat4]) -> bool;
    fn instance_count(&self) -> u32;
}
