//! Renderer contract for stardrift.
//!
//! A `Renderer` draws points, lines and triangles and creates the GPU-side
//! resources drawables need. Backends implement the trait; the shared
//! `RendererBase` supplies the texture cache, lights, stats and window
//! grab. Every fallible operation returns `Err(RendererError::Unsupported)`
//! when a backend lacks the capability rather than half-implementing it.

pub mod descriptors;
pub mod headless;
pub mod renderer;
pub mod resources;
pub mod stats;
pub mod tickets;
pub mod types;
pub mod vertex_array;

pub use headless::{Capabilities, DrawCommand, HeadlessRenderer, WindowFlags};
pub use renderer::{RenderResult, Renderer, RendererBase, RendererError, Window};
pub use tickets::{MatrixTicket, StateTicket};
pub use types::{Color, Light, MatrixMode, PrimitiveType, Viewport};
