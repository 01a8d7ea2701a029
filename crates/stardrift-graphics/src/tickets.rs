//! Scope guards over renderer state.
//!
//! Take a ticket before changing state; when the ticket drops, the previous
//! state comes back, whichever way the scope is left. Tickets deref to the
//! renderer so the guarded region keeps drawing through them. They are not
//! `Clone`: a copy would restore twice.

use std::ops::{Deref, DerefMut};

use crate::renderer::Renderer;
use crate::types::MatrixMode;

/// Restores the full render state stack on drop.
pub struct StateTicket<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
}

impl<'a, R: Renderer + ?Sized> StateTicket<'a, R> {
    pub fn new(renderer: &'a mut R) -> Self {
        renderer.push_state();
        Self { renderer }
    }
}

impl<R: Renderer + ?Sized> Drop for StateTicket<'_, R> {
    fn drop(&mut self) {
        self.renderer.pop_state();
    }
}

impl<R: Renderer + ?Sized> Deref for StateTicket<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> DerefMut for StateTicket<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

/// Selects `mode` and saves its matrix. On drop the matrix is restored and
/// the mode that was active when the ticket was taken is selected again.
pub struct MatrixTicket<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
    mode: MatrixMode,
    previous_mode: MatrixMode,
}

impl<'a, R: Renderer + ?Sized> MatrixTicket<'a, R> {
    pub fn new(renderer: &'a mut R, mode: MatrixMode) -> Self {
        let previous_mode = renderer.matrix_mode();
        renderer.set_matrix_mode(mode);
        renderer.push_matrix();
        Self {
            renderer,
            mode,
            previous_mode,
        }
    }

    pub fn mode(&self) -> MatrixMode {
        self.mode
    }
}

impl<R: Renderer + ?Sized> Drop for MatrixTicket<'_, R> {
    fn drop(&mut self) {
        self.renderer.set_matrix_mode(self.mode);
        self.renderer.pop_matrix();
        self.renderer.set_matrix_mode(self.previous_mode);
    }
}

impl<R: Renderer + ?Sized> Deref for MatrixTicket<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> DerefMut for MatrixTicket<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}
