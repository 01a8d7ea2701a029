//! Fire-and-forget outputs of a tick: script events and effects.

use tracing::debug;

use stardrift_core::events::{GameEvent, SfxEvent};

#[derive(Debug, Default)]
pub struct EventQueue {
    game: Vec<GameEvent>,
    sfx: Vec<SfxEvent>,
}

impl EventQueue {
    pub fn raise(&mut self, event: GameEvent) {
        debug!(name = event.name(), "event queued");
        self.game.push(event);
    }

    pub fn add_sfx(&mut self, sfx: SfxEvent) {
        self.sfx.push(sfx);
    }

    pub fn game_events(&self) -> &[GameEvent] {
        &self.game
    }

    pub fn sfx(&self) -> &[SfxEvent] {
        &self.sfx
    }

    pub fn take_game_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.game)
    }

    pub fn take_sfx(&mut self) -> Vec<SfxEvent> {
        std::mem::take(&mut self.sfx)
    }
}
