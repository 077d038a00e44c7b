//! Lane Rush core crate.
//!
//! Falling-note rhythm gameplay: notes are scheduled on a fixed beat grid,
//! fall at constant speed so they cross the hit line exactly on their beat,
//! and are judged against the player's key presses. The gameplay model in
//! [`game`] is plain Rust and runs natively; [`web`] binds it to a canvas,
//! the Web Audio clock and keyboard events.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod game;
mod logging;
pub mod web;

pub use config::{GameConfig, LaneBinding};
pub use error::{GameError, GameResult};
pub use game::{FrameTicket, GameEvent, Session, Status};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init();
}
