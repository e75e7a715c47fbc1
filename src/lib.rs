//! Lights Out core crate.
//!
//! A square grid of cells whose states cycle modulo a configurable base.
//! Clicking a cell bumps it and its orthogonal neighbours. Size, base and the
//! full cell state live in the page address, so any position can be shared as
//! a link. The grid model and the address codec are plain Rust and run
//! natively; the `web` module binds them to the DOM.

use wasm_bindgen::prelude::*;

pub mod grid;
pub mod location;
pub mod session;
mod web;

pub use grid::{Cell, Grid, GridConfig};
pub use location::{BrowserLocation, Location, LocationError, MemoryLocation};
pub use session::{CodecError, Decoded, Session, SessionState, decode, encode, restore};
pub use web::PageIds;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Grid size used when the size input holds nothing usable.
pub const DEFAULT_SIZE: usize = 5;
/// Base used when the base input holds nothing usable.
pub const DEFAULT_BASE: u32 = 2;
/// Largest accepted grid size; keeps the address at most 4096 state digits.
pub const MAX_SIZE: usize = 64;
/// States are written as one decimal digit per cell, so the base stops at 10.
pub const MAX_BASE: u32 = 10;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "tracing_wasm")]
    tracing_wasm::set_as_global_default();
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Mount on the default page layout (`#input-size`, `#input-base`,
/// `#button-reset`, `#game`).
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::mount(&PageIds::default())
}

#[wasm_bindgen]
pub fn start_game_with_ids(
    size_input: &str,
    base_input: &str,
    reset_button: &str,
    container: &str,
) -> Result<(), JsValue> {
    web::mount(&PageIds {
        size_input: size_input.to_string(),
        base_input: base_input.to_string(),
        reset_button: reset_button.to_string(),
        container: container.to_string(),
    })
}

/// Stateless helper for hosts: apply one click to the position encoded in
/// `query` and return the new query string.
#[wasm_bindgen]
pub fn click_query(query: &str, x: i32, y: i32) -> String {
    let mut session = Session::from_query(Some(query), GridConfig::default());
    session.click(x as i64, y as i64);
    session.query()
}
