pub mod audio;
pub mod config;
pub mod entity;
pub mod game;
pub mod renderer;
pub mod timestep;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli_renderer;

#[cfg(target_arch = "wasm32")]
pub mod web_renderer;
#[cfg(target_arch = "wasm32")]
mod web_main;

pub use audio::{Sound, SoundPlayer};
pub use config::Config;
pub use entity::{Ball, Brick, BrickGrid, BrickStatus, Key, Paddle, Position};
pub use game::{Game, GameEvent, GameState};
pub use renderer::{Input, Renderer};

#[cfg(not(target_arch = "wasm32"))]
pub use cli_renderer::CliRenderer;
#[cfg(target_arch = "wasm32")]
pub use web_main::{start_game, start_game_with_config};
#[cfg(target_arch = "wasm32")]
pub use web_renderer::WebRenderer;
