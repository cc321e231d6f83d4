use crate::entity::Key;
use crate::game::Game;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Key { key: Key, pressed: bool },
    /// Pointer position in play-field coordinates
    PointerX(f64),
    /// Dismiss the banner shown between balls or after the game ends
    Acknowledge,
    Restart,
    Quit,
}

/// Trait that abstracts rendering implementation.
/// This allows for different rendering backends (CLI, Web, etc.)
pub trait Renderer {
    /// Initialize the renderer
    fn init(&mut self) -> io::Result<()>;

    /// Render the current game state
    fn render(&mut self, game: &Game) -> io::Result<()>;

    /// Clean up and restore terminal/display state
    fn cleanup(&mut self) -> io::Result<()>;

    /// Next queued input, if any. Callers drain this until it returns `None`.
    fn poll_input(&mut self) -> io::Result<Option<Input>>;
}

/// Apply one input to the game. Returns false when the player asked to quit.
pub fn apply_input(game: &mut Game, input: Input) -> bool {
    match input {
        Input::Key { key, pressed } => game.set_key(key, pressed),
        Input::PointerX(x) => game.pointer_moved(x),
        Input::Acknowledge => game.acknowledge(),
        Input::Restart => game.reset(),
        Input::Quit => return false,
    }
    true
}
