//! Terminal entry point. The browser build starts from `start_game` instead.

#[cfg(not(target_arch = "wasm32"))]
use brickfall::audio::{self, Silent, SoundPlayer, TerminalBell};
#[cfg(not(target_arch = "wasm32"))]
use brickfall::renderer::apply_input;
#[cfg(not(target_arch = "wasm32"))]
use brickfall::timestep::FixedStep;
#[cfg(not(target_arch = "wasm32"))]
use brickfall::{CliRenderer, Config, Game, Renderer};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

// Idle time between loop iterations so the loop doesn't spin a core
#[cfg(not(target_arch = "wasm32"))]
const IDLE_SLEEP: Duration = Duration::from_millis(1);

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::io::Result<()> {
    env_logger::init();

    // Optional JSON config path as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let mut sound: Box<dyn SoundPlayer> = if config.sound_enabled {
        Box::new(TerminalBell::stdout())
    } else {
        Box::new(Silent)
    };
    let mut step = FixedStep::new(config.tick_interval());
    let mut renderer = CliRenderer::new(config.width, config.height);
    let mut game = Game::new(config);

    renderer.init()?;
    log::info!("Brickfall starting");

    let mut last_frame = Instant::now();

    'game: loop {
        // Drain all pending input
        while let Some(input) = renderer.poll_input()? {
            if !apply_input(&mut game, input) {
                break 'game;
            }
        }

        // Update game logic at fixed rate
        let now = Instant::now();
        for _ in 0..step.advance(now - last_frame) {
            game.update();
        }
        last_frame = now;

        let events = game.take_events();
        audio::play_events(sound.as_mut(), &events)?;

        // Let renderer decide when to actually render
        // (it manages its own frame rate internally)
        renderer.render(&game)?;

        std::thread::sleep(IDLE_SLEEP);
    }

    renderer.cleanup()?;
    log::info!("Final score {}", game.score);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is start_game, this is just to satisfy the compiler
}
