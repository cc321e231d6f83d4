use crate::audio::{self, Silent, SoundPlayer, WebAudio};
use crate::renderer::{apply_input, Renderer};
use crate::timestep::FixedStep;
use crate::web_renderer::WebRenderer;
use crate::{Config, Game};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const CANVAS_ID: &str = "canvas1";

fn js_error(e: std::io::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

struct GameLoop {
    game: Game,
    renderer: WebRenderer,
    sound: Box<dyn SoundPlayer>,
    step: FixedStep,
    last_time: Option<f64>,
}

impl GameLoop {
    fn new(config: Config) -> Result<Self, JsValue> {
        let mut renderer = WebRenderer::new(CANVAS_ID, config.width, config.height)?;
        renderer.init().map_err(js_error)?;

        let sound: Box<dyn SoundPlayer> = if config.sound_enabled {
            Box::new(WebAudio::new(&config.sound_path))
        } else {
            Box::new(Silent)
        };

        Ok(Self {
            step: FixedStep::new(config.tick_interval()),
            game: Game::new(config),
            renderer,
            sound,
            last_time: None,
        })
    }

    fn update_frame(&mut self, current_time: f64) -> Result<(), JsValue> {
        while let Some(input) = self.renderer.poll_input().map_err(js_error)? {
            if !apply_input(&mut self.game, input) {
                // In web, we can't really quit, just log it
                log::info!("Quit requested");
            }
        }

        // Update game logic at fixed rate
        let elapsed = self.last_time.map_or(0.0, |last| current_time - last);
        self.last_time = Some(current_time);
        for _ in 0..self.step.advance_ms(elapsed) {
            self.game.update();
        }

        let events = self.game.take_events();
        audio::play_events(self.sound.as_mut(), &events).map_err(js_error)?;

        // Render (renderer manages its own frame rate)
        self.renderer.render(&self.game).map_err(js_error)?;

        Ok(())
    }
}

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}

fn run(config: Config) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Ignore the error from a second start; the logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("Brickfall starting...");

    let game_loop = Rc::new(RefCell::new(GameLoop::new(config)?));

    // Closure re-registers itself every animation frame
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |current_time: f64| {
        if let Err(e) = game_loop.borrow_mut().update_frame(current_time) {
            log::error!("Frame failed: {:?}", e);
            return; // Stop loop on error
        }

        if let Some(callback) = f.borrow().as_ref() {
            if let Err(e) = request_animation_frame(callback) {
                log::error!("Failed to schedule next frame: {:?}", e);
            }
        }
    }) as Box<dyn FnMut(f64)>));

    // Start the loop
    match g.borrow().as_ref() {
        Some(callback) => request_animation_frame(callback)?,
        None => return Err(JsValue::from_str("animation callback missing")),
    }

    log::info!("Game loop started");
    Ok(())
}

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    run(Config::default())
}

/// Start with a JSON config; missing fields keep their defaults
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let config = Config::from_json(json).map_err(js_error)?;
    run(config)
}
