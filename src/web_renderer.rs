use crate::entity::Key;
use crate::game::{Game, GameState};
use crate::renderer::{Input, Renderer};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::io;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent};

const TARGET_FRAME_TIME: f64 = 16.0; // ~60 FPS

const COLOR_BRICK: &str = "#0095DD";
const COLOR_BRICK_EDGE: &str = "rgb(255,69,0)";
const COLOR_BALL: &str = "#F6BE00";
const COLOR_PADDLE: &str = "#ff0000";
const COLOR_SCORE: &str = "#0095DD";
const COLOR_LIVES: &str = "#ff0000";
const COLOR_OVERLAY: &str = "rgba(0, 0, 0, 0.6)";
const COLOR_BANNER: &str = "#FFFFFF";
const HUD_FONT: &str = "18px Arial";

fn js_error(e: JsValue) -> io::Error {
    io::Error::other(format!("{:?}", e))
}

pub struct WebRenderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    window: web_sys::Window,
    device_pixel_ratio: f64,
    field_width: f64,
    field_height: f64,
    last_render_time: f64,

    // Input state
    pending_input: Rc<RefCell<VecDeque<Input>>>,
}

impl WebRenderer {
    pub fn new(canvas_id: &str, field_width: f64, field_height: f64) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        // Get device pixel ratio for high DPI displays
        let device_pixel_ratio = window.device_pixel_ratio();

        Ok(Self {
            canvas,
            context,
            window,
            device_pixel_ratio,
            field_width,
            field_height,
            last_render_time: 0.0,
            pending_input: Rc::new(RefCell::new(VecDeque::new())),
        })
    }

    fn setup_keyboard_listeners(&self) -> Result<(), JsValue> {
        let pending_input = self.pending_input.clone();
        let keydown = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let input = match event.key().as_str() {
                "ArrowLeft" | "Left" => Some(Input::Key { key: Key::Left, pressed: true }),
                "ArrowRight" | "Right" => Some(Input::Key { key: Key::Right, pressed: true }),
                " " | "Enter" => Some(Input::Acknowledge),
                "r" | "R" => Some(Input::Restart),
                _ => None,
            };

            if let Some(input) = input {
                // Auto-repeat only re-sends the same held state
                if !(event.repeat() && matches!(input, Input::Key { .. })) {
                    pending_input.borrow_mut().push_back(input);
                }
                event.prevent_default();
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        self.window
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget(); // Keep listener alive

        let pending_input = self.pending_input.clone();
        let keyup = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = match event.key().as_str() {
                "ArrowLeft" | "Left" => Key::Left,
                "ArrowRight" | "Right" => Key::Right,
                _ => return,
            };
            pending_input
                .borrow_mut()
                .push_back(Input::Key { key, pressed: false });
        }) as Box<dyn FnMut(KeyboardEvent)>);

        self.window
            .add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();

        Ok(())
    }

    fn setup_mouse_listeners(&self) -> Result<(), JsValue> {
        let document = self.window.document().ok_or("no document")?;

        // Tracked on the whole document so the paddle follows the pointer
        // even when it drifts off the canvas edge
        let pending_input = self.pending_input.clone();
        let canvas = self.canvas.clone();
        let field_width = self.field_width;
        let mousemove = Closure::wrap(Box::new(move |event: MouseEvent| {
            let rect = canvas.get_bounding_client_rect();
            if rect.width() <= 0.0 {
                return;
            }
            let relative_x = (event.client_x() as f64 - rect.left()) * field_width / rect.width();

            let mut pending = pending_input.borrow_mut();
            // Only the latest pointer position matters
            if let Some(Input::PointerX(x)) = pending.back_mut() {
                *x = relative_x;
            } else {
                pending.push_back(Input::PointerX(relative_x));
            }
        }) as Box<dyn FnMut(MouseEvent)>);

        document.add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();

        let pending_input = self.pending_input.clone();
        let click = Closure::wrap(Box::new(move |_event: MouseEvent| {
            pending_input.borrow_mut().push_back(Input::Acknowledge);
        }) as Box<dyn FnMut(MouseEvent)>);

        self.canvas
            .add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();

        Ok(())
    }

    fn resize_canvas(&self) -> Result<(), JsValue> {
        // Display size (CSS pixels)
        let display_width = self.field_width;
        let display_height = self.field_height;

        // Internal resolution (actual pixels, scaled for high DPI)
        self.canvas
            .set_width((display_width * self.device_pixel_ratio) as u32);
        self.canvas
            .set_height((display_height * self.device_pixel_ratio) as u32);

        let element: &HtmlElement = self.canvas.unchecked_ref();
        element
            .style()
            .set_property("width", &format!("{}px", display_width))?;
        element
            .style()
            .set_property("height", &format!("{}px", display_height))?;

        // Setting canvas width/height resets the context transform
        self.context
            .scale(self.device_pixel_ratio, self.device_pixel_ratio)?;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.window
            .performance()
            .map(|p| p.now())
            .unwrap_or(self.last_render_time + TARGET_FRAME_TIME)
    }

    fn draw_bricks(&self, game: &Game) {
        self.context.set_fill_style_str(COLOR_BRICK);
        self.context.set_stroke_style_str(COLOR_BRICK_EDGE);
        for brick in game.bricks.active() {
            self.context.begin_path();
            self.context.rect(brick.x, brick.y, brick.width, brick.height);
            self.context.fill();
            self.context.stroke();
            self.context.close_path();
        }
    }

    fn draw_ball(&self, game: &Game) -> Result<(), JsValue> {
        let ball = &game.ball;
        self.context.begin_path();
        self.context
            .arc(ball.position.x, ball.position.y, ball.radius, 0.0, TAU)?;
        self.context.set_fill_style_str(COLOR_BALL);
        self.context.fill();
        self.context.close_path();
        Ok(())
    }

    fn draw_paddle(&self, game: &Game) {
        let paddle = &game.paddle;
        self.context.begin_path();
        self.context.rect(
            paddle.x,
            paddle.top(self.field_height),
            paddle.width,
            paddle.height,
        );
        self.context.set_fill_style_str(COLOR_PADDLE);
        self.context.fill();
        self.context.close_path();
    }

    fn draw_hud(&self, game: &Game) -> Result<(), JsValue> {
        self.context.set_font(HUD_FONT);
        self.context.set_text_align("left");
        self.context.set_text_baseline("alphabetic");

        self.context.set_fill_style_str(COLOR_SCORE);
        self.context
            .fill_text(&format!("Score: {}", game.score), 8.0, 20.0)?;

        self.context.set_fill_style_str(COLOR_LIVES);
        self.context.fill_text(
            &format!("Lives: {}", game.lives),
            self.field_width - 65.0,
            20.0,
        )?;
        Ok(())
    }

    fn draw_banner(&self, game: &Game) -> Result<(), JsValue> {
        let Some((headline, hint)) = game.state.banner() else {
            return Ok(());
        };

        self.context.set_fill_style_str(COLOR_OVERLAY);
        self.context
            .fill_rect(0.0, 0.0, self.field_width, self.field_height);

        let headline_color = match game.state {
            GameState::Won => "#55FF55",
            GameState::Lost => "#FF5555",
            _ => COLOR_BANNER,
        };
        let center_x = self.field_width / 2.0;
        let center_y = self.field_height / 2.0;

        self.context.set_text_align("center");
        self.context.set_text_baseline("middle");

        self.context.set_font("bold 36px Arial");
        self.context.set_fill_style_str(headline_color);
        self.context.fill_text(&headline, center_x, center_y - 20.0)?;

        self.context.set_font(HUD_FONT);
        self.context.set_fill_style_str(COLOR_BANNER);
        self.context.fill_text(hint, center_x, center_y + 20.0)?;
        Ok(())
    }

    fn draw(&self, game: &Game) -> Result<(), JsValue> {
        self.context
            .clear_rect(0.0, 0.0, self.field_width, self.field_height);

        self.draw_bricks(game);
        self.draw_ball(game)?;
        self.draw_paddle(game);
        self.draw_hud(game)?;
        self.draw_banner(game)?;
        Ok(())
    }
}

impl Renderer for WebRenderer {
    fn init(&mut self) -> io::Result<()> {
        self.setup_keyboard_listeners().map_err(js_error)?;
        self.setup_mouse_listeners().map_err(js_error)?;
        self.resize_canvas().map_err(js_error)?;

        self.last_render_time = self.current_time();
        log::info!(
            "Canvas ready: {}x{} at {}x pixel ratio",
            self.field_width,
            self.field_height,
            self.device_pixel_ratio
        );
        Ok(())
    }

    fn render(&mut self, game: &Game) -> io::Result<()> {
        let now = self.current_time();

        // Frame rate limiting
        if now - self.last_render_time < TARGET_FRAME_TIME {
            return Ok(());
        }
        self.last_render_time = now;

        self.draw(game).map_err(js_error)
    }

    fn cleanup(&mut self) -> io::Result<()> {
        // No cleanup needed for web
        Ok(())
    }

    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        Ok(self.pending_input.borrow_mut().pop_front())
    }
}
