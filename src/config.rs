use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;

/// Game configuration. Distances are in play-field pixels, speeds in
/// pixels per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: f64,
    pub height: f64,

    pub ball_radius: f64,
    pub ball_velocity: (f64, f64),
    /// Serve height, measured up from the bottom edge
    pub ball_start_height: f64,

    pub paddle_width: f64,
    pub paddle_height: f64,
    pub paddle_speed: f64,

    pub brick_rows: usize,
    pub brick_columns: usize,
    pub brick_width: f64,
    pub brick_height: f64,
    pub brick_padding: f64,
    pub brick_offset_top: f64,
    pub brick_offset_left: f64,

    pub lives: u32,
    pub tick_interval_ms: u64,

    pub sound_enabled: bool,
    /// Directory the browser build fetches sound files from
    pub sound_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 730.0,
            height: 500.0,

            ball_radius: 12.0,
            ball_velocity: (2.0, -2.0),
            ball_start_height: 30.0,

            paddle_width: 95.0,
            paddle_height: 15.0,
            paddle_speed: 7.0,

            brick_rows: 5,
            brick_columns: 8,
            brick_width: 75.0,
            brick_height: 20.0,
            brick_padding: 10.0,
            brick_offset_top: 30.0,
            brick_offset_left: 30.0,

            lives: 3,
            tick_interval_ms: 10,

            sound_enabled: true,
            sound_path: "GameSounds".to_string(),
        }
    }
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}

impl Config {
    pub fn from_json(json: &str) -> io::Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> io::Result<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("ball_radius", self.ball_radius),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("brick_width", self.brick_width),
            ("brick_height", self.brick_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        if self.brick_padding < 0.0 || self.brick_offset_top < 0.0 || self.brick_offset_left < 0.0 {
            return Err(invalid("brick padding and offsets must not be negative"));
        }
        if self.brick_rows == 0 || self.brick_columns == 0 {
            return Err(invalid("brick grid needs at least one row and one column"));
        }
        if self.lives == 0 {
            return Err(invalid("lives must be at least 1"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be at least 1"));
        }
        if self.paddle_width >= self.width {
            return Err(invalid(format!(
                "paddle_width {} does not fit in width {}",
                self.paddle_width, self.width
            )));
        }
        if 2.0 * self.ball_radius >= self.width {
            return Err(invalid("ball_radius is too large for the field width"));
        }
        if !(self.paddle_speed.is_finite() && self.paddle_speed > 0.0) {
            return Err(invalid(format!(
                "paddle_speed must be positive, got {}",
                self.paddle_speed
            )));
        }

        let (dx, dy) = self.ball_velocity;
        if !(dx.is_finite() && dy.is_finite()) || dx == 0.0 || dy == 0.0 {
            return Err(invalid(format!(
                "ball_velocity components must be finite and non-zero, got ({dx}, {dy})"
            )));
        }
        // One step must not carry the ball across the whole gap between the walls
        if dx.abs() >= self.width - 2.0 * self.ball_radius {
            return Err(invalid(format!(
                "ball_velocity x step {dx} is too large for the field width {}",
                self.width
            )));
        }
        if !(self.ball_start_height > 2.0 * self.ball_radius
            && self.ball_start_height < self.height - self.ball_radius)
        {
            return Err(invalid(format!(
                "ball_start_height {} must lie between {} and {}",
                self.ball_start_height,
                2.0 * self.ball_radius,
                self.height - self.ball_radius
            )));
        }

        let (right, bottom) = self.brick_grid_extent();
        if right > self.width || bottom > self.height {
            return Err(invalid(format!(
                "brick grid ({right} x {bottom}) does not fit in the {} x {} field",
                self.width, self.height
            )));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn serve_position(&self) -> (f64, f64) {
        (self.width / 2.0, self.height - self.ball_start_height)
    }

    /// Right and bottom edges of the last brick column and row
    pub fn brick_grid_extent(&self) -> (f64, f64) {
        let columns = self.brick_columns as f64;
        let rows = self.brick_rows as f64;
        let right = self.brick_offset_left + columns * self.brick_width
            + (columns - 1.0).max(0.0) * self.brick_padding;
        let bottom = self.brick_offset_top + rows * self.brick_height
            + (rows - 1.0).max(0.0) * self.brick_padding;
        (right, bottom)
    }
}
