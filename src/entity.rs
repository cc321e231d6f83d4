use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn moved(&self, velocity: (f64, f64)) -> Self {
        Position::new(self.x + velocity.0, self.y + velocity.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub position: Position,
    pub velocity: (f64, f64),
    pub radius: f64,
}

impl Ball {
    pub fn new(x: f64, y: f64, dx: f64, dy: f64, radius: f64) -> Self {
        Self {
            position: Position::new(x, y),
            velocity: (dx, dy),
            radius,
        }
    }

    /// Ball at the serve spot, heading up and to the right
    pub fn served(config: &Config) -> Self {
        let (x, y) = config.serve_position();
        let (dx, dy) = config.ball_velocity;
        Self::new(x, y, dx, dy, config.ball_radius)
    }

    pub fn next_position(&self) -> Position {
        self.position.moved(self.velocity)
    }

    pub fn advance(&mut self) {
        self.position = self.next_position();
    }

    pub fn reflect_x(&mut self) {
        self.velocity.0 = -self.velocity.0;
    }

    pub fn reflect_y(&mut self) {
        self.velocity.1 = -self.velocity.1;
    }
}

#[derive(Debug, Clone)]
pub struct Paddle {
    /// Left edge
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
}

impl Paddle {
    pub fn centered(config: &Config) -> Self {
        Self {
            x: (config.width - config.paddle_width) / 2.0,
            width: config.paddle_width,
            height: config.paddle_height,
            speed: config.paddle_speed,
        }
    }

    pub fn max_x(&self, field_width: f64) -> f64 {
        field_width - self.width
    }

    pub fn move_right(&mut self, field_width: f64) {
        let max_x = self.max_x(field_width);
        if self.x < max_x {
            self.x = (self.x + self.speed).min(max_x);
        }
    }

    pub fn move_left(&mut self) {
        if self.x > 0.0 {
            self.x = (self.x - self.speed).max(0.0);
        }
    }

    /// Center the paddle under the pointer. Positions that would push the
    /// paddle past either wall are ignored rather than clamped.
    pub fn follow_pointer(&mut self, relative_x: f64, field_width: f64) -> bool {
        let half = self.width / 2.0;
        if relative_x > half && relative_x < field_width - half {
            self.x = relative_x - half;
            true
        } else {
            false
        }
    }

    pub fn spans(&self, x: f64) -> bool {
        x > self.x && x < self.x + self.width
    }

    pub fn top(&self, field_height: f64) -> f64 {
        field_height - self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickStatus {
    Active,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct Brick {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub status: BrickStatus,
}

impl Brick {
    pub fn is_active(&self) -> bool {
        self.status == BrickStatus::Active
    }

    /// Strict containment: a point on an edge is outside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.x && x < self.x + self.width && y > self.y && y < self.y + self.height
    }
}

/// Fixed brick layout, stored column-major so iteration visits each
/// column top to bottom before moving right.
#[derive(Debug, Clone)]
pub struct BrickGrid {
    pub columns: usize,
    pub rows: usize,
    bricks: Vec<Brick>,
}

impl BrickGrid {
    pub fn new(config: &Config) -> Self {
        let mut bricks = Vec::with_capacity(config.brick_columns * config.brick_rows);
        for column in 0..config.brick_columns {
            for row in 0..config.brick_rows {
                bricks.push(Brick {
                    x: column as f64 * (config.brick_width + config.brick_padding)
                        + config.brick_offset_left,
                    y: row as f64 * (config.brick_height + config.brick_padding)
                        + config.brick_offset_top,
                    width: config.brick_width,
                    height: config.brick_height,
                    status: BrickStatus::Active,
                });
            }
        }

        Self {
            columns: config.brick_columns,
            rows: config.brick_rows,
            bricks,
        }
    }

    fn index(&self, column: usize, row: usize) -> Option<usize> {
        (column < self.columns && row < self.rows).then(|| column * self.rows + row)
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&Brick> {
        let i = self.index(column, row)?;
        self.bricks.get(i)
    }

    pub fn get_mut(&mut self, column: usize, row: usize) -> Option<&mut Brick> {
        let i = self.index(column, row)?;
        self.bricks.get_mut(i)
    }

    /// All bricks with their `(column, row)`, column-major
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Brick)> {
        let rows = self.rows;
        self.bricks
            .iter()
            .enumerate()
            .map(move |(i, brick)| ((i / rows, i % rows), brick))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut Brick)> {
        let rows = self.rows;
        self.bricks
            .iter_mut()
            .enumerate()
            .map(move |(i, brick)| ((i / rows, i % rows), brick))
    }

    pub fn active(&self) -> impl Iterator<Item = &Brick> {
        self.bricks.iter().filter(|b| b.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }

    pub fn is_cleared(&self) -> bool {
        self.active_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_served_ball_matches_config() {
        let config = Config::default();
        let ball = Ball::served(&config);
        assert_eq!(ball.position, Position::new(365.0, 470.0));
        assert_eq!(ball.velocity, (2.0, -2.0));
        assert_eq!(ball.radius, 12.0);
        assert_eq!(ball.next_position(), Position::new(367.0, 468.0));
    }

    #[test]
    fn test_paddle_starts_centered() {
        let config = Config::default();
        let paddle = Paddle::centered(&config);
        assert_eq!(paddle.x, 317.5);
        assert_eq!(paddle.top(config.height), 485.0);
    }

    #[test]
    fn test_paddle_keyboard_movement_stays_inside_walls() {
        let mut paddle = Paddle::centered(&Config::default());

        paddle.x = 630.0;
        paddle.move_right(730.0);
        assert_eq!(paddle.x, 635.0, "should clamp at the right wall");
        paddle.move_right(730.0);
        assert_eq!(paddle.x, 635.0);

        paddle.x = 3.0;
        paddle.move_left();
        assert_eq!(paddle.x, 0.0, "should clamp at the left wall");
        paddle.move_left();
        assert_eq!(paddle.x, 0.0);
    }

    #[test]
    fn test_pointer_outside_travel_range_is_ignored() {
        let mut paddle = Paddle::centered(&Config::default());

        assert!(paddle.follow_pointer(100.0, 730.0));
        assert_eq!(paddle.x, 52.5);

        assert!(!paddle.follow_pointer(47.5, 730.0), "exact half-width is outside");
        assert!(!paddle.follow_pointer(10.0, 730.0));
        assert!(!paddle.follow_pointer(700.0, 730.0));
        assert_eq!(paddle.x, 52.5);
    }

    #[test]
    fn test_paddle_span_is_strict() {
        let mut paddle = Paddle::centered(&Config::default());
        paddle.x = 100.0;
        assert!(paddle.spans(150.0));
        assert!(!paddle.spans(100.0));
        assert!(!paddle.spans(195.0));
    }

    #[test]
    fn test_brick_layout() {
        let config = Config::default();
        let grid = BrickGrid::new(&config);
        assert_eq!(grid.len(), 40);
        assert_eq!(grid.active_count(), 40);

        let first = grid.get(0, 0).unwrap();
        assert_eq!((first.x, first.y), (30.0, 30.0));

        let last = grid.get(7, 4).unwrap();
        assert_eq!((last.x, last.y), (625.0, 150.0));

        assert!(grid.get(8, 0).is_none());
        assert!(grid.get(0, 5).is_none());
    }

    #[test]
    fn test_grid_iterates_column_major() {
        let grid = BrickGrid::new(&Config::default());
        let order: Vec<(usize, usize)> = grid.iter().take(6).map(|(at, _)| at).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 0)]);
    }

    #[test]
    fn test_brick_contains_is_strict() {
        let grid = BrickGrid::new(&Config::default());
        let brick = grid.get(0, 0).unwrap();
        assert!(brick.contains(50.0, 40.0));
        assert!(!brick.contains(30.0, 40.0));
        assert!(!brick.contains(50.0, 50.0));
        assert!(!brick.contains(106.0, 40.0));
    }

    #[test]
    fn test_destroyed_bricks_leave_active_set() {
        let mut grid = BrickGrid::new(&Config::default());
        grid.get_mut(3, 2).unwrap().status = BrickStatus::Destroyed;
        assert_eq!(grid.active_count(), 39);
        assert!(!grid.is_cleared());

        for (_, brick) in grid.iter_mut() {
            brick.status = BrickStatus::Destroyed;
        }
        assert!(grid.is_cleared());
    }
}
