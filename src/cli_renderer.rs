use crate::entity::Key;
use crate::game::{Game, GameState};
use crate::renderer::{Input, Renderer};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseEventKind, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Lines reserved under the play field for score and messages
const INFO_LINES: u16 = 5;
const MIN_COLUMNS: u16 = 20;
const MIN_ROWS: u16 = 10;

/// Without key release events, a held arrow counts as released once the
/// terminal stops repeating it for this long
const KEY_HOLD_TIMEOUT: Duration = Duration::from_millis(150);
/// Grace period before the first auto-repeat, which terminals send late
const FIRST_REPEAT_TIMEOUT: Duration = Duration::from_millis(600);

/// Arrow key held down on a terminal that never reports releases
#[derive(Debug, Clone, Copy)]
struct HeldKey {
    key: Key,
    since: Instant,
    repeating: bool,
}

impl HeldKey {
    fn pressed(key: Key, now: Instant) -> Self {
        Self { key, since: now, repeating: false }
    }

    fn timeout(&self) -> Duration {
        if self.repeating {
            KEY_HOLD_TIMEOUT
        } else {
            FIRST_REPEAT_TIMEOUT
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.since) >= self.timeout()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Empty,
    /// Alternates between neighbors so adjacent bricks stay distinguishable
    Brick { alternate: bool },
    Paddle,
    Ball,
}

/// Largest cell grid that fits the terminal and keeps the field's aspect.
/// Cells are two characters wide, so they come out roughly square.
pub fn fit_play_area(term_width: u16, term_height: u16, field_width: f64, field_height: f64) -> (u16, u16) {
    let max_columns = (term_width / 2).max(MIN_COLUMNS);
    let max_rows = term_height.saturating_sub(INFO_LINES).max(MIN_ROWS);
    let aspect = field_width / field_height;

    let columns = (max_rows as f64 * aspect).round() as u16;
    if columns <= max_columns {
        (columns.max(MIN_COLUMNS), max_rows)
    } else {
        let rows = (max_columns as f64 / aspect).round() as u16;
        (max_columns, rows.max(MIN_ROWS))
    }
}

/// Cells along one axis whose centers fall inside `[start, end)`, or the
/// single cell under the midpoint when the span is thinner than a cell
fn covered_span(start: f64, end: f64, size: f64, count: usize) -> (usize, usize) {
    let limit = count.saturating_sub(1);
    let first = ((start / size) - 0.5).ceil().max(0.0) as usize;
    let last = ((end / size) - 0.5).ceil() as isize - 1;

    if last >= first as isize {
        (first.min(limit), (last as usize).min(limit))
    } else {
        let mid = (((start + end) / 2.0 / size).max(0.0) as usize).min(limit);
        (mid, mid)
    }
}

fn covered_cells(
    (x0, y0, x1, y1): (f64, f64, f64, f64),
    (cell_w, cell_h): (f64, f64),
    (columns, rows): (usize, usize),
) -> impl Iterator<Item = (usize, usize)> {
    let (c0, c1) = covered_span(x0, x1, cell_w, columns);
    let (r0, r1) = covered_span(y0, y1, cell_h, rows);
    (r0..=r1).flat_map(move |r| (c0..=c1).map(move |c| (c, r)))
}

/// Project the play field onto a `columns x rows` grid, indexed `[row][column]`
pub fn rasterize(game: &Game, columns: u16, rows: u16) -> Vec<Vec<Glyph>> {
    let (columns, rows) = (columns as usize, rows as usize);
    let mut frame = vec![vec![Glyph::Empty; columns]; rows];
    if columns == 0 || rows == 0 {
        return frame;
    }

    let cell = (game.config.width / columns as f64, game.config.height / rows as f64);
    let grid = (columns, rows);

    for ((column, row), brick) in game.bricks.iter() {
        if !brick.is_active() {
            continue;
        }
        let glyph = Glyph::Brick {
            alternate: (column + row) % 2 == 1,
        };
        let rect = (brick.x, brick.y, brick.x + brick.width, brick.y + brick.height);
        for (c, r) in covered_cells(rect, cell, grid) {
            frame[r][c] = glyph;
        }
    }

    let paddle = &game.paddle;
    let top = paddle.top(game.config.height);
    let rect = (paddle.x, top, paddle.x + paddle.width, top + paddle.height);
    for (c, r) in covered_cells(rect, cell, grid) {
        frame[r][c] = Glyph::Paddle;
    }

    let ball = game.ball.position;
    let c = ((ball.x / cell.0).max(0.0) as usize).min(columns - 1);
    let r = ((ball.y / cell.1).max(0.0) as usize).min(rows - 1);
    frame[r][c] = Glyph::Ball;

    frame
}

pub struct CliRenderer {
    last_render: Instant,
    target_frame_time: Duration,
    field_width: f64,
    field_height: f64,
    columns: u16,
    rows: u16,
    needs_clear: bool,
    active: bool,

    // Input state
    enhanced_keys: bool,
    held: Option<HeldKey>,
    pending: VecDeque<Input>,
}

impl CliRenderer {
    pub fn new(field_width: f64, field_height: f64) -> Self {
        Self {
            last_render: Instant::now(),
            // Target ~60 FPS
            target_frame_time: Duration::from_millis(16),
            field_width,
            field_height,
            columns: 40,
            rows: 20,
            needs_clear: true,
            active: false,
            enhanced_keys: false,
            held: None,
            pending: VecDeque::new(),
        }
    }

    fn resize(&mut self, term_width: u16, term_height: u16) {
        let (columns, rows) = fit_play_area(term_width, term_height, self.field_width, self.field_height);
        log::debug!("Play area {}x{} cells for terminal {}x{}", columns, rows, term_width, term_height);
        self.columns = columns;
        self.rows = rows;
        self.needs_clear = true;
    }

    /// Map a terminal column back to a play-field x coordinate
    fn column_to_x(&self, column: u16) -> f64 {
        let chars = self.columns as f64 * 2.0;
        (column as f64 + 0.5) * self.field_width / chars
    }

    fn draw_glyph(&self, glyph: Glyph, stdout: &mut io::Stdout) -> io::Result<()> {
        match glyph {
            Glyph::Empty => {
                queue!(stdout, SetBackgroundColor(Color::Black), Print("  "))?;
            }
            Glyph::Brick { alternate: false } => {
                queue!(stdout, SetBackgroundColor(Color::Blue), Print("  "))?;
            }
            Glyph::Brick { alternate: true } => {
                queue!(stdout, SetBackgroundColor(Color::DarkCyan), Print("  "))?;
            }
            Glyph::Paddle => {
                queue!(stdout, SetBackgroundColor(Color::Red), Print("  "))?;
            }
            Glyph::Ball => {
                queue!(
                    stdout,
                    SetBackgroundColor(Color::Black),
                    SetForegroundColor(Color::Yellow),
                    Print("()"),
                    ResetColor
                )?;
            }
        }
        Ok(())
    }

    fn draw_info(&self, game: &Game, stdout: &mut io::Stdout) -> io::Result<()> {
        let line = self.rows + 1;

        queue!(
            stdout,
            cursor::MoveTo(0, line),
            ResetColor,
            terminal::Clear(ClearType::UntilNewLine),
            SetForegroundColor(Color::Cyan),
            Print(format!("Score: {}", game.score)),
            ResetColor,
            Print("   "),
            SetForegroundColor(Color::Red),
            Print(format!("Lives: {}", game.lives)),
            ResetColor
        )?;

        queue!(
            stdout,
            cursor::MoveTo(0, line + 1),
            Print("Controls: Arrow Keys / Mouse to move | SPACE to continue | R to restart | Q to quit")
        )?;

        let color = match game.state {
            GameState::Won => Color::Green,
            GameState::Lost => Color::Red,
            _ => Color::Yellow,
        };
        queue!(stdout, cursor::MoveTo(0, line + 2), terminal::Clear(ClearType::UntilNewLine))?;
        if let Some((headline, hint)) = game.state.banner() {
            queue!(
                stdout,
                SetForegroundColor(color),
                Print(format!("{headline}! {hint}")),
                ResetColor
            )?;
        }

        Ok(())
    }

    fn translate_key(&mut self, event: KeyEvent) -> Option<Input> {
        let KeyEvent { code, kind, modifiers, .. } = event;

        let arrow = match code {
            KeyCode::Left => Some(Key::Left),
            KeyCode::Right => Some(Key::Right),
            _ => None,
        };
        if let Some(key) = arrow {
            if kind == KeyEventKind::Release {
                self.held = None;
                return Some(Input::Key { key, pressed: false });
            }
            if !self.enhanced_keys {
                let now = Instant::now();
                self.held = match self.held {
                    Some(held) if held.key == key => Some(HeldKey {
                        since: now,
                        repeating: true,
                        ..held
                    }),
                    Some(other) => {
                        self.pending.push_back(Input::Key { key: other.key, pressed: false });
                        Some(HeldKey::pressed(key, now))
                    }
                    None => Some(HeldKey::pressed(key, now)),
                };
            }
            return Some(Input::Key { key, pressed: true });
        }

        if kind != KeyEventKind::Press {
            return None;
        }
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Input::Quit),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Input::Quit),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Input::Restart),
            KeyCode::Char(' ') | KeyCode::Enter => Some(Input::Acknowledge),
            _ => None,
        }
    }

    fn expire_held_key(&mut self) {
        if self.enhanced_keys {
            return;
        }
        if let Some(held) = self.held.filter(|held| held.expired(Instant::now())) {
            self.held = None;
            self.pending.push_back(Input::Key { key: held.key, pressed: false });
        }
    }
}

impl Renderer for CliRenderer {
    fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.active = true;

        let (width, height) = terminal::size()?;
        self.resize(width, height);

        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide,
            EnableMouseCapture
        )?;

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::info!(
            "Terminal renderer ready (key release events: {})",
            self.enhanced_keys
        );
        Ok(())
    }

    fn render(&mut self, game: &Game) -> io::Result<()> {
        // Frame rate limiting: skip rendering if not enough time has passed
        if self.last_render.elapsed() < self.target_frame_time {
            return Ok(());
        }

        self.last_render = Instant::now();

        let mut stdout = io::stdout();

        if self.needs_clear {
            queue!(stdout, ResetColor, terminal::Clear(ClearType::All))?;
            self.needs_clear = false;
        }
        queue!(stdout, cursor::MoveTo(0, 0))?;

        let frame = rasterize(game, self.columns, self.rows);
        for row in frame {
            for glyph in row {
                self.draw_glyph(glyph, &mut stdout)?;
            }
            queue!(stdout, ResetColor, Print("\r\n"))?;
        }

        self.draw_info(game, &mut stdout)?;

        stdout.flush()?;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let mut stdout = io::stdout();
        if self.enhanced_keys {
            execute!(stdout, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            stdout,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen,
            ResetColor
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        self.expire_held_key();
        if let Some(input) = self.pending.pop_front() {
            return Ok(Some(input));
        }

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key_event) => {
                    if let Some(input) = self.translate_key(key_event) {
                        return Ok(Some(input));
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        return Ok(Some(Input::PointerX(self.column_to_x(mouse.column))));
                    }
                    MouseEventKind::Down(_) => return Ok(Some(Input::Acknowledge)),
                    _ => {}
                },
                Event::Resize(width, height) => self.resize(width, height),
                _ => {}
            }
        }
        Ok(None)
    }
}

impl Drop for CliRenderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
