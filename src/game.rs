use crate::audio::Sound;
use crate::config::Config;
use crate::entity::{Ball, BrickGrid, BrickStatus, Key, Paddle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    /// Ball dropped with lives to spare; frozen until acknowledged
    LifeLost { lives_left: u32 },
    Won,
    Lost,
}

impl GameState {
    /// Overlay text for the states that pause play
    pub fn banner(&self) -> Option<(String, &'static str)> {
        match self {
            GameState::Playing => None,
            GameState::LifeLost { lives_left } => {
                let noun = if *lives_left == 1 { "life" } else { "lives" };
                Some((
                    format!("Don't worry, you have {lives_left} {noun} left"),
                    "Press SPACE or click to continue",
                ))
            }
            GameState::Won => Some(("YOU WIN".to_string(), "Press SPACE or click to play again")),
            GameState::Lost => Some(("GAME OVER".to_string(), "Press SPACE or click to play again")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    BrickDestroyed { column: usize, row: usize },
    PaddleHit,
    LifeLost { lives_left: u32 },
    Won,
    Lost,
}

impl GameEvent {
    pub fn sound(&self) -> Option<Sound> {
        match self {
            GameEvent::BrickDestroyed { .. } => Some(Sound::Brick),
            GameEvent::Won => Some(Sound::GameWin),
            GameEvent::Lost => Some(Sound::GameOver),
            GameEvent::PaddleHit | GameEvent::LifeLost { .. } => None,
        }
    }
}

pub struct Game {
    pub config: Config,
    pub ball: Ball,
    pub paddle: Paddle,
    pub bricks: BrickGrid,
    pub state: GameState,
    pub score: u32,
    pub lives: u32,
    left_pressed: bool,
    right_pressed: bool,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: Config) -> Self {
        Self {
            ball: Ball::served(&config),
            paddle: Paddle::centered(&config),
            bricks: BrickGrid::new(&config),
            state: GameState::Playing,
            score: 0,
            lives: config.lives,
            left_pressed: false,
            right_pressed: false,
            events: Vec::new(),
            config,
        }
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::Left => self.left_pressed = pressed,
            Key::Right => self.right_pressed = pressed,
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        match key {
            Key::Left => self.left_pressed,
            Key::Right => self.right_pressed,
        }
    }

    /// Pointer moved to `relative_x`, measured from the field's left edge
    pub fn pointer_moved(&mut self, relative_x: f64) {
        if self.state == GameState::Playing {
            self.paddle.follow_pointer(relative_x, self.config.width);
        }
    }

    /// Dismiss the current banner. A finished game starts over.
    pub fn acknowledge(&mut self) {
        match self.state {
            GameState::LifeLost { .. } => self.state = GameState::Playing,
            GameState::Won | GameState::Lost => self.reset(),
            GameState::Playing => {}
        }
    }

    pub fn reset(&mut self) {
        log::info!("Starting new game");
        let config = self.config.clone();
        *self = Game::new(config);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one fixed tick
    pub fn update(&mut self) {
        if self.state != GameState::Playing {
            return;
        }

        if self.collide_bricks() {
            return;
        }
        if self.collide_floor_and_ceiling() {
            return;
        }

        let next = self.ball.next_position();
        let radius = self.ball.radius;
        if next.x < radius || next.x > self.config.width - radius {
            self.ball.reflect_x();
        }

        if self.right_pressed {
            self.paddle.move_right(self.config.width);
        } else if self.left_pressed {
            self.paddle.move_left();
        }

        self.ball.advance();
    }

    /// Returns true when the last brick went and the game is won
    fn collide_bricks(&mut self) -> bool {
        let pos = self.ball.position;
        let mut hits = Vec::new();

        for (at, brick) in self.bricks.iter_mut() {
            if brick.is_active() && brick.contains(pos.x, pos.y) {
                brick.status = BrickStatus::Destroyed;
                hits.push(at);
            }
        }

        for (column, row) in hits {
            self.ball.reflect_y();
            self.score += 1;
            log::debug!("Brick ({column}, {row}) destroyed, score {}", self.score);
            self.events.push(GameEvent::BrickDestroyed { column, row });
        }

        if self.bricks.is_cleared() {
            log::info!("All bricks cleared, final score {}", self.score);
            self.state = GameState::Won;
            self.events.push(GameEvent::Won);
            return true;
        }
        false
    }

    /// Returns true when the last life is gone
    fn collide_floor_and_ceiling(&mut self) -> bool {
        let next = self.ball.next_position();
        let radius = self.ball.radius;

        if next.y < radius {
            self.ball.reflect_y();
        } else if next.y > self.config.height - 2.0 * radius {
            if self.paddle.spans(self.ball.position.x) {
                self.ball.reflect_y();
                self.events.push(GameEvent::PaddleHit);
            } else {
                self.lives = self.lives.saturating_sub(1);

                if self.lives == 0 {
                    log::info!("Out of lives, final score {}", self.score);
                    self.state = GameState::Lost;
                    self.events.push(GameEvent::Lost);
                    return true;
                }

                log::info!("Ball lost, {} lives left", self.lives);
                self.state = GameState::LifeLost { lives_left: self.lives };
                self.events.push(GameEvent::LifeLost { lives_left: self.lives });
                self.ball = Ball::served(&self.config);
                self.paddle = Paddle::centered(&self.config);
                self.left_pressed = false;
                self.right_pressed = false;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Position;
    use proptest::prelude::*;

    fn game() -> Game {
        Game::new(Config::default())
    }

    #[test]
    fn test_new_game_state() {
        let game = game();
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.score, 0);
        assert_eq!(game.lives, 3);
        assert_eq!(game.bricks.active_count(), 40);
        assert!(game.state.banner().is_none());
    }

    #[test]
    fn test_ball_moves_by_velocity() {
        let mut game = game();
        game.update();
        assert_eq!(game.ball.position, Position::new(367.0, 468.0));
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn test_ball_destroys_brick_and_reflects() {
        let mut game = game();
        game.ball = Ball::new(50.0, 45.0, 2.0, -2.0, 12.0);

        game.update();

        assert_eq!(game.score, 1);
        assert_eq!(game.bricks.get(0, 0).unwrap().status, BrickStatus::Destroyed);
        assert_eq!(game.ball.velocity, (2.0, 2.0));
        assert_eq!(game.ball.position, Position::new(52.0, 47.0));
        assert_eq!(
            game.take_events(),
            vec![GameEvent::BrickDestroyed { column: 0, row: 0 }]
        );
    }

    #[test]
    fn test_destroyed_brick_does_not_collide_again() {
        let mut game = game();
        game.bricks.get_mut(0, 0).unwrap().status = BrickStatus::Destroyed;
        game.score = 1;
        game.ball = Ball::new(50.0, 45.0, 2.0, -2.0, 12.0);

        game.update();

        assert_eq!(game.score, 1);
        assert_eq!(game.ball.velocity, (2.0, -2.0));
    }

    #[test]
    fn test_ceiling_reflects() {
        let mut game = game();
        game.ball = Ball::new(20.0, 13.0, 2.0, -2.0, 12.0);

        game.update();

        assert_eq!(game.ball.velocity, (2.0, 2.0));
        assert_eq!(game.ball.position, Position::new(22.0, 15.0));
    }

    #[test]
    fn test_side_walls_reflect() {
        let mut game = game();
        game.ball = Ball::new(717.0, 300.0, 2.0, 2.0, 12.0);
        game.update();
        assert_eq!(game.ball.velocity, (-2.0, 2.0));
        assert_eq!(game.ball.position.x, 715.0);

        game.ball = Ball::new(13.0, 300.0, -2.0, 2.0, 12.0);
        game.update();
        assert_eq!(game.ball.velocity, (2.0, 2.0));
        assert_eq!(game.ball.position.x, 15.0);
    }

    #[test]
    fn test_paddle_returns_ball() {
        let mut game = game();
        game.ball = Ball::new(365.0, 475.0, 2.0, 2.0, 12.0);

        game.update();

        assert_eq!(game.ball.velocity, (2.0, -2.0));
        assert_eq!(game.ball.position, Position::new(367.0, 473.0));
        assert_eq!(game.lives, 3);
        assert_eq!(game.take_events(), vec![GameEvent::PaddleHit]);
    }

    #[test]
    fn test_missing_paddle_costs_a_life_and_reserves() {
        let mut game = game();
        game.paddle.x = 500.0;
        game.set_key(Key::Right, true);
        game.ball = Ball::new(100.0, 475.0, 2.0, 2.0, 12.0);

        game.update();

        assert_eq!(game.lives, 2);
        assert_eq!(game.state, GameState::LifeLost { lives_left: 2 });
        assert_eq!(game.paddle.x, 317.5, "paddle re-centered and key released");
        assert!(!game.is_pressed(Key::Right));
        // the rest of the tick still moves the fresh ball one step
        assert_eq!(game.ball.position, Position::new(367.0, 468.0));
        assert_eq!(game.take_events(), vec![GameEvent::LifeLost { lives_left: 2 }]);

        let (line, _) = game.state.banner().unwrap();
        assert!(line.contains("2 lives"));
    }

    #[test]
    fn test_life_lost_freezes_until_acknowledged() {
        let mut game = game();
        game.ball = Ball::new(100.0, 475.0, 2.0, 2.0, 12.0);
        game.update();
        let frozen = game.ball.position;

        game.update();
        game.pointer_moved(200.0);
        assert_eq!(game.ball.position, frozen);
        assert_eq!(game.paddle.x, 317.5);

        game.acknowledge();
        assert_eq!(game.state, GameState::Playing);
        game.update();
        assert_ne!(game.ball.position, frozen);
    }

    #[test]
    fn test_last_life_loses_game() {
        let mut game = game();
        game.lives = 1;
        game.ball = Ball::new(100.0, 475.0, 2.0, 2.0, 12.0);

        game.update();

        assert_eq!(game.lives, 0);
        assert_eq!(game.state, GameState::Lost);
        assert_eq!(game.ball.position, Position::new(100.0, 475.0));
        let events = game.take_events();
        assert_eq!(events, vec![GameEvent::Lost]);
        assert_eq!(events[0].sound(), Some(Sound::GameOver));
        assert_eq!(game.state.banner().unwrap().0, "GAME OVER");
    }

    #[test]
    fn test_clearing_last_brick_wins() {
        let mut game = game();
        for (at, brick) in game.bricks.iter_mut() {
            if at != (7, 4) {
                brick.status = BrickStatus::Destroyed;
            }
        }
        game.score = 39;
        game.ball = Ball::new(650.0, 160.0, 2.0, -2.0, 12.0);

        game.update();

        assert_eq!(game.state, GameState::Won);
        assert_eq!(game.score, 40);
        assert_eq!(game.ball.position, Position::new(650.0, 160.0), "tick stops on win");
        assert_eq!(
            game.take_events(),
            vec![GameEvent::BrickDestroyed { column: 7, row: 4 }, GameEvent::Won]
        );
    }

    #[test]
    fn test_finished_game_restarts_on_acknowledge() {
        let mut game = game();
        game.lives = 1;
        game.score = 12;
        game.ball = Ball::new(100.0, 475.0, 2.0, 2.0, 12.0);
        game.update();
        assert_eq!(game.state, GameState::Lost);

        game.acknowledge();

        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.lives, 3);
        assert_eq!(game.score, 0);
        assert_eq!(game.bricks.active_count(), 40);
    }

    #[test]
    fn test_right_key_wins_over_left() {
        let mut game = game();
        game.set_key(Key::Left, true);
        game.set_key(Key::Right, true);
        game.update();
        assert_eq!(game.paddle.x, 324.5);

        game.set_key(Key::Right, false);
        game.update();
        assert_eq!(game.paddle.x, 317.5);
    }

    #[test]
    fn test_pointer_moves_paddle() {
        let mut game = game();
        game.pointer_moved(100.0);
        assert_eq!(game.paddle.x, 52.5);
        game.pointer_moved(5.0);
        assert_eq!(game.paddle.x, 52.5);
    }

    #[test]
    fn test_event_sounds() {
        assert_eq!(
            GameEvent::BrickDestroyed { column: 0, row: 0 }.sound(),
            Some(Sound::Brick)
        );
        assert_eq!(GameEvent::Won.sound(), Some(Sound::GameWin));
        assert_eq!(GameEvent::PaddleHit.sound(), None);
        assert_eq!(GameEvent::LifeLost { lives_left: 1 }.sound(), None);
    }

    #[derive(Debug, Clone)]
    enum Action {
        Tick,
        Key(Key, bool),
        Pointer(f64),
        Acknowledge,
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            8 => Just(Action::Tick),
            1 => (prop_oneof![Just(Key::Left), Just(Key::Right)], any::<bool>())
                .prop_map(|(key, pressed)| Action::Key(key, pressed)),
            1 => (-50.0f64..800.0).prop_map(Action::Pointer),
            1 => Just(Action::Acknowledge),
        ]
    }

    fn apply(game: &mut Game, action: &Action) {
        match action {
            Action::Tick => game.update(),
            Action::Key(key, pressed) => game.set_key(*key, *pressed),
            Action::Pointer(x) => game.pointer_moved(*x),
            Action::Acknowledge => game.acknowledge(),
        }
    }

    proptest! {
        /// Every point of score is a brick that is gone
        #[test]
        fn prop_score_accounts_for_every_brick(
            actions in prop::collection::vec(action_strategy(), 0..3000)
        ) {
            let mut game = game();
            for action in &actions {
                apply(&mut game, action);
                prop_assert_eq!(
                    game.score as usize + game.bricks.active_count(),
                    game.bricks.len()
                );
                prop_assert_eq!(game.state == GameState::Won, game.bricks.is_cleared());
            }
        }

        #[test]
        fn prop_ball_and_paddle_stay_inside_side_walls(
            actions in prop::collection::vec(action_strategy(), 0..3000)
        ) {
            let mut game = game();
            let width = game.config.width;
            for action in &actions {
                apply(&mut game, action);
                let x = game.ball.position.x;
                prop_assert!(x >= game.ball.radius && x <= width - game.ball.radius,
                    "ball x {} escaped the field", x);
                prop_assert!(game.paddle.x >= 0.0 && game.paddle.x <= width - game.paddle.width,
                    "paddle x {} escaped the field", game.paddle.x);
            }
        }

        /// Lives only go down, and only one at a time, until a restart
        #[test]
        fn prop_lives_never_increase_during_a_game(
            ticks in 0usize..5000,
            pointer in 60.0f64..670.0
        ) {
            let mut game = game();
            game.pointer_moved(pointer);
            let mut lives = game.lives;
            for _ in 0..ticks {
                game.update();
                prop_assert!(game.lives <= lives);
                prop_assert!(lives - game.lives <= 1);
                lives = game.lives;
                if let GameState::LifeLost { lives_left } = game.state {
                    prop_assert_eq!(lives_left, game.lives);
                    game.acknowledge();
                }
                if game.state == GameState::Lost {
                    prop_assert_eq!(game.lives, 0);
                    break;
                }
            }
        }

        #[test]
        fn prop_update_is_inert_outside_play(
            state in prop_oneof![
                Just(GameState::Won),
                Just(GameState::Lost),
                (1u32..3).prop_map(|lives_left| GameState::LifeLost { lives_left }),
            ],
            ticks in 1usize..50
        ) {
            let mut game = game();
            game.state = state;
            let ball = game.ball.position;
            let paddle = game.paddle.x;
            game.set_key(Key::Right, true);
            for _ in 0..ticks {
                game.update();
            }
            prop_assert_eq!(game.ball.position, ball);
            prop_assert_eq!(game.paddle.x, paddle);
            prop_assert!(game.take_events().is_empty());
        }
    }
}
