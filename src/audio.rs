//! Sound effects
//!
//! The game only ever plays three sounds. Front ends pick a player:
//! the terminal rings its bell, the browser decodes real audio files.

use crate::game::GameEvent;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    /// A brick was destroyed
    Brick,
    GameOver,
    GameWin,
}

impl Sound {
    pub const ALL: [Sound; 3] = [Sound::Brick, Sound::GameOver, Sound::GameWin];

    pub fn file_name(&self) -> &'static str {
        match self {
            Sound::Brick => "brick_sound.mp3",
            Sound::GameOver => "game_over_sound.mp3",
            Sound::GameWin => "game_win_sound.mp3",
        }
    }
}

pub trait SoundPlayer {
    fn play(&mut self, sound: Sound) -> io::Result<()>;
}

/// Play the sound, if any, for each event in order
pub fn play_events(player: &mut dyn SoundPlayer, events: &[GameEvent]) -> io::Result<()> {
    for sound in events.iter().filter_map(GameEvent::sound) {
        player.play(sound)?;
    }
    Ok(())
}

/// Plays nothing
#[derive(Debug, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&mut self, _sound: Sound) -> io::Result<()> {
        Ok(())
    }
}

/// Rings the terminal bell, once per sound
#[cfg(not(target_arch = "wasm32"))]
pub struct TerminalBell<W: io::Write> {
    out: W,
}

#[cfg(not(target_arch = "wasm32"))]
impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<W: io::Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<W: io::Write> SoundPlayer for TerminalBell<W> {
    fn play(&mut self, sound: Sound) -> io::Result<()> {
        log::trace!("bell for {:?}", sound);
        self.out.write_all(b"\x07")?;
        self.out.flush()
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{Sound, SoundPlayer};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioBuffer, AudioContext, AudioContextState, Response};

    /// Web Audio playback of the three sound files.
    ///
    /// Buffers load in the background; a sound requested before its buffer
    /// arrives is skipped.
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        buffers: Rc<RefCell<HashMap<Sound, AudioBuffer>>>,
    }

    impl WebAudio {
        pub fn new(sound_path: &str) -> Self {
            let ctx = AudioContext::new().ok();
            let buffers = Rc::new(RefCell::new(HashMap::new()));

            match &ctx {
                Some(ctx) => {
                    let base = sound_path.trim_end_matches('/');
                    for sound in Sound::ALL {
                        let url = format!("{}/{}", base, sound.file_name());
                        let ctx = ctx.clone();
                        let buffers = buffers.clone();
                        wasm_bindgen_futures::spawn_local(async move {
                            match load_buffer(&ctx, &url).await {
                                Ok(buffer) => {
                                    log::info!("Loaded {}", url);
                                    buffers.borrow_mut().insert(sound, buffer);
                                }
                                Err(e) => log::warn!("Failed to load {}: {:?}", url, e),
                            }
                        });
                    }
                }
                None => log::warn!("Failed to create AudioContext - audio disabled"),
            }

            Self { ctx, buffers }
        }

        fn start(&self, ctx: &AudioContext, buffer: &AudioBuffer) -> Result<(), JsValue> {
            // Browsers keep the context suspended until a user gesture
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let source = ctx.create_buffer_source()?;
            source.set_buffer(Some(buffer));
            source.connect_with_audio_node(&ctx.destination())?;
            source.start()?;
            Ok(())
        }
    }

    async fn load_buffer(ctx: &AudioContext, url: &str) -> Result<AudioBuffer, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        let data = JsFuture::from(response.array_buffer()?).await?;
        let data: js_sys::ArrayBuffer = data.dyn_into()?;
        let buffer = JsFuture::from(ctx.decode_audio_data(&data)?).await?;
        buffer.dyn_into()
    }

    impl SoundPlayer for WebAudio {
        fn play(&mut self, sound: Sound) -> io::Result<()> {
            let Some(ctx) = &self.ctx else {
                return Ok(());
            };
            let buffers = self.buffers.borrow();
            let Some(buffer) = buffers.get(&sound) else {
                log::debug!("{:?} not loaded yet", sound);
                return Ok(());
            };
            if let Err(e) = self.start(ctx, buffer) {
                log::warn!("Failed to play {:?}: {:?}", sound, e);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_files_are_distinct() {
        let names: std::collections::HashSet<_> = Sound::ALL.iter().map(|s| s.file_name()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(Sound::Brick.file_name(), "brick_sound.mp3");
    }

    #[test]
    fn test_silent_accepts_every_sound() {
        let mut player = Silent;
        for sound in Sound::ALL {
            assert!(player.play(sound).is_ok());
        }
    }

    #[test]
    fn test_bell_writes_one_bel_per_sound() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.play(Sound::Brick).unwrap();
        bell.play(Sound::GameWin).unwrap();
        assert_eq!(bell.into_inner(), b"\x07\x07".to_vec());
    }

    #[test]
    fn test_play_events_skips_silent_events() {
        let mut bell = TerminalBell::new(Vec::new());
        let events = [
            GameEvent::PaddleHit,
            GameEvent::BrickDestroyed { column: 1, row: 2 },
            GameEvent::LifeLost { lives_left: 2 },
            GameEvent::Lost,
        ];
        play_events(&mut bell, &events).unwrap();
        assert_eq!(bell.into_inner().len(), 2);
    }
}
