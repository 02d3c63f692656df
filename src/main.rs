//! Tap Rush entry point
//!
//! In the browser this wires the canvas, pointer input, the animation-frame
//! loop and the HUD to a `Session`. Natively it plays one seeded round with
//! an autoplay tapper and prints the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, PointerEvent};

    use tap_rush::audio::{AudioManager, SoundEffect};
    use tap_rush::platform::{KeyValueStore, LocalStorage, MemoryStorage, now_ms, run_seed};
    use tap_rush::progression::xp_needed_for_level;
    use tap_rush::renderer::CanvasRenderer;
    use tap_rush::sim::{Difficulty, EntityKind, GameEvent, RoundPhase, RoundSummary, Session};
    use tap_rush::{Settings, StoredProgress};

    type Store = Box<dyn KeyValueStore>;

    /// Everything the page holds on to
    struct Game {
        session: Session<StoredProgress<Store>>,
        renderer: CanvasRenderer,
        audio: AudioManager,
        settings: Settings,
        /// A frame request is outstanding
        looping: bool,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn save_settings(&mut self) {
            let store = self.session.store_mut().store_mut();
            self.settings.save(store.as_mut());
        }

        /// Match the canvas to its laid-out size
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let canvas = self.renderer.canvas();
            let w = canvas.client_width().max(1) as f64;
            let h = canvas.client_height().max(1) as f64;
            self.renderer.resize(w, h, window.device_pixel_ratio());
            self.session.set_bounds(w as f32, h as f32);
        }

        /// Feed queued events to audio and the overlays
        fn handle_events(&mut self, now: f64) {
            for event in self.session.drain_events() {
                for effect in SoundEffect::for_event(&event) {
                    self.audio.play(effect, now);
                }
                match event {
                    GameEvent::LevelUp { level } => log::info!("Level up: {}", level),
                    GameEvent::RoundEnd(summary) => show_results(&summary),
                    _ => {}
                }
            }
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (59_000.0 / elapsed).round() as u32;
                }
            }
        }

        fn render(&self) {
            self.renderer.draw(&self.session.snapshot());
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };
            let round = self.session.round();
            let progress = self.session.progress();

            set_text(&document, "hud-score", &round.score.to_string());
            set_text(&document, "hud-time", &round.time_left.to_string());
            set_text(&document, "hud-level", &progress.level.to_string());
            set_text(
                &document,
                "hud-xp",
                &format!(
                    "{}/{} ({:.0}%)",
                    progress.xp,
                    xp_needed_for_level(progress.level),
                    progress.level_progress() * 100.0
                ),
            );
            set_text(&document, "hud-gems", &progress.total_gems.to_string());

            let combo_label = if round.combo > 1 {
                format!("{} x{}", round.combo, round.multiplier())
            } else {
                String::new()
            };
            set_text(&document, "hud-combo", &combo_label);

            set_visible(&document, "hud-fps", self.settings.show_fps);
            if self.settings.show_fps {
                set_text(&document, "hud-fps", &format!("{} fps", self.fps));
            }

            let in_menu = matches!(self.session.phase(), RoundPhase::Idle | RoundPhase::Ended);
            set_visible(&document, "menu", in_menu);
            set_text(
                &document,
                "sound-toggle",
                if self.settings.sound_enabled {
                    "Sound: on"
                } else {
                    "Sound: off"
                },
            );
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = if visible {
                el.class_list().remove_1("hidden")
            } else {
                el.class_list().add_1("hidden")
            };
        }
    }

    fn show_results(summary: &RoundSummary) {
        let Some(document) = document() else { return };
        set_text(&document, "result-score", &summary.score.to_string());
        set_text(&document, "result-gems", &format!("+{}", summary.gems_earned));
        set_text(&document, "result-xp", &format!("+{}", summary.xp_earned));
        set_text(&document, "result-combo", &summary.best_combo.to_string());
        set_visible(&document, "results", true);
    }

    fn open_storage() -> Store {
        match LocalStorage::open() {
            Some(storage) => Box::new(storage),
            None => {
                log::warn!("LocalStorage unavailable - progress will not persist");
                Box::new(MemoryStorage::new())
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }

        log::info!("Tap Rush starting...");

        let document = document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let renderer = CanvasRenderer::new(canvas.clone()).ok_or("no 2d context")?;

        let storage = open_storage();
        let settings = Settings::load(storage.as_ref());
        let audio = AudioManager::new(&settings);

        let seed = run_seed();
        let session = Session::new(StoredProgress::new(storage), seed);
        log::info!("Session initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            renderer,
            audio,
            settings,
            looping: false,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        {
            let mut g = game.borrow_mut();
            g.resize();
            g.render();
            g.update_hud();
        }

        setup_pointer(&canvas, game.clone());
        setup_start_buttons(&document, game.clone());
        setup_sound_toggle(&document, game.clone());
        setup_resize(game);

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }
        log::info!("Tap Rush ready");
        Ok(())
    }

    fn setup_pointer(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            event.prevent_default();
            let rect = canvas_clone.get_bounding_client_rect();
            let x = (event.client_x() as f64 - rect.left()) as f32;
            let y = (event.client_y() as f64 - rect.top()) as f32;
            let now = now_ms();

            let mut g = game.borrow_mut();
            g.audio.resume();
            g.session.pointer_down(x, y, now);
            g.handle_events(now);
            g.update_hud();
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_start_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for difficulty in Difficulty::ALL {
            let id = format!("start-{}", difficulty.as_str());
            let Some(btn) = document.get_element_by_id(&id) else {
                continue;
            };
            let policy = difficulty.policy();
            let odds = format!(
                "shields {:.0}%, spikes {:.0}%",
                policy.chance(EntityKind::Shield) * 100.0,
                policy.chance(EntityKind::Spike) * 100.0
            );
            let _ = btn.set_attribute("title", &odds);
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                start_round(&game, difficulty);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn start_round(game: &Rc<RefCell<Game>>, difficulty: Difficulty) {
        let now = now_ms();
        {
            let mut g = game.borrow_mut();
            g.audio.resume();
            if !g.session.start(difficulty, now) {
                return;
            }
            g.settings.difficulty = difficulty;
            g.save_settings();
            g.handle_events(now);
            g.update_hud();
        }
        if let Some(document) = document() {
            set_visible(&document, "results", false);
        }
        ensure_loop(game.clone());
    }

    fn setup_sound_toggle(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(btn) = document.get_element_by_id("sound-toggle") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let mut g = game.borrow_mut();
            g.settings.sound_enabled = !g.settings.sound_enabled;
            let settings = g.settings.clone();
            g.audio.apply_settings(&settings);
            g.save_settings();
            g.update_hud();
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            g.resize();
            g.render();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn ensure_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            if g.looping {
                return;
            }
            g.looping = true;
        }
        request_animation_frame(game);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = {
            let mut g = game.borrow_mut();
            g.session.on_frame(time);
            g.handle_events(time);
            g.track_fps(time);
            g.render();
            g.update_hud();

            let keep_going = g.session.needs_frames();
            g.looping = keep_going;
            keep_going
        };
        if keep_going {
            request_animation_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let difficulty = args
        .next()
        .and_then(|s| tap_rush::Difficulty::from_str(&s))
        .unwrap_or_default();
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(tap_rush::platform::run_seed);

    log::info!("Tap Rush (native) starting, seed {}", seed);
    match headless::play_round(difficulty, seed) {
        Some(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Could not encode summary: {}", e),
        },
        None => log::error!("Round did not finish"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

/// Headless autoplay round at a fixed 60 Hz timestamp stream
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use tap_rush::platform::MemoryStorage;
    use tap_rush::sim::{EntityKind, GameEvent, RoundPhase, RoundSummary};
    use tap_rush::{Difficulty, Session, StoredProgress};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Frames between autoplay taps (~4 taps per second)
    const TAP_EVERY: u32 = 15;
    /// Hard stop well past countdown + round
    const MAX_FRAMES: u32 = 60 * 120;

    pub fn play_round(difficulty: Difficulty, seed: u64) -> Option<RoundSummary> {
        let mut session = Session::new(StoredProgress::new(MemoryStorage::new()), seed);
        session.set_bounds(480.0, 800.0);

        let mut now = 0.0;
        session.start(difficulty, now);

        for frame in 0..MAX_FRAMES {
            now += FRAME_MS;
            session.on_frame(now);

            if session.phase() == RoundPhase::Active && frame % TAP_EVERY == 0 {
                if let Some(target) = pick_target(&session) {
                    session.pointer_down(target.x, target.y, now);
                }
            }

            for event in session.drain_events() {
                match event {
                    GameEvent::RoundEnd(summary) => return Some(summary),
                    other => log::debug!("{:?}", other),
                }
            }
        }
        None
    }

    /// First fully visible normal target
    fn pick_target(session: &Session<StoredProgress<MemoryStorage>>) -> Option<glam::Vec2> {
        let bounds = session.bounds();
        session
            .entities()
            .iter()
            .filter(|e| e.is_live() && e.kind == EntityKind::Normal)
            .map(|e| e.pos)
            .find(|p| p.x >= 0.0 && p.y >= 0.0 && p.x <= bounds.width && p.y <= bounds.height)
    }
}
