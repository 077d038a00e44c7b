//! Browser front end.
//!
//! Owns the single `Session` of the page in a thread-local cell, wires key
//! listeners and the `requestAnimationFrame` loop to it, and exposes the
//! `#[wasm_bindgen]` controls the page's buttons call.
use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::animator::FrameReport;
use crate::game::clock::PlaybackClock;
use crate::game::{FrameTicket, GameEvent, Session, Status};

mod audio;
mod render;

use audio::AudioDeck;
use render::{Effects, INDICATOR_HEIGHT};

const CANVAS_ID: &str = "lr-canvas";
const LANE_WIDTH: u32 = 100;

struct WebGame {
    session: Session,
    deck: AudioDeck,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    effects: Effects,
    last_report: Option<FrameReport>,
    frame_cb: Option<Closure<dyn FnMut(f64)>>,
    frame_id: Option<i32>,
}

thread_local! {
    static GAME: RefCell<Option<WebGame>> = const { RefCell::new(None) };
}

fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Run `f` against the page's game, creating it (canvas, overlays, key
/// listeners, audio context) on first use.
fn with_game<R>(f: impl FnOnce(&mut WebGame) -> Result<R, JsValue>) -> Result<R, JsValue> {
    let ready = GAME.with(|cell| cell.borrow().is_some());
    if !ready {
        let game = create_game()?;
        GAME.with(|cell| cell.replace(Some(game)));
        install_key_listeners()?;
    }
    GAME.with(|cell| {
        let mut guard = cell.borrow_mut();
        let game = guard
            .as_mut()
            .ok_or_else(|| JsValue::from_str("game not initialised"))?;
        f(game)
    })
}

fn create_game() -> Result<WebGame, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let session = Session::new(GameConfig::default())?;

    // Reuse a page-provided canvas, otherwise create one centered on screen.
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_attribute("style", "position:fixed; left:50%; top:45%; transform:translate(-50%,-50%); box-shadow:0 0 32px 0 rgba(0,0,0,0.18); border-radius:12px; border:2px solid #222; background:#181818; z-index:20;").ok();
        body.append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    // Score / combo overlays (top-left)
    let overlays = [("lr-score", "Score: 0", "12px"), ("lr-combo", "Combo: 0", "170px")];
    for (id, text, left) in overlays {
        if doc.get_element_by_id(id).is_none() {
            let div = doc.create_element("div")?;
            div.set_id(id);
            div.set_text_content(Some(text));
            div.set_attribute("style", &format!("position:fixed; top:10px; left:{left}; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;")).ok();
            body.append_child(&div)?;
        }
    }

    let mut game = WebGame {
        session,
        deck: AudioDeck::new()?,
        canvas,
        ctx,
        effects: Effects::default(),
        last_report: None,
        frame_cb: None,
        frame_id: None,
    };
    game.fit_canvas();
    game.redraw(performance_now());
    log::info!("lane rush ready");
    Ok(game)
}

fn install_key_listeners() -> Result<(), JsValue> {
    let doc = window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.repeat() {
                return;
            }
            GAME.with(|cell| {
                if let Some(game) = cell.borrow_mut().as_mut() {
                    let now = game.deck.now();
                    let events = game.session.key_down(&evt.key(), now);
                    game.on_events(&events, performance_now());
                }
            });
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            GAME.with(|cell| {
                if let Some(game) = cell.borrow_mut().as_mut() {
                    if let Some(ev) = game.session.key_up(&evt.key()) {
                        game.on_events(&[ev], performance_now());
                    }
                }
            });
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

impl WebGame {
    fn fit_canvas(&self) {
        let lanes = self.session.config().lane_count() as u32;
        self.canvas.set_width(lanes * LANE_WIDTH);
        self.canvas
            .set_height((self.session.config().field_length + INDICATOR_HEIGHT) as u32);
    }

    fn redraw(&self, now_ms: f64) {
        render::draw(
            &self.canvas,
            &self.ctx,
            &self.session,
            self.last_report.as_ref(),
            &self.effects,
            now_ms,
        );
    }

    fn on_events(&mut self, events: &[GameEvent], now_ms: f64) {
        self.effects.apply(events, now_ms);
        if events.contains(&GameEvent::RoundComplete) {
            self.deck.stop();
            self.last_report = None;
        }
        self.update_overlays();
        // Key highlights must show even when no frame loop is running.
        if self.session.status() != Status::Running {
            self.redraw(now_ms);
        }
    }

    fn update_overlays(&self) {
        let Some(doc) = window().and_then(|w| w.document()) else {
            return;
        };
        let board = self.session.scoreboard();
        if let Some(el) = doc.get_element_by_id("lr-score") {
            el.set_text_content(Some(&format!("Score: {}", board.score)));
        }
        if let Some(el) = doc.get_element_by_id("lr-combo") {
            el.set_text_content(Some(&format!("Combo: {}", board.combo)));
        }
    }

    /// One animation frame: advance the session, then draw.
    fn frame(&mut self, ticket: FrameTicket, now_ms: f64) {
        let now = self.deck.now();
        if let Some(frame) = self.session.tick(ticket, now) {
            if frame.report.hit_line_flash {
                self.effects.flash_hit_line(now_ms);
            }
            self.last_report = Some(frame.report);
            self.on_events(&frame.events, now_ms);
        }
        self.redraw(now_ms);
    }

    fn request_frame(&mut self) -> Result<(), JsValue> {
        let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
        if let Some(cb) = self.frame_cb.as_ref() {
            self.frame_id = Some(win.request_animation_frame(cb.as_ref().unchecked_ref())?);
        }
        Ok(())
    }

    fn cancel_frame(&mut self) {
        if let (Some(id), Some(win)) = (self.frame_id.take(), window()) {
            win.cancel_animation_frame(id).ok();
        }
    }

    /// Replace the frame callback with one bound to `ticket` and schedule it.
    fn start_frame_loop(&mut self, ticket: FrameTicket) -> Result<(), JsValue> {
        self.cancel_frame();
        self.frame_cb = Some(Closure::wrap(Box::new(move |ts: f64| {
            GAME.with(|cell| {
                if let Some(game) = cell.borrow_mut().as_mut() {
                    game.frame_id = None;
                    if !game.session.is_current(ticket) {
                        return;
                    }
                    game.frame(ticket, ts);
                    if game.session.is_current(ticket) {
                        if let Err(e) = game.request_frame() {
                            log::error!("could not schedule frame: {e:?}");
                        }
                    }
                }
            });
        }) as Box<dyn FnMut(f64)>));
        self.request_frame()
    }

    fn start(&mut self) -> Result<(), JsValue> {
        let ticket = match self.session.start(self.deck.now()) {
            Ok(ticket) => ticket,
            Err(GameError::NoTrackLoaded) => {
                alert(&GameError::NoTrackLoaded.to_string());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = self.deck.play() {
            self.session.stop();
            return Err(e);
        }
        self.effects.clear();
        self.last_report = None;
        self.fit_canvas();
        self.update_overlays();
        self.start_frame_loop(ticket)
    }

    fn stop(&mut self) {
        self.cancel_frame();
        self.deck.stop();
        if self.session.stop() {
            self.effects.clear();
            self.last_report = None;
            self.redraw(performance_now());
        }
    }
}

fn alert(message: &str) {
    if let Some(win) = window() {
        win.alert_with_message(message).ok();
    }
}

// -----------------------------------------------------------------------------
// Exports
// -----------------------------------------------------------------------------

/// Hand the raw bytes of a song to the decoder. Start becomes possible once
/// decoding succeeds; a failure is alerted and leaves the session idle.
#[wasm_bindgen]
pub fn load_track_bytes(bytes: &[u8]) -> Result<(), JsValue> {
    with_game(|game| {
        game.deck.decode(
            bytes,
            |buffer| {
                GAME.with(|cell| {
                    if let Some(game) = cell.borrow_mut().as_mut() {
                        let duration = buffer.duration();
                        match game.session.load_track(duration) {
                            Ok(()) => game.deck.set_buffer(buffer),
                            Err(e) => alert(&e.to_string()),
                        }
                    }
                });
            },
            |reason| {
                GAME.with(|cell| {
                    if let Some(game) = cell.borrow_mut().as_mut() {
                        let err = game.session.track_failed(reason);
                        if matches!(err, GameError::Decode(_)) {
                            game.deck.clear_buffer();
                        }
                        alert(&err.to_string());
                    }
                });
            },
        )
    })
}

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    with_game(WebGame::start)
}

/// Toggle pause. Returns true when the game is now paused.
#[wasm_bindgen]
pub fn pause_game() -> Result<bool, JsValue> {
    with_game(|game| {
        let status = game.session.toggle_pause(game.deck.now())?;
        match status {
            Status::Paused => game.deck.pause()?,
            _ => game.deck.resume()?,
        }
        Ok(status == Status::Paused)
    })
}

#[wasm_bindgen]
pub fn stop_game() -> Result<(), JsValue> {
    with_game(|game| {
        game.stop();
        Ok(())
    })
}

/// Rebind lanes in order, e.g. `["A", "S", "D", "F"]`.
#[wasm_bindgen]
pub fn set_keybinds(keys: Vec<String>) -> Result<(), JsValue> {
    with_game(|game| {
        let now = game.deck.now();
        game.session.set_keybinds(&keys, now)?;
        game.fit_canvas();
        game.last_report = None;
        game.redraw(performance_now());
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_lane_colors(colors: Vec<String>) -> Result<(), JsValue> {
    with_game(|game| {
        game.session.set_lane_colors(&colors);
        game.redraw(performance_now());
        Ok(())
    })
}

/// Replace the game configuration from a JSON object (camelCase fields).
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn configure(json: &str) -> Result<(), JsValue> {
    with_game(|game| {
        let config = GameConfig::from_json(json)?;
        game.session.configure(config)?;
        game.fit_canvas();
        game.redraw(performance_now());
        Ok(())
    })
}

#[wasm_bindgen]
pub fn current_score() -> f64 {
    GAME.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|g| g.session.scoreboard().score as f64)
            .unwrap_or(0.0)
    })
}

#[wasm_bindgen]
pub fn current_combo() -> u32 {
    GAME.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|g| g.session.scoreboard().combo)
            .unwrap_or(0)
    })
}
