//! Web Audio adapter: decoding, playback and the playback clock.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext};

use crate::game::clock::PlaybackClock;

pub struct AudioDeck {
    ctx: AudioContext,
    buffer: Option<AudioBuffer>,
    source: Option<AudioBufferSourceNode>,
}

impl AudioDeck {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self { ctx: AudioContext::new()?, buffer: None, source: None })
    }

    /// Decode `bytes` asynchronously. Exactly one of the callbacks fires.
    pub fn decode(
        &self,
        bytes: &[u8],
        on_ok: impl FnOnce(AudioBuffer) + 'static,
        on_err: impl FnOnce(String) + 'static,
    ) -> Result<(), JsValue> {
        let data = js_sys::Uint8Array::from(bytes).buffer();
        let ok = Closure::once(on_ok);
        let err = Closure::once(move |e: JsValue| {
            on_err(e.as_string().unwrap_or_else(|| format!("{e:?}")))
        });
        self.ctx.decode_audio_data_with_success_callback_and_error_callback(
            &data,
            ok.as_ref().unchecked_ref(),
            err.as_ref().unchecked_ref(),
        )?;
        ok.forget();
        err.forget();
        Ok(())
    }

    pub fn set_buffer(&mut self, buffer: AudioBuffer) {
        self.buffer = Some(buffer);
    }

    pub fn clear_buffer(&mut self) {
        self.buffer = None;
    }

    /// Play the loaded buffer from the beginning.
    pub fn play(&mut self) -> Result<(), JsValue> {
        self.stop();
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| JsValue::from_str("no decoded track"))?;
        let source = self.ctx.create_buffer_source()?;
        source.set_buffer(Some(buffer));
        source.connect_with_audio_node(&self.ctx.destination())?;
        let _ = self.ctx.resume()?;
        source.start()?;
        self.source = Some(source);
        Ok(())
    }

    pub fn pause(&self) -> Result<(), JsValue> {
        let _ = self.ctx.suspend()?;
        Ok(())
    }

    pub fn resume(&self) -> Result<(), JsValue> {
        let _ = self.ctx.resume()?;
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(source) = self.source.take() {
            source.stop().ok();
            source.disconnect().ok();
        }
    }
}

impl PlaybackClock for AudioDeck {
    fn now(&self) -> f64 {
        self.ctx.current_time()
    }
}
