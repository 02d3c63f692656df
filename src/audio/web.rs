//! Web Audio synthesis
//!
//! Procedurally generated sound effects - no audio files to fetch.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::{SoundEffect, TapLimiter, combo_pitch, combo_volume};
use crate::settings::Settings;

/// Plays `SoundEffect`s through a lazily resumed `AudioContext`
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    taps: TapLimiter,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: settings.effective_volume(),
            taps: TapLimiter::new(),
        }
    }

    /// Pick up changed preferences
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.volume = settings.effective_volume();
    }

    /// Resume the context; call from a user gesture
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn play(&mut self, effect: SoundEffect, now_ms: f64) {
        let vol = self.volume;
        if vol <= 0.0 {
            return;
        }
        if effect == SoundEffect::Tap && !self.taps.allow(now_ms) {
            return;
        }

        let Some(ctx) = &self.ctx else { return };
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Tap => play_tap(ctx, vol),
            SoundEffect::Combo(combo) => play_combo(ctx, vol, combo),
            SoundEffect::Block => play_block(ctx, vol),
            SoundEffect::Spike => play_spike(ctx, vol),
            SoundEffect::ComboBreak => play_combo_break(ctx, vol),
            SoundEffect::Beep => play_beep(ctx, vol, 660.0),
            SoundEffect::Go => play_beep(ctx, vol, 990.0),
            SoundEffect::LevelUp => play_level_up(ctx, vol),
            SoundEffect::RoundEnd => play_round_end(ctx, vol),
        }
    }
}

/// Oscillator routed through its own gain node
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    Some((osc, gain))
}

/// Short blip with a decaying envelope, optionally sweeping to `end_freq`
fn blip(
    ctx: &AudioContext,
    osc_type: OscillatorType,
    freq: f32,
    end_freq: Option<f32>,
    gain_level: f32,
    at: f64,
    length: f64,
) {
    let Some((osc, gain)) = create_osc(ctx, freq, osc_type) else {
        return;
    };
    gain.gain().set_value_at_time(gain_level, at).ok();
    gain.gain()
        .exponential_ramp_to_value_at_time(0.01, at + length)
        .ok();
    if let Some(end) = end_freq {
        osc.frequency().set_value_at_time(freq, at).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(end, at + length)
            .ok();
    }
    osc.start_with_when(at).ok();
    osc.stop_with_when(at + length + 0.03).ok();
}

/// Pop, slightly detuned each time
fn play_tap(ctx: &AudioContext, vol: f32) {
    let rate = 0.96 + js_sys::Math::random() as f32 * 0.10;
    let t = ctx.current_time();
    blip(
        ctx,
        OscillatorType::Sine,
        520.0 * rate,
        Some(260.0 * rate),
        vol * 0.45,
        t,
        0.07,
    );
}

/// Rising chime that climbs with the combo
fn play_combo(ctx: &AudioContext, vol: f32, combo: u32) {
    let rate = combo_pitch(combo);
    let level = vol * combo_volume(combo);
    let t = ctx.current_time();
    for (i, freq) in [880.0, 1320.0].iter().enumerate() {
        blip(
            ctx,
            OscillatorType::Triangle,
            freq * rate,
            None,
            level * 0.6,
            t + i as f64 * 0.04,
            0.12,
        );
    }
}

/// Dull metallic knock
fn play_block(ctx: &AudioContext, vol: f32) {
    let t = ctx.current_time();
    blip(ctx, OscillatorType::Square, 220.0, Some(180.0), vol * 0.2, t, 0.1);
    blip(ctx, OscillatorType::Sine, 90.0, None, vol * 0.35, t, 0.12);
}

/// Harsh downward zap
fn play_spike(ctx: &AudioContext, vol: f32) {
    let t = ctx.current_time();
    blip(ctx, OscillatorType::Sawtooth, 700.0, Some(70.0), vol * 0.4, t, 0.3);
    blip(ctx, OscillatorType::Sine, 50.0, None, vol * 0.4, t, 0.2);
}

fn play_combo_break(ctx: &AudioContext, vol: f32) {
    let t = ctx.current_time();
    for (i, freq) in [440.0, 330.0].iter().enumerate() {
        blip(
            ctx,
            OscillatorType::Triangle,
            *freq,
            None,
            vol * 0.25,
            t + i as f64 * 0.08,
            0.12,
        );
    }
}

fn play_beep(ctx: &AudioContext, vol: f32, freq: f32) {
    let t = ctx.current_time();
    blip(ctx, OscillatorType::Sine, freq, None, vol * 0.3, t, 0.15);
}

/// Bright arpeggio
fn play_level_up(ctx: &AudioContext, vol: f32) {
    let t = ctx.current_time();
    for (i, freq) in [523.0, 659.0, 784.0, 1047.0].iter().enumerate() {
        blip(
            ctx,
            OscillatorType::Triangle,
            *freq,
            None,
            vol * 0.3,
            t + i as f64 * 0.09,
            0.25,
        );
    }
}

/// Falling three-note sign-off
fn play_round_end(ctx: &AudioContext, vol: f32) {
    let t = ctx.current_time();
    for (i, freq) in [600.0, 450.0, 300.0].iter().enumerate() {
        blip(
            ctx,
            OscillatorType::Sine,
            *freq,
            None,
            vol * 0.3,
            t + i as f64 * 0.16,
            0.3,
        );
    }
}
