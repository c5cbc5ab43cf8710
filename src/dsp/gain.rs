//! Gain and pan laws shared by the track nodes and the parameter bridge.

use std::f64::consts::FRAC_PI_2;

/// dB value reported for a volume of exactly zero. Muting is tracked
/// separately by the nodes, so non-zero gains below the floor keep their
/// exact level.
pub const SILENCE_FLOOR_DB: f64 = -100.0;

/// Clamp a UI volume into `[0, 1]`. NaN maps to silence.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Clamp a UI pan into `[-1, 1]`. NaN maps to center.
pub fn clamp_pan(pan: f64) -> f64 {
    if pan.is_nan() {
        0.0
    } else {
        pan.clamp(-1.0, 1.0)
    }
}

/// Linear amplitude to decibels: `20 * log10(gain)`, with zero mapped to
/// [`SILENCE_FLOOR_DB`] instead of negative infinity.
pub fn gain_to_db(gain: f64) -> f64 {
    if gain <= 0.0 {
        SILENCE_FLOOR_DB
    } else {
        20.0 * gain.log10()
    }
}

/// Decibels to linear amplitude.
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Linear gain a volume is rendered at once it has been through the dB
/// parameter. Zero stays exactly zero.
pub fn rendered_gain(volume: f64) -> f64 {
    if volume <= 0.0 { 0.0 } else { db_to_gain(gain_to_db(volume)) }
}

/// Equal-power stereo panner.
///
/// Mono-compatible: for a centered signal both channels pass unchanged at
/// pan 0. Panning left folds part of the right channel into the left one
/// (and vice versa), so a hard-panned stereo source keeps all of its
/// content in one speaker.
pub fn pan_stereo(pan: f64, left: f32, right: f32) -> (f32, f32) {
    let pan = clamp_pan(pan);
    if pan <= 0.0 {
        let x = (pan + 1.0) * FRAC_PI_2;
        let (gain_l, gain_r) = (x.cos() as f32, x.sin() as f32);
        (left + right * gain_l, right * gain_r)
    } else {
        let x = pan * FRAC_PI_2;
        let (gain_l, gain_r) = (x.cos() as f32, x.sin() as f32);
        (left * gain_l, right + left * gain_r)
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}
