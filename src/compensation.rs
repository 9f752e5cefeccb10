// SPDX-License-Identifier: Apache-2.0
//! Turning raw measurements into temperatures.
//!
//! The compensation process follows the worked example in the datasheet: resolve the supply
//! voltage and ambient temperature from the frame's analog measurements, correct each raw
//! pixel for gain, offset drift and emissivity to get its infrared voltage, then invert the
//! radiometric fourth-power relation to get an object temperature. Object temperatures in the
//! extended ranges (outside roughly 0℃ to the device's second corner temperature) get an
//! additional iterative correction.
//!
//! The whole pipeline is pure: the same calibration, frames and parameters always produce
//! bit-identical output.
// Brings powf and friends into scope for no_std builds; with std the inherent methods win.
#[allow(unused_imports)]
use num_traits::Float;

use crate::calibration::{CalibrationData, BASIC_TEMPERATURE_RANGE};
use crate::frame::RawFrame;
use crate::pattern::AccessPattern;
use crate::{NUM_PIXELS, WIDTH};

/// 0℃ in Kelvins.
const KELVINS_TO_CELSIUS: f32 = 273.15;

/// The typical supply voltage the calibration data is relative to.
const V_DD_0: f32 = 3.3;

/// The lowest temperature the pipeline reports, in degrees Celsius.
pub const TEMPERATURE_MIN: f32 = -40.0;

/// The highest temperature the pipeline reports, in degrees Celsius.
///
/// The sensor saturates around this temperature, so values beyond it are noise.
pub const TEMPERATURE_MAX: f32 = 700.0;

/// The maximum number of refinement rounds for extended range temperatures.
///
/// If an estimate is still moving after this many rounds, the last one is kept (and then
/// clamped to the reportable span).
pub const EXTENDED_RANGE_ITERATIONS: usize = 4;

/// Stop refining once successive estimates are this close, in degrees Celsius.
const EXTENDED_RANGE_EPSILON: f32 = 0.05;

/// Scene parameters supplied by the caller for each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompensationParams {
    /// The temperature reflected off the scene, in degrees Celsius.
    ///
    /// The thermopiles see reflected radiation on top of what the scene emits, and only the
    /// application knows what the surroundings are. A common fallback is to assume the scene
    /// reflects the ambient temperature.
    pub reflected_temperature: f32,

    /// The emissivity of the scene, in the range (0, 1].
    pub emissivity: f32,

    /// The ADC resolution correction factor.
    ///
    /// 1.0 when the camera is running at the ADC resolution it was calibrated at, and a
    /// power of two otherwise. [`Camera`][crate::Camera] fills this in automatically.
    pub resolution_correction: f32,
}

impl CompensationParams {
    /// Parameters for a camera running at its calibrated ADC resolution.
    pub fn new(reflected_temperature: f32, emissivity: f32) -> Self {
        Self {
            reflected_temperature,
            emissivity,
            resolution_correction: 1f32,
        }
    }
}

/// A fully compensated frame of temperatures.
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureFrame {
    pixels: [f32; NUM_PIXELS],
    ambient_temperature: f32,
    reflected_temperature: f32,
}

impl TemperatureFrame {
    /// Per-pixel object temperatures in degrees Celsius, in row-major order.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// The temperature of a single pixel, in degrees Celsius.
    pub fn pixel(&self, row: usize, column: usize) -> f32 {
        self.pixels[row * WIDTH + column]
    }

    /// The ambient temperature of the camera itself, in degrees Celsius.
    ///
    /// This is the die temperature, which typically runs a few degrees warmer than the
    /// environment.
    pub fn ambient_temperature(&self) -> f32 {
        self.ambient_temperature
    }

    /// The reflected temperature the caller supplied for this frame.
    pub fn reflected_temperature(&self) -> f32 {
        self.reflected_temperature
    }
}

/// Per-frame values shared by every pixel of that frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct CommonIrData {
    /// The gain correction factor (calibrated gain over measured gain).
    gain: f32,

    /// The current supply voltage.
    v_dd: f32,

    /// The ambient (die) temperature.
    t_a: f32,

    /// The combined reflected and ambient radiance term (T<sub>a-r</sub>).
    t_a_r: f32,

    /// Sensitivity drift with ambient temperature, 1 + K<sub>S<sub>Ta</sub></sub>(T<sub>a</sub> - 25).
    alpha_coefficient: f32,
}

impl CommonIrData {
    fn new(calibration: &CalibrationData, frame: &RawFrame, params: &CompensationParams) -> Self {
        let t_a = ambient_temperature(
            calibration,
            v_ptat_art(calibration, frame.t_a_ptat, frame.t_a_v_be),
            delta_v(calibration, frame.v_dd_pixel),
        );
        Self {
            gain: calibration.gain / f32::from(frame.gain),
            v_dd: v_dd(
                calibration,
                params.resolution_correction,
                frame.v_dd_pixel,
            ),
            t_a,
            t_a_r: t_a_r(t_a, params.reflected_temperature, params.emissivity),
            alpha_coefficient: 1f32 + calibration.k_s_ta * (t_a - 25f32),
        }
    }
}

/// Compensate raw subpage measurements into a full frame of temperatures.
///
/// `frames` are the two most recent captures, oldest first. In the normal alternating mode
/// they cover opposite subpages and together update every pixel; in repeat mode they cover
/// the same subpage and the older frame supplies the stale half of the array. Each pixel is
/// taken from the most recent frame whose subpage covers it under `pattern`, and compensated
/// with that frame's own analog measurements.
pub fn compensate(
    calibration: &CalibrationData,
    pattern: AccessPattern,
    frames: [&RawFrame; 2],
    params: &CompensationParams,
) -> TemperatureFrame {
    let common = [
        CommonIrData::new(calibration, frames[0], params),
        CommonIrData::new(calibration, frames[1], params),
    ];
    let mut pixels = [0f32; NUM_PIXELS];
    for (index, temperature) in pixels.iter_mut().enumerate() {
        let source = if pattern.classify_index(index) == frames[1].subpage {
            1
        } else {
            0
        };
        let data = &common[source];
        let v_ir = per_pixel_v_ir(
            frames[source].pixels[index],
            data,
            params.emissivity,
            calibration.offset[index],
            calibration.k_v[index],
            calibration.k_ta[index],
        );
        let alpha = calibration.alpha[index] * data.alpha_coefficient;
        *temperature = object_temperature(calibration, v_ir, alpha, data.t_a_r);
    }
    TemperatureFrame {
        pixels,
        ambient_temperature: common[1].t_a,
        reflected_temperature: params.reflected_temperature,
    }
}

/// The difference between the current supply voltage and the calibration voltage, scaled by
/// the supply voltage coefficient.
fn delta_v(calibration: &CalibrationData, v_dd_pixel: i16) -> f32 {
    (f32::from(v_dd_pixel) - f32::from(calibration.v_dd_25)) / f32::from(calibration.k_v_dd)
}

/// The current supply voltage.
fn v_dd(calibration: &CalibrationData, resolution_correction: f32, v_dd_pixel: i16) -> f32 {
    (resolution_correction * f32::from(v_dd_pixel) - f32::from(calibration.v_dd_25))
        / f32::from(calibration.k_v_dd)
        + V_DD_0
}

/// The voltage proportional to the ambient temperature, in "artificial" units.
fn v_ptat_art(calibration: &CalibrationData, t_a_ptat: i16, t_a_v_be: i16) -> f32 {
    let denominator =
        i32::from(t_a_ptat) * calibration.alpha_ptat as i32 + i32::from(t_a_v_be);
    (f32::from(t_a_ptat) / denominator as f32) * 18f32.exp2()
}

/// The ambient temperature of the camera die, in degrees Celsius.
fn ambient_temperature(calibration: &CalibrationData, v_ptat_art: f32, delta_v: f32) -> f32 {
    (v_ptat_art / (1f32 + calibration.k_v_ptat * delta_v) - calibration.v_ptat_25)
        / calibration.k_t_ptat
        + 25f32
}

/// The infrared voltage seen by a single pixel, corrected for gain, offset drift and
/// emissivity.
fn per_pixel_v_ir(
    pixel_data: i16,
    common: &CommonIrData,
    emissivity: f32,
    reference_offset: i16,
    k_v: f32,
    k_ta: f32,
) -> f32 {
    let pixel_gain = f32::from(pixel_data) * common.gain;
    let pixel_offset = f32::from(reference_offset)
        * (1f32 + k_ta * (common.t_a - 25f32))
        * (1f32 + k_v * (common.v_dd - V_DD_0));
    (pixel_gain - pixel_offset) / emissivity
}

/// The combined radiance term from the ambient and reflected temperatures
/// (T<sub>a-r</sub><sup>4</sup>, in Kelvins to the fourth).
fn t_a_r(t_a: f32, t_r: f32, emissivity: f32) -> f32 {
    let t_r_4 = (t_r + KELVINS_TO_CELSIUS).powi(4);
    let t_a_4 = (t_a + KELVINS_TO_CELSIUS).powi(4);
    t_r_4 - (t_r_4 - t_a_4) / emissivity
}

/// A pixel's object temperature assuming it falls in the basic temperature range.
fn basic_temperature(v_ir: f32, alpha: f32, t_a_r: f32, k_s_to: f32) -> f32 {
    let s_x = k_s_to * (alpha.powi(3) * v_ir + alpha.powi(4) * t_a_r).powf(0.25);
    let radicand = v_ir / (alpha * (1f32 - k_s_to * KELVINS_TO_CELSIUS) + s_x) + t_a_r;
    radicand.max(0f32).powf(0.25) - KELVINS_TO_CELSIUS
}

/// One refinement round for a temperature in an extended range.
fn extended_temperature(
    calibration: &CalibrationData,
    v_ir: f32,
    alpha: f32,
    t_a_r: f32,
    range: usize,
    previous: f32,
) -> f32 {
    let corner = f32::from(calibration.corner_temperatures[range]);
    let denominator = alpha
        * calibration.alpha_correction[range]
        * (1f32 + calibration.k_s_to[range] * (previous - corner));
    (v_ir / denominator + t_a_r).max(0f32).powf(0.25) - KELVINS_TO_CELSIUS
}

/// A pixel's object temperature, in degrees Celsius.
///
/// The basic range formula is evaluated first; if the result lands in an extended range, it
/// is refined with that range's correction coefficients. The refinement feeds back into
/// itself, so it is capped at [`EXTENDED_RANGE_ITERATIONS`] rounds with the last estimate
/// kept if it hasn't settled by then. The result is clamped to the sensor's usable span.
fn object_temperature(calibration: &CalibrationData, v_ir: f32, alpha: f32, t_a_r: f32) -> f32 {
    let mut temperature =
        basic_temperature(v_ir, alpha, t_a_r, calibration.k_s_to[BASIC_TEMPERATURE_RANGE]);
    let mut range = calibration.temperature_range(temperature);
    if range != BASIC_TEMPERATURE_RANGE {
        for _ in 0..EXTENDED_RANGE_ITERATIONS {
            let refined = extended_temperature(calibration, v_ir, alpha, t_a_r, range, temperature);
            let next_range = calibration.temperature_range(refined);
            let settled = (refined - temperature).abs() < EXTENDED_RANGE_EPSILON;
            temperature = refined;
            if settled && next_range == range {
                break;
            }
            range = next_range;
        }
    }
    temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX)
}
