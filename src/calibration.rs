// SPDX-License-Identifier: Apache-2.0
//! Parsing the camera's calibration EEPROM.
//!
//! Every MLX90640 is calibrated at the factory, with the results packed into an 832-word
//! EEPROM block. Most constants are stored as narrow integers that get scaled by powers of
//! two, and the per-pixel data is stored as small deltas from averages shared by a row, a
//! column, or a parity class of pixels. [`CalibrationData`] unpacks all of it up front so the
//! per-frame math only deals with plain numbers.
// Brings exp2 and friends into scope for no_std builds; with std the inherent methods win.
#[allow(unused_imports)]
use num_traits::Float;

use crate::error::LibraryError;
use crate::layout;
use crate::register::Resolution;
use crate::util::be_bytes_to_words;
use crate::{NUM_PIXELS, WIDTH};

/// The number of corner temperatures an MLX90640 has.
const NUM_CORNER_TEMPERATURES: usize = 4;

/// The index of the basic temperature range.
///
/// Temperature ranges (delimited by the corner temperatures) outside of the basic range are
/// "extended" ranges and need extra correction for accuracy. The basic range is the one with
/// α<sub>correction</sub> = 1.
pub(crate) const BASIC_TEMPERATURE_RANGE: usize = 1;

/// The fully parsed contents of the calibration EEPROM.
///
/// Constructed from a dump of the EEPROM with [`from_words`][CalibrationData::from_words] or
/// [`from_bytes`][CalibrationData::from_bytes]; construction either succeeds completely or
/// leaves nothing behind. The field names follow the symbols used in the datasheet.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationData {
    /// Supply voltage coefficient (K<sub>V<sub>DD</sub></sub>).
    pub(crate) k_v_dd: i16,

    /// Supply voltage reading at 25℃ (V<sub>DD<sub>25</sub></sub>).
    pub(crate) v_dd_25: i16,

    /// The ADC resolution the device was calibrated at, as the raw two-bit field.
    pub(crate) resolution: u8,

    /// Voltage coefficient of the ambient temperature sensor (K<sub>V<sub>PTAT</sub></sub>).
    pub(crate) k_v_ptat: f32,

    /// Temperature coefficient of the ambient temperature sensor (K<sub>T<sub>PTAT</sub></sub>).
    pub(crate) k_t_ptat: f32,

    /// Voltage proportional to ambient temperature at 25℃ (V<sub>PTAT<sub>25</sub></sub>).
    pub(crate) v_ptat_25: f32,

    /// Sensitivity proportional to ambient temperature (α<sub>PTAT</sub>).
    pub(crate) alpha_ptat: f32,

    /// The gain constant.
    pub(crate) gain: f32,

    /// Sensitivity coefficient for ambient temperature (K<sub>S<sub>T<sub>a</sub></sub></sub>).
    pub(crate) k_s_ta: f32,

    /// The corner temperatures delimiting the temperature ranges.
    ///
    /// The first two are fixed at -40℃ and 0℃; the upper two are device specific.
    pub(crate) corner_temperatures: [i16; NUM_CORNER_TEMPERATURES],

    /// Object temperature sensitivity per range (K<sub>S<sub>T<sub>o</sub></sub></sub>(n)).
    pub(crate) k_s_to: [f32; NUM_CORNER_TEMPERATURES],

    /// Sensitivity correction per temperature range (α<sub>correction</sub>(n)).
    pub(crate) alpha_correction: [f32; NUM_CORNER_TEMPERATURES],

    /// Per-pixel reference offsets.
    pub(crate) offset: [i16; NUM_PIXELS],

    /// Per-pixel sensitivities (α).
    pub(crate) alpha: [f32; NUM_PIXELS],

    /// Per-pixel ambient temperature coefficients (K<sub>T<sub>a</sub></sub>).
    pub(crate) k_ta: [f32; NUM_PIXELS],

    /// Per-pixel voltage coefficients (K<sub>V</sub>).
    pub(crate) k_v: [f32; NUM_PIXELS],
}

impl CalibrationData {
    /// The number of 16-bit words in a full EEPROM dump.
    pub const EEPROM_WORDS: usize = 832;

    /// Parse calibration data from a full EEPROM dump.
    ///
    /// The slice must cover the entire EEPROM (addresses 0x2400 through 0x273F), even though
    /// the first 16 words are not used for calibration.
    pub fn from_words(eeprom: &[u16]) -> Result<Self, LibraryError> {
        if eeprom.len() != Self::EEPROM_WORDS {
            return Err(LibraryError::MalformedCalibration {
                expected: Self::EEPROM_WORDS,
                actual: eeprom.len(),
            });
        }
        let offset = per_pixel_offsets(eeprom);
        let alpha = per_pixel_alphas(eeprom);
        let (k_ta, k_v) = per_pixel_coefficients(eeprom);

        let k_v_ptat = layout::K_V_PTAT.extract(eeprom) as f32 / 12f32.exp2();
        let k_t_ptat = layout::K_T_PTAT.extract(eeprom) as f32 / 8f32;
        let k_v_dd = (layout::K_V_DD.extract(eeprom) << 5) as i16;
        // Stored unsigned; recentered around 256 and rescaled before use.
        let v_dd_25 = ((layout::V_DD_25.extract(eeprom) - 256) * (1 << 5) - (1 << 13)) as i16;
        let alpha_ptat = (layout::ALPHA_PTAT.extract(eeprom) / 4 + 8) as f32;
        let k_s_ta = layout::K_S_TA.extract(eeprom) as f32 / 13f32.exp2();

        let k_s_to_scale = (layout::K_S_TO_SCALE.extract(eeprom) + 8) as f32;
        let k_s_to = [
            layout::K_S_TO_0.extract(eeprom) as f32 / k_s_to_scale.exp2(),
            layout::K_S_TO_1.extract(eeprom) as f32 / k_s_to_scale.exp2(),
            layout::K_S_TO_2.extract(eeprom) as f32 / k_s_to_scale.exp2(),
            layout::K_S_TO_3.extract(eeprom) as f32 / k_s_to_scale.exp2(),
        ];
        // The temperature step is stored in units of 10℃, and the upper corner temperatures
        // build on each other. The lower two corners are fixed by the datasheet.
        let step = layout::CORNER_TEMPERATURE_STEP.extract(eeprom) as i16 * 10;
        let ct2 = layout::CORNER_TEMPERATURE_2.extract(eeprom) as i16 * step;
        let ct3 = layout::CORNER_TEMPERATURE_3.extract(eeprom) as i16 * step + ct2;
        let corner_temperatures = [-40, 0, ct2, ct3];
        let alpha_correction = alpha_correction_coefficients(&corner_temperatures, &k_s_to);

        Ok(Self {
            k_v_dd,
            v_dd_25,
            resolution: layout::RESOLUTION.extract(eeprom) as u8,
            k_v_ptat,
            k_t_ptat,
            v_ptat_25: layout::V_PTAT_25.extract(eeprom) as f32,
            alpha_ptat,
            gain: layout::GAIN.extract(eeprom) as f32,
            k_s_ta,
            corner_temperatures,
            k_s_to,
            alpha_correction,
            offset,
            alpha,
            k_ta,
            k_v,
        })
    }

    /// Parse calibration data from a big-endian byte dump of the EEPROM.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LibraryError> {
        if data.len() != Self::EEPROM_WORDS * 2 {
            return Err(LibraryError::MalformedCalibration {
                expected: Self::EEPROM_WORDS,
                actual: data.len() / 2,
            });
        }
        let mut words = [0u16; Self::EEPROM_WORDS];
        be_bytes_to_words(data, &mut words);
        Self::from_words(&words)
    }

    /// The raw ADC resolution field the device was calibrated at.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// The corner temperatures delimiting the device's temperature ranges, in degrees Celsius.
    pub fn corner_temperatures(&self) -> &[i16] {
        &self.corner_temperatures
    }

    /// The correction factor between the calibrated ADC resolution and the current one.
    pub(crate) fn resolution_correction(&self, current: Resolution) -> f32 {
        let difference = i32::from(self.resolution) - current.as_raw() as i32;
        2f32.powi(difference)
    }

    /// The index of the temperature range a temperature falls in.
    pub(crate) fn temperature_range(&self, temperature: f32) -> usize {
        let ct = &self.corner_temperatures;
        // Everything beyond the last corner is the top range; everything below -40℃ is
        // clamped into the bottom one.
        (1..NUM_CORNER_TEMPERATURES)
            .rev()
            .find(|&n| temperature >= f32::from(ct[n]))
            .unwrap_or(0)
    }
}

/// Compute all the per-pixel reference offsets.
///
/// Each pixel's offset is the array-wide average plus scaled per-row, per-column and per-pixel
/// deltas.
fn per_pixel_offsets(eeprom: &[u16]) -> [i16; NUM_PIXELS] {
    let row_scale = layout::OFFSET_SCALE_ROW.extract(eeprom) as u32;
    let column_scale = layout::OFFSET_SCALE_COLUMN.extract(eeprom) as u32;
    let remnant_scale = layout::OFFSET_SCALE_REMNANT.extract(eeprom) as u32;
    let average = layout::OFFSET_AVERAGE.extract(eeprom);
    let mut offsets = [0i16; NUM_PIXELS];
    for (index, offset) in offsets.iter_mut().enumerate() {
        let row = layout::offset_row(index / WIDTH).extract(eeprom) << row_scale;
        let column = layout::offset_column(index % WIDTH).extract(eeprom) << column_scale;
        let remnant = layout::pixel_offset(index).extract(eeprom) << remnant_scale;
        *offset = (average + row + column + remnant) as i16;
    }
    offsets
}

/// Compute all the per-pixel sensitivities.
///
/// Same structure as the offsets, but the integer sum is then scaled down by
/// 2<sup>α_scale + 30</sup> into the actual (tiny) sensitivity value.
fn per_pixel_alphas(eeprom: &[u16]) -> [f32; NUM_PIXELS] {
    let alpha_scale = (layout::ALPHA_SCALE.extract(eeprom) + 30) as f32;
    let row_scale = layout::ALPHA_SCALE_ROW.extract(eeprom) as u32;
    let column_scale = layout::ALPHA_SCALE_COLUMN.extract(eeprom) as u32;
    let remnant_scale = layout::ALPHA_SCALE_REMNANT.extract(eeprom) as u32;
    let average = layout::ALPHA_AVERAGE.extract(eeprom);
    let mut alphas = [0f32; NUM_PIXELS];
    for (index, alpha) in alphas.iter_mut().enumerate() {
        let row = layout::alpha_row(index / WIDTH).extract(eeprom) << row_scale;
        let column = layout::alpha_column(index % WIDTH).extract(eeprom) << column_scale;
        let remnant = layout::pixel_alpha(index).extract(eeprom) << remnant_scale;
        *alpha = (average + row + column + remnant) as f32 / alpha_scale.exp2();
    }
    alphas
}

/// Compute the per-pixel K<sub>T<sub>a</sub></sub> and K<sub>V</sub> coefficients.
///
/// Both coefficients share an average between all pixels whose row and column parities match,
/// tiling the array like a 2×2 chess board. K<sub>T<sub>a</sub></sub> additionally has a
/// per-pixel delta; K<sub>V</sub> is the average alone.
fn per_pixel_coefficients(eeprom: &[u16]) -> ([f32; NUM_PIXELS], [f32; NUM_PIXELS]) {
    let k_v_scale = layout::K_V_SCALE.extract(eeprom) as f32;
    let k_ta_scale_1 = (layout::K_TA_SCALE_1.extract(eeprom) + 8) as f32;
    let k_ta_scale_2 = layout::K_TA_SCALE_2.extract(eeprom) as u32;
    let mut k_ta = [0f32; NUM_PIXELS];
    let mut k_v = [0f32; NUM_PIXELS];
    for index in 0..NUM_PIXELS {
        let row_odd = (index / WIDTH) % 2 == 1;
        let column_odd = (index % WIDTH) % 2 == 1;
        let k_ta_average = layout::k_ta_average(row_odd, column_odd).extract(eeprom);
        let remnant = layout::pixel_k_ta(index).extract(eeprom) << k_ta_scale_2;
        // The numerator stays an integer as long as possible to limit floating point error.
        k_ta[index] = (k_ta_average + remnant) as f32 / k_ta_scale_1.exp2();
        k_v[index] = layout::k_v_average(row_odd, column_odd).extract(eeprom) as f32
            / k_v_scale.exp2();
    }
    (k_ta, k_v)
}

/// The sensitivity correction coefficients for the different temperature ranges.
///
/// Built recursively outward from the basic range, which needs no correction.
fn alpha_correction_coefficients(
    corner_temperatures: &[i16; NUM_CORNER_TEMPERATURES],
    k_s_to: &[f32; NUM_CORNER_TEMPERATURES],
) -> [f32; NUM_CORNER_TEMPERATURES] {
    let mut corrections = [1f32; NUM_CORNER_TEMPERATURES];
    for n in (0..BASIC_TEMPERATURE_RANGE).rev() {
        let span = f32::from(corner_temperatures[n + 1] - corner_temperatures[n]);
        corrections[n] = corrections[n + 1] * (1f32 + k_s_to[n] * span).recip();
    }
    for n in (BASIC_TEMPERATURE_RANGE + 1)..NUM_CORNER_TEMPERATURES {
        let span = f32::from(corner_temperatures[n] - corner_temperatures[n - 1]);
        corrections[n] = corrections[n - 1] * (1f32 + k_s_to[n - 1] * span);
    }
    corrections
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::test::mlx90640_datasheet_eeprom;
    use crate::HEIGHT;

    fn datasheet_calibration() -> CalibrationData {
        CalibrationData::from_words(&mlx90640_datasheet_eeprom())
            .expect("the datasheet EEPROM data should parse")
    }

    // The index used by the worked example in the datasheet, pixel (12, 16) 1-indexed.
    const EXAMPLE_PIXEL: usize = 11 * WIDTH + 15;

    #[test]
    fn rejects_short_dumps() {
        let short = [0u16; 16];
        assert_eq!(
            CalibrationData::from_words(&short),
            Err(LibraryError::MalformedCalibration {
                expected: CalibrationData::EEPROM_WORDS,
                actual: 16,
            })
        );
    }

    #[test]
    fn rejects_short_byte_dumps() {
        let short = [0u8; 100];
        assert!(matches!(
            CalibrationData::from_bytes(&short),
            Err(LibraryError::MalformedCalibration { .. })
        ));
    }

    #[test]
    fn resolution() {
        assert_eq!(datasheet_calibration().resolution(), 2);
    }

    #[test]
    fn supply_voltage_constants() {
        let calibration = datasheet_calibration();
        assert_eq!(calibration.k_v_dd, -3168);
        assert_eq!(calibration.v_dd_25, -13056);
    }

    #[test]
    fn ambient_temperature_constants() {
        let calibration = datasheet_calibration();
        assert_approx_eq!(f32, calibration.k_v_ptat, 0.0053710938);
        assert_eq!(calibration.k_t_ptat, 42.25);
        assert_eq!(calibration.v_ptat_25, 12273f32);
        assert_eq!(calibration.alpha_ptat, 9f32);
    }

    #[test]
    fn gain() {
        assert_eq!(datasheet_calibration().gain, 6383f32);
    }

    #[test]
    fn k_s_ta() {
        assert_eq!(datasheet_calibration().k_s_ta, -0.001953125);
    }

    #[test]
    fn k_s_to() {
        assert_eq!(datasheet_calibration().k_s_to[1], -0.00080108642578125);
    }

    #[test]
    fn corner_temperatures() {
        let calibration = datasheet_calibration();
        assert_eq!(calibration.corner_temperatures(), &[-40, 0, 160, 320]);
    }

    #[test]
    fn alpha_correction_basic_range_is_one() {
        let calibration = datasheet_calibration();
        assert_eq!(calibration.alpha_correction[BASIC_TEMPERATURE_RANGE], 1f32);
        // The ranges above the basic one follow the recursion against the range below.
        let expected_range_2 = 1f32 + calibration.k_s_to[1] * 160f32;
        assert_approx_eq!(f32, calibration.alpha_correction[2], expected_range_2);
    }

    #[test]
    fn pixel_offset() {
        assert_eq!(datasheet_calibration().offset[EXAMPLE_PIXEL], -75);
    }

    #[test]
    fn pixel_alpha() {
        assert_approx_eq!(
            f32,
            datasheet_calibration().alpha[EXAMPLE_PIXEL],
            1.262233122690854E-7
        );
    }

    #[test]
    fn pixel_k_ta() {
        assert_approx_eq!(
            f32,
            datasheet_calibration().k_ta[EXAMPLE_PIXEL],
            0.005126953125
        );
    }

    #[test]
    fn pixel_k_v() {
        assert_eq!(datasheet_calibration().k_v[EXAMPLE_PIXEL], 0.5);
    }

    #[test]
    fn k_v_repeats_by_parity() {
        // K_V has no per-pixel component, so any two pixels two rows and two columns apart
        // share a value.
        let calibration = datasheet_calibration();
        for row in 0..(HEIGHT - 2) {
            for column in 0..(WIDTH - 2) {
                assert_eq!(
                    calibration.k_v[row * WIDTH + column],
                    calibration.k_v[(row + 2) * WIDTH + column + 2],
                    "mismatch at ({}, {})",
                    row,
                    column
                );
            }
        }
    }

    #[test]
    fn resolution_correction() {
        let calibration = datasheet_calibration();
        // Calibrated at the raw value 2; running at 19 bits (raw 3) halves the readings.
        assert_eq!(calibration.resolution_correction(Resolution::Nineteen), 0.5);
        assert_eq!(calibration.resolution_correction(Resolution::Eighteen), 1.0);
    }

    #[test]
    fn temperature_ranges() {
        let calibration = datasheet_calibration();
        assert_eq!(calibration.temperature_range(-60.0), 0);
        assert_eq!(calibration.temperature_range(-10.0), 0);
        assert_eq!(calibration.temperature_range(25.0), 1);
        assert_eq!(calibration.temperature_range(200.0), 2);
        assert_eq!(calibration.temperature_range(500.0), 3);
    }
}
