// SPDX-License-Identifier: Apache-2.0
//! Canned EEPROM contents for the unit tests.
use crate::calibration::CalibrationData;

/// The calibration constants used by the worked example in the MLX90640 datasheet.
///
/// Words 0x10 through 0x3F hold the values given in the datasheet's example calculation; the
/// device-specific words before them don't affect calibration and are left zeroed. Real
/// per-pixel data isn't reproduced in the datasheet, so every pixel gets the word from the
/// example pixel instead (offset 2, α 10, K<sub>T<sub>a</sub></sub> 0, not an outlier).
pub(crate) fn mlx90640_datasheet_eeprom() -> [u16; CalibrationData::EEPROM_WORDS] {
    #[rustfmt::skip]
    const CALIBRATION_WORDS: [u16; 0x30] = [
        0x4210, 0xFFBB, 0x0202, 0xF202, 0xF2F2, 0xE2E2, 0xD1E1, 0xB1D1,
        0xF10F, 0xF00F, 0xE0EF, 0xE0EF, 0xE1E1, 0xF3F2, 0xF404, 0xE504,
        0x79A6, 0x2F44, 0xFFDD, 0x2210, 0x3333, 0x2233, 0xEF01, 0x9ACC,
        0xEEDC, 0x10FF, 0x2221, 0x3333, 0x2333, 0x0112, 0xEEFF, 0xBBDD,
        0x18EF, 0x2FF1, 0x5952, 0x9D68, 0x5454, 0x0994, 0x6956, 0x5354,
        0x2363, 0xE446, 0xFBB5, 0x044B, 0xF020, 0x9797, 0x9797, 0x2889,
    ];
    let mut words = [0x08A0u16; CalibrationData::EEPROM_WORDS];
    words[..0x10].fill(0);
    words[0x10..0x40].copy_from_slice(&CALIBRATION_WORDS);
    words
}

/// A synthetic calibration with no per-pixel variation at all.
///
/// Every pixel shares the same offset (zero) and sensitivity, and the voltage and ambient
/// temperature coefficients are zeroed, so a uniform raw frame compensates to a uniform
/// temperature image. Useful for tests that care about the structure of the output rather
/// than the exact numbers.
pub(crate) fn synthetic_uniform_eeprom() -> [u16; CalibrationData::EEPROM_WORDS] {
    let mut words = [0u16; CalibrationData::EEPROM_WORDS];
    // A shared sensitivity of 1000 / 2^30 per pixel.
    words[0x21] = 1000;
    // Gain, V_PTAT_25, K_V_PTAT/K_T_PTAT and K_V_DD/V_DD_25 from the datasheet example so
    // the supply voltage and ambient temperature come out sane.
    words[0x30] = 1000;
    words[0x31] = 0x2FF1;
    words[0x32] = 0x5952;
    words[0x33] = 0x9D68;
    // Calibrated at 18-bit resolution; every other scale zeroed.
    words[0x38] = 0x2000;
    // The usual corner temperatures (-40, 0, 160, 320).
    words[0x3F] = 0x2889;
    words
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn both_fixtures_parse() {
        CalibrationData::from_words(&mlx90640_datasheet_eeprom()).unwrap();
        CalibrationData::from_words(&synthetic_uniform_eeprom()).unwrap();
    }
}
