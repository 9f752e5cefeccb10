// SPDX-License-Identifier: Apache-2.0
//! The bit-level layout of the calibration EEPROM.
//!
//! Every calibration constant is some run of bits within one of the 832 words of the EEPROM
//! block, so rather than hand-writing shift-and-mask code for each one, the layout is recorded
//! as a table of [`Field`]s and one extraction routine handles all of them. Word offsets are
//! relative to the start of the block (0x2400); multi-entry fields (per-row, per-column and
//! per-pixel data) are generated by the indexed functions below.
use crate::{HEIGHT, NUM_PIXELS, WIDTH};

/// A run of bits within the EEPROM block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Field {
    /// Word offset from the start of the EEPROM block.
    pub(crate) word: usize,

    /// Bit offset of the least significant bit, from the LSB of the word.
    pub(crate) bit: u8,

    /// Width in bits.
    pub(crate) width: u8,

    /// Whether the field is a two's complement signed integer.
    pub(crate) signed: bool,
}

impl Field {
    const fn unsigned(word: usize, bit: u8, width: u8) -> Self {
        Self {
            word,
            bit,
            width,
            signed: false,
        }
    }

    const fn signed(word: usize, bit: u8, width: u8) -> Self {
        Self {
            word,
            bit,
            width,
            signed: true,
        }
    }

    /// Extract this field's value from an EEPROM block.
    ///
    /// Signed fields are sign-extended from their width.
    pub(crate) fn extract(&self, eeprom: &[u16]) -> i32 {
        let mask = (1u32 << self.width) - 1;
        let raw = (u32::from(eeprom[self.word]) >> self.bit) & mask;
        if self.signed {
            let shift = 32 - u32::from(self.width);
            ((raw << shift) as i32) >> shift
        } else {
            raw as i32
        }
    }
}

// Scaling data for the per-pixel offsets.
pub(crate) const ALPHA_PTAT: Field = Field::unsigned(0x10, 12, 4);
pub(crate) const OFFSET_SCALE_ROW: Field = Field::unsigned(0x10, 8, 4);
pub(crate) const OFFSET_SCALE_COLUMN: Field = Field::unsigned(0x10, 4, 4);
pub(crate) const OFFSET_SCALE_REMNANT: Field = Field::unsigned(0x10, 0, 4);
pub(crate) const OFFSET_AVERAGE: Field = Field::signed(0x11, 0, 16);

// Scaling data for the per-pixel sensitivities.
pub(crate) const ALPHA_SCALE: Field = Field::unsigned(0x20, 12, 4);
pub(crate) const ALPHA_SCALE_ROW: Field = Field::unsigned(0x20, 8, 4);
pub(crate) const ALPHA_SCALE_COLUMN: Field = Field::unsigned(0x20, 4, 4);
pub(crate) const ALPHA_SCALE_REMNANT: Field = Field::unsigned(0x20, 0, 4);
pub(crate) const ALPHA_AVERAGE: Field = Field::signed(0x21, 0, 16);

// Gain, supply voltage and ambient temperature constants.
pub(crate) const GAIN: Field = Field::signed(0x30, 0, 16);
pub(crate) const V_PTAT_25: Field = Field::signed(0x31, 0, 16);
pub(crate) const K_V_PTAT: Field = Field::signed(0x32, 10, 6);
pub(crate) const K_T_PTAT: Field = Field::signed(0x32, 0, 10);
pub(crate) const K_V_DD: Field = Field::signed(0x33, 8, 8);
pub(crate) const V_DD_25: Field = Field::unsigned(0x33, 0, 8);

// Scales for the per-pixel K_V and K_Ta coefficients, and the calibrated ADC resolution.
pub(crate) const RESOLUTION: Field = Field::unsigned(0x38, 12, 2);
pub(crate) const K_V_SCALE: Field = Field::unsigned(0x38, 8, 4);
pub(crate) const K_TA_SCALE_1: Field = Field::unsigned(0x38, 4, 4);
pub(crate) const K_TA_SCALE_2: Field = Field::unsigned(0x38, 0, 4);

// Object temperature coefficients.
pub(crate) const K_S_TA: Field = Field::signed(0x3C, 8, 8);
pub(crate) const K_S_TO_1: Field = Field::signed(0x3D, 8, 8);
pub(crate) const K_S_TO_0: Field = Field::signed(0x3D, 0, 8);
pub(crate) const K_S_TO_3: Field = Field::signed(0x3E, 8, 8);
pub(crate) const K_S_TO_2: Field = Field::signed(0x3E, 0, 8);
pub(crate) const CORNER_TEMPERATURE_STEP: Field = Field::unsigned(0x3F, 12, 2);
pub(crate) const CORNER_TEMPERATURE_3: Field = Field::unsigned(0x3F, 8, 4);
pub(crate) const CORNER_TEMPERATURE_2: Field = Field::unsigned(0x3F, 4, 4);
pub(crate) const K_S_TO_SCALE: Field = Field::unsigned(0x3F, 0, 4);

/// The first per-pixel calibration word.
pub(crate) const PIXEL_BASE: usize = 0x40;

/// The per-row component of a pixel's offset.
///
/// Four rows are packed per word, low nibble first.
pub(crate) fn offset_row(row: usize) -> Field {
    debug_assert!(row < HEIGHT);
    Field::signed(0x12 + row / 4, (row % 4) as u8 * 4, 4)
}

/// The per-column component of a pixel's offset.
pub(crate) fn offset_column(column: usize) -> Field {
    debug_assert!(column < WIDTH);
    Field::signed(0x18 + column / 4, (column % 4) as u8 * 4, 4)
}

/// The per-row component of a pixel's sensitivity.
pub(crate) fn alpha_row(row: usize) -> Field {
    debug_assert!(row < HEIGHT);
    Field::signed(0x22 + row / 4, (row % 4) as u8 * 4, 4)
}

/// The per-column component of a pixel's sensitivity.
pub(crate) fn alpha_column(column: usize) -> Field {
    debug_assert!(column < WIDTH);
    Field::signed(0x28 + column / 4, (column % 4) as u8 * 4, 4)
}

/// The K_V average shared by pixels with the given row and column parities.
///
/// Word 0x34 holds one nibble for each cell of a 2×2 chess board tile, most significant
/// nibble first: even row and even column down to odd row and odd column.
pub(crate) fn k_v_average(row_odd: bool, column_odd: bool) -> Field {
    let bit = match (row_odd, column_odd) {
        (false, false) => 12,
        (true, false) => 8,
        (false, true) => 4,
        (true, true) => 0,
    };
    Field::signed(0x34, bit, 4)
}

/// The K_Ta average shared by pixels with the given row and column parities.
///
/// The same 2×2 tile arrangement as [`k_v_average`], but with a byte per cell spread over
/// words 0x36 (even columns) and 0x37 (odd columns).
pub(crate) fn k_ta_average(row_odd: bool, column_odd: bool) -> Field {
    let word = if column_odd { 0x37 } else { 0x36 };
    let bit = if row_odd { 0 } else { 8 };
    Field::signed(word, bit, 8)
}

/// The remainder component of a single pixel's offset.
pub(crate) fn pixel_offset(index: usize) -> Field {
    debug_assert!(index < NUM_PIXELS);
    Field::signed(PIXEL_BASE + index, 10, 6)
}

/// The remainder component of a single pixel's sensitivity.
pub(crate) fn pixel_alpha(index: usize) -> Field {
    debug_assert!(index < NUM_PIXELS);
    Field::signed(PIXEL_BASE + index, 4, 6)
}

/// The remainder component of a single pixel's K_Ta.
pub(crate) fn pixel_k_ta(index: usize) -> Field {
    debug_assert!(index < NUM_PIXELS);
    Field::signed(PIXEL_BASE + index, 1, 3)
}
