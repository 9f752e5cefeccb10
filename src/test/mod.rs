// SPDX-License-Identifier: Apache-2.0
//! Shared fixtures for the unit tests.
mod eeprom_data;

pub(crate) use eeprom_data::{mlx90640_datasheet_eeprom, synthetic_uniform_eeprom};
pub(crate) use i2c_mock::{mock_camera, MockCamera};

use crate::frame::RawFrame;
use crate::register::Subpage;
use crate::NUM_PIXELS;

/// A raw frame with every pixel reading the same value.
///
/// The analog measurements are fixed at values that put the supply voltage exactly at 3.3V
/// and the ambient temperature somewhere plausible.
pub(crate) fn uniform_frame(subpage: Subpage, value: i16) -> RawFrame {
    RawFrame {
        subpage,
        pixels: [value; NUM_PIXELS],
        v_dd_pixel: -13056,
        t_a_v_be: 19442,
        t_a_ptat: 1711,
        gain: 1000,
    }
}
