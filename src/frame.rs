// SPDX-License-Identifier: Apache-2.0
//! Raw frame acquisition.
//!
//! A "frame" from the camera's point of view is one measurement of a single subpage: half of
//! the pixels, plus the handful of analog measurements (supply voltage, ambient temperature
//! sensors and gain) taken alongside them. The camera signals a completed measurement through
//! the status register, and the controller acknowledges it by clearing the new-data flag after
//! reading RAM out.
use embedded_hal::blocking::i2c;

use crate::address::RamAddress;
use crate::bus;
use crate::error::{Error, LibraryError};
use crate::register::{StatusRegister, Subpage};
use crate::NUM_PIXELS;

/// How many times [`capture`] polls the status register before giving up.
///
/// At the default 2Hz refresh rate a measurement lands well within this many polls over any
/// reasonable bus speed.
pub const DEFAULT_POLL_LIMIT: usize = 500;

/// The raw data of a single subpage measurement.
///
/// All values are exactly as read from the camera's RAM; nothing has been compensated yet.
/// The pixel block always contains all 768 pixels, but only the ones belonging to
/// [`subpage`][RawFrame::subpage] were updated by this measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    /// The subpage this measurement covers.
    pub(crate) subpage: Subpage,

    /// Raw pixel values, in row-major order.
    pub(crate) pixels: [i16; NUM_PIXELS],

    /// The raw pixel supply voltage measurement (V<sub>DD<sub>pixel</sub></sub>).
    pub(crate) v_dd_pixel: i16,

    /// Half of the ambient temperature measurement (T<sub>a<sub>V<sub>BE</sub></sub></sub>).
    pub(crate) t_a_v_be: i16,

    /// The other half (T<sub>a<sub>PTAT</sub></sub>).
    pub(crate) t_a_ptat: i16,

    /// The gain measurement taken with this frame.
    pub(crate) gain: i16,
}

impl RawFrame {
    /// The subpage this measurement covers.
    pub fn subpage(&self) -> Subpage {
        self.subpage
    }

    /// The raw pixel values, in row-major order.
    pub fn pixels(&self) -> &[i16] {
        &self.pixels
    }
}

/// Wait for and read out a measurement of the expected subpage.
///
/// The status register is polled up to `poll_limit` times; if no measurement completes in that
/// window the result is [`LibraryError::DataNotAvailable`]. If a measurement is ready but for
/// the wrong subpage, it is discarded (so a following capture waits for fresh data) and
/// [`LibraryError::SubpageOutOfSync`] is returned so the caller can retry in step.
pub(crate) fn capture<I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    expected: Subpage,
    poll_limit: usize,
) -> Result<RawFrame, Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    let mut ready: Option<StatusRegister> = None;
    for _ in 0..poll_limit {
        let status: StatusRegister = bus::read_register(bus, i2c_address)?;
        if status.new_data {
            ready = Some(status);
            break;
        }
        core::hint::spin_loop();
    }
    let status = ready.ok_or(LibraryError::DataNotAvailable {
        attempts: poll_limit,
    })?;
    if status.last_updated_subpage != expected {
        acknowledge(bus, i2c_address)?;
        return Err(LibraryError::SubpageOutOfSync {
            expected,
            actual: status.last_updated_subpage,
        }
        .into());
    }
    // One block read for the whole pixel area, then the scattered analog measurements.
    let mut pixel_bytes = [0u8; NUM_PIXELS * 2];
    bus::read_bytes(
        bus,
        i2c_address,
        RamAddress::PixelBase.into(),
        &mut pixel_bytes,
    )?;
    let mut pixels = [0i16; NUM_PIXELS];
    for (pixel, pair) in pixels.iter_mut().zip(pixel_bytes.chunks_exact(2)) {
        *pixel = i16::from_be_bytes([pair[0], pair[1]]);
    }
    let t_a_v_be = bus::read_signed_word(bus, i2c_address, RamAddress::TaVBe.into())?;
    let gain = bus::read_signed_word(bus, i2c_address, RamAddress::Gain.into())?;
    let t_a_ptat = bus::read_signed_word(bus, i2c_address, RamAddress::TaPtat.into())?;
    let v_dd_pixel = bus::read_signed_word(bus, i2c_address, RamAddress::VddPixel.into())?;
    acknowledge(bus, i2c_address)?;
    Ok(RawFrame {
        subpage: status.last_updated_subpage,
        pixels,
        v_dd_pixel,
        t_a_v_be,
        t_a_ptat,
        gain,
    })
}

/// Clear the new-data flag, allowing the camera to publish its next measurement.
fn acknowledge<I2C>(bus: &mut I2C, i2c_address: u8) -> Result<(), Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    let cleared = StatusRegister {
        // Read-only field, ignored by the write mask.
        last_updated_subpage: Subpage::Zero,
        new_data: false,
        overwrite_enabled: true,
    };
    bus::update_register(bus, i2c_address, cleared)
}
