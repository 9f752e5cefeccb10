// SPDX-License-Identifier: Apache-2.0
//! Driver and temperature compensation pipeline for the Melexis MLX90640 thermal camera.
//!
//! The MLX90640 is a 32×24 array of thermopiles behind an I²C interface. Each pixel reports a
//! raw infrared measurement that has to be pushed through a multi-stage compensation process
//! (using per-device calibration data stored in the camera's EEPROM) before it means anything
//! in degrees Celsius. This crate covers the whole path:
//!
//! * [`Camera`] is the high level interface. Give it an I²C bus implementing the
//!   [`embedded-hal`][eh] blocking traits, detect the device, load its calibration, and pull
//!   temperature frames out.
//! * [`CalibrationData`] parses the 832-word EEPROM block into the constants the compensation
//!   process needs, and can be built separately if you want to cache calibration data
//!   off-device.
//! * [`compensate`][compensation::compensate] turns raw subpage frames into temperatures, and
//!   is usable on its own for offline processing of captured data.
//!
//! A minimal capture loop looks like this:
//!
//! ```ignore
//! let mut camera = Camera::new(i2c_bus, 0x33);
//! camera.detect()?;
//! camera.load_calibration()?;
//! // The temperature reflected by the scene and the emissivity of the subject are scene
//! // properties, so the caller supplies them. Assuming the scene reflects the ambient
//! // temperature is a common fallback.
//! let frame = camera.next_frame(23.0, 0.95)?;
//! let center = frame.pixel(mlx90640::HEIGHT / 2, mlx90640::WIDTH / 2);
//! ```
//!
//! The two subpages of a frame are captured separately; which half of the pixels each subpage
//! covers depends on the configured [`AccessPattern`]. The chess pattern is the default, and
//! the only one the manufacturer recommends for this camera.
//!
//! This crate is `no_std` compatible. The `std` feature (enabled by default) is only needed
//! for the `std::error::Error` implementations; with `default-features = false`, enable the
//! `libm` feature to provide the floating point operations the compensation process needs.
//!
//! [eh]: https://docs.rs/embedded-hal/0.2/embedded_hal/

#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("Either the \"std\" or \"libm\" feature must be enabled");

pub mod address;
mod bus;
pub mod calibration;
pub mod camera;
pub mod compensation;
pub mod error;
pub mod frame;
mod layout;
pub mod pattern;
pub mod register;
#[cfg(test)]
mod test;
mod util;

pub use calibration::CalibrationData;
pub use camera::{Camera, SubpageMode};
pub use compensation::{compensate, CompensationParams, TemperatureFrame};
pub use error::{Error, LibraryError};
pub use frame::RawFrame;
pub use pattern::AccessPattern;
pub use register::{ControlRegister, RefreshRate, Resolution, StatusRegister, Subpage};

/// The width of the image, in pixels.
pub const WIDTH: usize = 32;

/// The height of the image, in pixels.
pub const HEIGHT: usize = 24;

/// The total number of pixels an MLX90640 has.
pub const NUM_PIXELS: usize = WIDTH * HEIGHT;
