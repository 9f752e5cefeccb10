// SPDX-License-Identifier: Apache-2.0
//! The high level camera interface.
use embedded_hal::blocking::i2c;

use crate::bus;
use crate::calibration::CalibrationData;
use crate::compensation::{compensate, CompensationParams, TemperatureFrame};
use crate::error::{Error, LibraryError};
use crate::frame::{self, RawFrame, DEFAULT_POLL_LIMIT};
use crate::pattern::AccessPattern;
use crate::register::{ControlRegister, RefreshRate, Resolution, Subpage};

/// How the camera cycles through its subpages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubpageMode {
    /// Alternate between the two subpages, updating the full array every two measurements.
    ///
    /// This is the camera's default, and the mode most applications want.
    Alternating,

    /// Measure the same subpage over and over.
    ///
    /// Only the pixels of the chosen subpage are ever refreshed; the other half of a
    /// [`TemperatureFrame`] is computed from the last data the camera happened to leave in
    /// RAM. Useful for halving the bus traffic when a full resolution image isn't needed.
    Repeat(Subpage),
}

/// Where a [`Camera`] is in its setup sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum State {
    /// Nothing has been confirmed about the device yet.
    Uninitialized,

    /// The device acknowledged its bus address.
    Detected,

    /// The calibration EEPROM has been read and parsed.
    CalibrationLoaded,

    /// At least one temperature frame has been produced.
    Streaming,
}

/// An MLX90640 camera on an I²C bus.
///
/// The camera has to be walked through a short setup sequence before it produces
/// temperatures: [`detect`][Self::detect] confirms a device is present, then
/// [`load_calibration`][Self::load_calibration] pulls the device's factory calibration out of
/// its EEPROM. After that, [`next_frame`][Self::next_frame] can be called in a loop. The
/// methods enforce this ordering themselves, so a skipped step surfaces as an error rather
/// than garbage temperatures.
///
/// Creating a `Camera` performs no bus traffic at all. Nothing on the device is modified
/// until one of the configuration setters is used; a freshly detected camera keeps running
/// with whatever settings it powered up with.
#[derive(Debug)]
pub struct Camera<I2C> {
    bus: I2C,
    i2c_address: u8,
    state: State,
    calibration: Option<CalibrationData>,
    /// Cached copy of the access pattern bit in the control register.
    access_pattern: AccessPattern,
    subpage_mode: SubpageMode,
    poll_limit: usize,
    /// Correction factor between the calibrated ADC resolution and the configured one.
    resolution_correction: f32,
    /// The ambient temperature computed with the most recent frame.
    ambient_temperature: Option<f32>,
}

impl<I2C> Camera<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    /// Create a camera for the device at the given 7-bit I²C address.
    ///
    /// The default address for the MLX90640 is 0x33.
    pub fn new(bus: I2C, i2c_address: u8) -> Self {
        Self {
            bus,
            i2c_address,
            state: State::Uninitialized,
            calibration: None,
            access_pattern: AccessPattern::Chess,
            subpage_mode: SubpageMode::Alternating,
            poll_limit: DEFAULT_POLL_LIMIT,
            resolution_correction: 1f32,
            ambient_temperature: None,
        }
    }

    /// Consume the camera, returning the I²C bus it was using.
    pub fn free(self) -> I2C {
        self.bus
    }

    /// The I²C address this camera was created with.
    pub fn i2c_address(&self) -> u8 {
        self.i2c_address
    }

    /// Where this camera is in its setup sequence.
    pub fn state(&self) -> State {
        self.state
    }

    /// The calibration data, if it has been loaded.
    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.calibration.as_ref()
    }

    /// The access pattern the camera is splitting subpages by.
    pub fn access_pattern(&self) -> AccessPattern {
        self.access_pattern
    }

    /// How the camera is cycling through its subpages.
    pub fn subpage_mode(&self) -> SubpageMode {
        self.subpage_mode
    }

    /// The ambient (die) temperature computed with the most recent frame, in degrees
    /// Celsius.
    ///
    /// `None` until the first frame has been produced.
    pub fn ambient_temperature(&self) -> Option<f32> {
        self.ambient_temperature
    }

    /// Change how many times a capture polls for new data before giving up.
    ///
    /// The default ([`DEFAULT_POLL_LIMIT`]) is generous; lower it if the application would
    /// rather get [`LibraryError::DataNotAvailable`] back quickly and do something else.
    pub fn set_poll_limit(&mut self, poll_limit: usize) {
        self.poll_limit = poll_limit;
    }

    /// Confirm that a camera is present and responding.
    ///
    /// Also reads the control register to pick up whatever configuration the device is
    /// already running with.
    pub fn detect(&mut self) -> Result<(), Error<I2C>> {
        if !bus::probe(&mut self.bus, self.i2c_address) {
            return Err(LibraryError::CameraDetect {
                i2c_address: self.i2c_address,
            }
            .into());
        }
        let control: ControlRegister = bus::read_register(&mut self.bus, self.i2c_address)?;
        self.access_pattern = control.access_pattern;
        if self.state == State::Uninitialized {
            self.state = State::Detected;
        }
        Ok(())
    }

    /// Read and parse the camera's calibration EEPROM.
    ///
    /// The EEPROM contents never change, so calling this again after a successful load does
    /// nothing. [`detect`][Self::detect] has to succeed first.
    pub fn load_calibration(&mut self) -> Result<(), Error<I2C>> {
        if self.state == State::Uninitialized {
            return Err(LibraryError::CameraDetect {
                i2c_address: self.i2c_address,
            }
            .into());
        }
        if self.calibration.is_some() {
            return Ok(());
        }
        let mut eeprom = [0u8; CalibrationData::EEPROM_WORDS * 2];
        bus::read_bytes(
            &mut self.bus,
            self.i2c_address,
            crate::address::EepromAddress::Base.into(),
            &mut eeprom,
        )?;
        let calibration = CalibrationData::from_bytes(&eeprom)?;
        let control: ControlRegister = bus::read_register(&mut self.bus, self.i2c_address)?;
        self.resolution_correction = calibration.resolution_correction(control.resolution);
        self.access_pattern = control.access_pattern;
        self.calibration = Some(calibration);
        self.state = State::CalibrationLoaded;
        Ok(())
    }

    /// Capture and compensate a full frame of temperatures.
    ///
    /// This blocks for two measurements (a full subpage cycle). `reflected_temperature` and
    /// `emissivity` describe the scene; see [`CompensationParams`] for what they mean. If a
    /// capture fails partway (the camera fell out of step, or no data arrived in time) the
    /// error is returned and the next call starts a fresh cycle.
    pub fn next_frame(
        &mut self,
        reflected_temperature: f32,
        emissivity: f32,
    ) -> Result<TemperatureFrame, Error<I2C>> {
        let calibration = self
            .calibration
            .as_ref()
            .ok_or(LibraryError::CalibrationNotLoaded)?;
        let (first, second) = match self.subpage_mode {
            SubpageMode::Alternating => (Subpage::Zero, Subpage::One),
            SubpageMode::Repeat(subpage) => (subpage, subpage),
        };
        let older = frame::capture(&mut self.bus, self.i2c_address, first, self.poll_limit)?;
        let newer = frame::capture(&mut self.bus, self.i2c_address, second, self.poll_limit)?;
        let params = CompensationParams {
            reflected_temperature,
            emissivity,
            resolution_correction: self.resolution_correction,
        };
        let result = compensate(
            calibration,
            self.access_pattern,
            [&older, &newer],
            &params,
        );
        self.ambient_temperature = Some(result.ambient_temperature());
        self.state = State::Streaming;
        Ok(result)
    }

    /// Capture the raw data of a single subpage, without compensating it.
    ///
    /// For applications that want to run the compensation process somewhere else (or not at
    /// all); [`compensate`] accepts the captured frames directly.
    pub fn raw_frame(&mut self, subpage: Subpage) -> Result<RawFrame, Error<I2C>> {
        frame::capture(&mut self.bus, self.i2c_address, subpage, self.poll_limit)
    }

    /// Change how often the camera takes measurements.
    pub fn set_refresh_rate(&mut self, refresh_rate: RefreshRate) -> Result<(), Error<I2C>> {
        self.update_control(|control| control.refresh_rate = refresh_rate)?;
        Ok(())
    }

    /// Change the resolution of the camera's ADC.
    ///
    /// Raw measurements scale with the ADC resolution; the compensation process corrects for
    /// the difference from the calibrated resolution automatically.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<I2C>> {
        self.update_control(|control| control.resolution = resolution)?;
        Ok(())
    }

    /// Change which access pattern the camera splits subpages by.
    ///
    /// The manufacturer only recommends the chess pattern for this camera; the interleaved
    /// pattern carries a small accuracy penalty.
    pub fn set_access_pattern(&mut self, pattern: AccessPattern) -> Result<(), Error<I2C>> {
        self.update_control(|control| control.access_pattern = pattern)?;
        self.access_pattern = pattern;
        Ok(())
    }

    /// Change how the camera cycles through its subpages.
    pub fn set_subpage_mode(&mut self, mode: SubpageMode) -> Result<(), Error<I2C>> {
        self.update_control(|control| match mode {
            SubpageMode::Alternating => {
                control.use_subpages = true;
                control.subpage_repeat = false;
            }
            SubpageMode::Repeat(subpage) => {
                control.use_subpages = true;
                control.subpage_repeat = true;
                control.subpage = subpage;
            }
        })?;
        self.subpage_mode = mode;
        Ok(())
    }

    /// Read the control register, apply a change, and write it back.
    ///
    /// The resolution correction factor is recomputed from whatever resolution ends up in
    /// the register.
    fn update_control<F>(&mut self, apply: F) -> Result<ControlRegister, Error<I2C>>
    where
        F: FnOnce(&mut ControlRegister),
    {
        let mut control: ControlRegister = bus::read_register(&mut self.bus, self.i2c_address)?;
        apply(&mut control);
        bus::update_register(&mut self.bus, self.i2c_address, control)?;
        if let Some(calibration) = &self.calibration {
            self.resolution_correction = calibration.resolution_correction(control.resolution);
        }
        Ok(control)
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::test::mock_camera;
    use crate::{HEIGHT, WIDTH};

    #[test]
    fn new_performs_no_bus_traffic() {
        let camera = Camera::new(mock_camera(), 0x33);
        assert_eq!(camera.state(), State::Uninitialized);
        let bus = camera.free();
        assert!(bus.register_writes().is_empty());
    }

    #[test]
    fn detect_reports_missing_cameras() {
        let mut bus = mock_camera();
        bus.set_responding(false);
        let mut camera = Camera::new(bus, 0x33);
        assert_eq!(
            camera.detect(),
            Err(LibraryError::CameraDetect { i2c_address: 0x33 }.into())
        );
        assert_eq!(camera.state(), State::Uninitialized);
    }

    #[test]
    fn calibration_requires_detection() {
        let mut camera = Camera::new(mock_camera(), 0x33);
        assert_eq!(
            camera.load_calibration(),
            Err(LibraryError::CameraDetect { i2c_address: 0x33 }.into())
        );
    }

    #[test]
    fn frames_require_calibration() {
        let mut camera = Camera::new(mock_camera(), 0x33);
        camera.detect().unwrap();
        assert_eq!(camera.state(), State::Detected);
        assert_eq!(
            camera.next_frame(23.0, 1.0),
            Err(LibraryError::CalibrationNotLoaded.into())
        );
    }

    #[test]
    fn full_setup_sequence() {
        let mut bus = mock_camera();
        bus.fill_pixels(609);
        bus.set_analog_measurements(19442, 6273, 1711, -13115);
        let mut camera = Camera::new(bus, 0x33);
        camera.detect().unwrap();
        camera.load_calibration().unwrap();
        assert_eq!(camera.state(), State::CalibrationLoaded);
        assert!(camera.calibration().is_some());

        assert_eq!(camera.ambient_temperature(), None);
        let frame = camera.next_frame(31.18440152, 1.0).unwrap();
        assert_eq!(camera.state(), State::Streaming);
        assert_approx_eq!(f32, frame.ambient_temperature(), 39.1844, epsilon = 0.01);
        assert_eq!(camera.ambient_temperature(), Some(frame.ambient_temperature()));
        // With every pixel reading the same raw value the example pixel should land in the
        // same ballpark as the datasheet's worked example.
        let example = frame.pixel(11, 15);
        assert!(
            (65.0..=85.0).contains(&example),
            "pixel (11, 15) was {}",
            example
        );
        assert!(frame.pixels().iter().all(|pixel| pixel.is_finite()));
    }

    #[test]
    fn repeated_calibration_loads_are_free() {
        let mut camera = Camera::new(mock_camera(), 0x33);
        camera.detect().unwrap();
        camera.load_calibration().unwrap();
        let first = camera.calibration().unwrap().clone();
        camera.load_calibration().unwrap();
        assert_eq!(camera.calibration().unwrap(), &first);
    }

    #[test]
    fn out_of_sync_captures_do_not_reach_streaming() {
        let mut bus = mock_camera();
        bus.set_last_subpage(Subpage::One);
        let mut camera = Camera::new(bus, 0x33);
        camera.detect().unwrap();
        camera.load_calibration().unwrap();
        let result = camera.next_frame(23.0, 1.0);
        assert_eq!(
            result,
            Err(LibraryError::SubpageOutOfSync {
                expected: Subpage::Zero,
                actual: Subpage::One,
            }
            .into())
        );
        assert_eq!(camera.state(), State::CalibrationLoaded);
    }

    #[test]
    fn poll_limit_is_adjustable() {
        let mut bus = mock_camera();
        bus.set_data_available(false);
        let mut camera = Camera::new(bus, 0x33);
        camera.detect().unwrap();
        camera.load_calibration().unwrap();
        camera.set_poll_limit(3);
        assert_eq!(
            camera.next_frame(23.0, 1.0),
            Err(LibraryError::DataNotAvailable { attempts: 3 }.into())
        );
    }

    #[test]
    fn repeat_mode_captures_one_subpage() {
        let mut bus = mock_camera();
        bus.fill_pixels(609);
        bus.set_analog_measurements(19442, 6273, 1711, -13115);
        let mut camera = Camera::new(bus, 0x33);
        camera.detect().unwrap();
        camera.load_calibration().unwrap();
        camera
            .set_subpage_mode(SubpageMode::Repeat(Subpage::One))
            .unwrap();
        assert_eq!(camera.subpage_mode(), SubpageMode::Repeat(Subpage::One));
        let frame = camera.next_frame(23.0, 1.0).unwrap();
        assert_eq!(frame.pixels().len(), WIDTH * HEIGHT);
    }

    #[test]
    fn configuration_setters_write_the_control_register() {
        let mut bus = mock_camera();
        bus.set_control(0x1901);
        let mut camera = Camera::new(bus, 0x33);
        camera.detect().unwrap();
        camera.set_refresh_rate(RefreshRate::Eight).unwrap();
        camera.set_resolution(Resolution::Sixteen).unwrap();
        camera
            .set_access_pattern(AccessPattern::Interleaved)
            .unwrap();
        let bus = camera.free();
        let control = ControlRegister::from(bus.control());
        assert_eq!(control.refresh_rate, RefreshRate::Eight);
        assert_eq!(control.resolution, Resolution::Sixteen);
        assert_eq!(control.access_pattern, AccessPattern::Interleaved);
    }

    #[test]
    fn raw_frames_pass_data_through() {
        let mut bus = mock_camera();
        bus.fill_pixels(-42);
        let mut camera = Camera::new(bus, 0x33);
        camera.detect().unwrap();
        let raw = camera.raw_frame(Subpage::Zero).unwrap();
        assert!(raw.pixels().iter().all(|&pixel| pixel == -42));
    }
}
