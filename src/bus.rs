// SPDX-License-Identifier: Apache-2.0
//! Low level I²C access to the camera's memory map.
//!
//! All transfers are big-endian 16-bit words. A read is a combined write-read transaction:
//! the two address bytes are written, then the data is clocked out. A write sends the address
//! bytes followed by the new value in a single transaction.
//!
//! Only the three configuration registers accept writes; everything else is rejected here
//! before any traffic is put on the bus.
use embedded_hal::blocking::i2c;

use crate::address::{Address, RegisterAddress};
use crate::error::{Error, LibraryError};
use crate::register::Register;

/// Read a contiguous run of memory, starting at `start`.
///
/// The length of the read is `dest.len() / 2` words.
pub(crate) fn read_bytes<I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    start: Address,
    dest: &mut [u8],
) -> Result<(), Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    bus.write_read(i2c_address, &start.as_bytes(), dest)
        .map_err(Error::I2cWriteReadError)
}

/// Read a single 16-bit word.
pub(crate) fn read_word<I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    address: Address,
) -> Result<u16, Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    let mut scratch = [0u8; 2];
    read_bytes(bus, i2c_address, address, &mut scratch)?;
    Ok(u16::from_be_bytes(scratch))
}

/// Read a single word, reinterpreted as a two's complement signed integer.
pub(crate) fn read_signed_word<I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    address: Address,
) -> Result<i16, Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    Ok(read_word(bus, i2c_address, address)? as i16)
}

/// Read and unpack one of the configuration registers.
pub(crate) fn read_register<R, I2C>(bus: &mut I2C, i2c_address: u8) -> Result<R, Error<I2C>>
where
    R: Register,
    I2C: i2c::WriteRead + i2c::Write,
{
    Ok(R::from(read_word(bus, i2c_address, R::address())?))
}

/// Write a raw word to one of the writable registers.
///
/// Writes anywhere else fail with [`LibraryError::ReadOnlyViolation`] without generating any
/// bus traffic. Writing calibration EEPROM is possible on real hardware but destructive, so
/// this library never does it.
pub(crate) fn write_word<I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    address: Address,
    value: u16,
) -> Result<(), Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    if !is_writable(address) {
        return Err(LibraryError::ReadOnlyViolation(address).into());
    }
    let address_bytes = address.as_bytes();
    let value_bytes = value.to_be_bytes();
    let combined = [
        address_bytes[0],
        address_bytes[1],
        value_bytes[0],
        value_bytes[1],
    ];
    bus.write(i2c_address, &combined)
        .map_err(Error::I2cWriteError)
}

/// Update one of the configuration registers, preserving bits outside its write mask.
///
/// The camera's registers mix writable fields with reserved bits, so updates are a
/// read-modify-write of the current value under [`Register::write_mask`].
pub(crate) fn update_register<R, I2C>(
    bus: &mut I2C,
    i2c_address: u8,
    register: R,
) -> Result<(), Error<I2C>>
where
    R: Register,
    I2C: i2c::WriteRead + i2c::Write,
{
    let current = read_word(bus, i2c_address, R::address())?;
    let mask = R::write_mask();
    let new_value: u16 = register.into();
    write_word(
        bus,
        i2c_address,
        R::address(),
        (current & !mask) | (new_value & mask),
    )
}

/// Check whether a camera is responding at the given bus address.
///
/// A device that does not acknowledge the probe read is reported as absent; at this level a
/// missing device and a broken bus are indistinguishable.
pub(crate) fn probe<I2C>(bus: &mut I2C, i2c_address: u8) -> bool
where
    I2C: i2c::WriteRead + i2c::Write,
{
    let mut scratch = [0u8; 2];
    let address: Address = RegisterAddress::Control.into();
    bus.write_read(i2c_address, &address.as_bytes(), &mut scratch)
        .is_ok()
}

/// Whether the controller is allowed to write to an address.
pub(crate) fn is_writable(address: Address) -> bool {
    let raw: u16 = address.into();
    raw == u16::from(RegisterAddress::Status)
        || raw == u16::from(RegisterAddress::Control)
        || raw == u16::from(RegisterAddress::I2cConfig)
}
