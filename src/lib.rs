#![no_std]
//! This is a platform agnostic library for the Everspin MR25H serial MRAM series using [embedded-hal](https://github.com/rust-embedded/embedded-hal).
//!
//! Multiple chips are supported:
//! * [MR25H40](https://www.everspin.com/getdatasheet/MR25H40), 512kB, 3 address bytes
//! * [MR25H10](https://www.everspin.com/getdatasheet/MR25H10), 128kB, 3 address bytes
//! * [MR25H256](https://www.everspin.com/getdatasheet/MR25H256), 32kB, 2 address bytes
//! * [MR25H128](https://www.everspin.com/getdatasheet/MR25H128A), 16kB, 2 address bytes
//!
//! MRAM is written byte by byte without any erase cycle. The storage traits still need an
//! erase, so erasing is emulated by writing zeros, see [`blocking::MR25H::zero_fill`].
//! Unlike NOR flash, an "erased" range therefore reads back as `0x00`, not `0xFF`.
//!
//! The driver talks to the chip through a [`transport::CommandTransport`], which is
//! implemented for an exclusive [`embedded_hal::spi::SpiBus`] plus chip select pin by
//! [`transport::SpiTransport`].

pub mod address;
pub mod asynchronous;
pub mod blocking;
mod command;
pub mod error;
pub mod geometry;
pub mod register;
pub mod registry;
pub mod transport;

use crate::error::{Access, Error};

pub use crate::geometry::{Config, Geometry, Variant};

/// Smallest readable unit
pub const READ_SIZE: usize = 1;
/// Smallest writable unit
pub const WRITE_SIZE: usize = 1;
/// Smallest unit that can be zero filled
pub const ERASE_SIZE: usize = 1;

/// Size of the zero block streamed out while zero filling
const ZERO_BLOCK: usize = 64;

pub(crate) fn check_bounds<E>(capacity: u32, offset: u32, length: usize) -> Result<(), Error<E>> {
    if length > capacity as usize || offset > capacity - length as u32 {
        return Err(Error::OutOfBounds);
    }
    Ok(())
}

/// Context attached to bus errors
#[derive(Debug, Clone, Copy)]
pub(crate) struct Request {
    access: Access,
    offset: u32,
    len: usize,
}

impl Request {
    pub(crate) fn new(access: Access, offset: u32, len: usize) -> Self {
        Self {
            access,
            offset,
            len,
        }
    }

    pub(crate) fn control(len: usize) -> Self {
        Self::new(Access::Control, 0, len)
    }

    pub(crate) fn fail<E>(self, source: E) -> Error<E> {
        #[cfg(feature = "defmt")]
        defmt::error!(
            "{:?} of {=usize} bytes at {=u32} failed",
            self.access,
            self.len,
            self.offset
        );
        Error::Transfer {
            access: self.access,
            offset: self.offset,
            len: self.len,
            source,
        }
    }
}
