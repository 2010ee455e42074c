use crate::{geometry::GeometryError, registry::RegistryError};

/// The request that was running when a bus transfer failed
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ZeroFill,
    /// Status register or power commands
    Control,
}

/// All possible errors emitted by the driver
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<BusError> {
    /// The bus could not be claimed when binding the device
    BusClaim(BusError),

    /// A bus phase failed, no further phase of the request was issued
    Transfer {
        access: Access,
        offset: u32,
        len: usize,
        source: BusError,
    },

    /// Invalid device description
    Geometry(GeometryError),

    /// Request outside of the memory array
    OutOfBounds,

    /// The storage registry refused the request
    Registry(RegistryError),
}

impl<E> From<GeometryError> for Error<E> {
    fn from(e: GeometryError) -> Self {
        Error::Geometry(e)
    }
}

impl<E> From<RegistryError> for Error<E> {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

mod es {
    use super::*;
    use core::fmt::Debug;
    use embedded_storage::nor_flash::{NorFlashError, NorFlashErrorKind};

    impl<E> NorFlashError for Error<E>
    where
        E: Debug,
    {
        fn kind(&self) -> NorFlashErrorKind {
            match self {
                Error::OutOfBounds => NorFlashErrorKind::OutOfBounds,
                Error::BusClaim(_) => NorFlashErrorKind::Other,
                Error::Transfer { .. } => NorFlashErrorKind::Other,
                Error::Geometry(_) => NorFlashErrorKind::Other,
                Error::Registry(_) => NorFlashErrorKind::Other,
            }
        }
    }
}
