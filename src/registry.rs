//! Boundary to the generic storage device catalog.
//!
//! The catalog itself is provided by the host environment, the driver only describes
//! itself through a [`RegistryEntry`]. The read/write/erase/sync entry points are the
//! `embedded-storage` trait implementations of the driver.

use bit::BitIndex;

use crate::geometry::{Config, Geometry};

/// Errors reported by a [`DeviceRegistry`]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// An entry with the same name already exists
    AlreadyRegistered,
    /// No entry with this name exists
    NotRegistered,
    /// The registry cannot take more entries
    Full,
    /// The entry is still in use and cannot be removed
    Busy,
}

/// Kind of memory behind an entry
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Ram,
    NorFlash,
    NandFlash,
}

/// Capability flags of an entry
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(pub u8);

impl Capabilities {
    const WRITEABLE: usize = 0;
    const BIT_WRITEABLE: usize = 1;
    const NO_ERASE: usize = 2;

    /// Writeable, bits can be flipped both ways, no erase needed before writing
    pub fn ram() -> Self {
        let mut flags = 0u8;
        flags.set_bit(Self::WRITEABLE, true);
        flags.set_bit(Self::BIT_WRITEABLE, true);
        flags.set_bit(Self::NO_ERASE, true);
        Capabilities(flags)
    }

    pub fn writeable(&self) -> bool {
        self.0.bit(Self::WRITEABLE)
    }

    pub fn bit_writeable(&self) -> bool {
        self.0.bit(Self::BIT_WRITEABLE)
    }

    pub fn no_erase(&self) -> bool {
        self.0.bit(Self::NO_ERASE)
    }
}

/// Description of a device published to the registry
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: &'static str,
    pub class: DeviceClass,
    pub flags: Capabilities,
    /// Total size in bytes
    pub size: u32,
    pub write_size: u32,
    pub write_buffer_size: u32,
    pub erase_size: u32,
    pub erase_regions: u32,
}

impl RegistryEntry {
    /// Entry for a byte writeable, RAM like memory
    pub fn ram(geometry: &Geometry, config: &Config) -> Self {
        Self {
            name: config.name,
            class: DeviceClass::Ram,
            flags: Capabilities::ram(),
            size: geometry.size(),
            write_size: 1,
            write_buffer_size: config.write_buffer_size,
            erase_size: 1,
            erase_regions: 0,
        }
    }
}

/// The catalog of storage devices a driver publishes itself into
pub trait DeviceRegistry {
    fn register(&mut self, entry: &RegistryEntry) -> Result<(), RegistryError>;

    fn unregister(&mut self, entry: &RegistryEntry) -> Result<(), RegistryError>;
}

impl<R: DeviceRegistry + ?Sized> DeviceRegistry for &mut R {
    fn register(&mut self, entry: &RegistryEntry) -> Result<(), RegistryError> {
        (**self).register(entry)
    }

    fn unregister(&mut self, entry: &RegistryEntry) -> Result<(), RegistryError> {
        (**self).unregister(entry)
    }
}

/// Where a driver stands with its registry entry
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Unregistered,
    Registered,
    /// Removing the entry failed. The registry still holds it but the driver no
    /// longer serves it.
    Defunct,
}

/// Registry bookkeeping owned by each driver instance
#[derive(Debug)]
pub(crate) struct Registration {
    entry: RegistryEntry,
    state: RegistrationState,
}

impl Registration {
    pub(crate) fn new(entry: RegistryEntry) -> Self {
        Self {
            entry,
            state: RegistrationState::Unregistered,
        }
    }

    pub(crate) fn entry(&self) -> &RegistryEntry {
        &self.entry
    }

    pub(crate) fn state(&self) -> RegistrationState {
        self.state
    }

    /// Publish the entry, dropping a stale one first.
    pub(crate) fn register<R: DeviceRegistry>(
        &mut self,
        registry: &mut R,
    ) -> Result<(), RegistryError> {
        if self.state != RegistrationState::Unregistered {
            registry.unregister(&self.entry)?;
            self.state = RegistrationState::Unregistered;
        }

        registry.register(&self.entry)?;
        self.state = RegistrationState::Registered;
        #[cfg(feature = "defmt")]
        defmt::debug!("Registered {=str}, {=u32} bytes", self.entry.name, self.entry.size);
        Ok(())
    }

    /// Remove the entry. On failure the driver detaches from it and the entry stays defunct.
    pub(crate) fn unregister<R: DeviceRegistry>(
        &mut self,
        registry: &mut R,
    ) -> Result<(), RegistryError> {
        if self.state == RegistrationState::Unregistered {
            return Ok(());
        }

        match registry.unregister(&self.entry) {
            Ok(()) => {
                self.state = RegistrationState::Unregistered;
                Ok(())
            }
            Err(e) => {
                self.state = RegistrationState::Defunct;
                #[cfg(feature = "defmt")]
                defmt::warn!("Failed to unregister {=str}: {:?}", self.entry.name, e);
                Err(e)
            }
        }
    }
}
