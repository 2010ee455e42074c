use core::str::FromStr;

use crate::address::AddressWidth;

/// Everything that can be wrong with a device description
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// The chip only understands 2 or 3 address bytes
    UnsupportedAddressWidth(u8),

    /// The size is zero or cannot be reached with the address width
    ExceedsAddressWidth { size: u32, width: AddressWidth },

    /// No known chip has this model name
    UnknownVariant,
}

/// Size and addressing of one chip, fixed for the lifetime of a driver instance
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    size: u32,
    address_width: AddressWidth,
}

impl Geometry {
    const fn known(size: u32, address_width: AddressWidth) -> Self {
        Self {
            size,
            address_width,
        }
    }

    /// Describe a chip that is not part of [`Variant`].
    pub fn custom(size: u32, address_bytes: u8) -> Result<Self, GeometryError> {
        let address_width = AddressWidth::try_from(address_bytes)?;
        if size == 0 || size > address_width.max_size() {
            return Err(GeometryError::ExceedsAddressWidth {
                size,
                width: address_width,
            });
        }
        Ok(Self {
            size,
            address_width,
        })
    }

    /// Total size in bytes
    pub const fn size(&self) -> u32 {
        self.size
    }

    pub const fn address_width(&self) -> AddressWidth {
        self.address_width
    }
}

/// The supported MR25H parts
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// 4Mb, 512kB
    Mr25h40,
    /// 1Mb, 128kB
    Mr25h10,
    /// 256Kb, 32kB
    Mr25h256,
    /// 128Kb, 16kB
    Mr25h128,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Mr25h40,
        Variant::Mr25h10,
        Variant::Mr25h256,
        Variant::Mr25h128,
    ];

    /// Model name used to select the part, like a device tree `compatible` string
    pub const fn compatible(&self) -> &'static str {
        match self {
            Variant::Mr25h40 => "mr25h40",
            Variant::Mr25h10 => "mr25h10",
            Variant::Mr25h256 => "mr25h256",
            Variant::Mr25h128 => "mr25h128",
        }
    }

    pub const fn geometry(&self) -> Geometry {
        match self {
            Variant::Mr25h40 => Geometry::known(0x80000, AddressWidth::ThreeByte),
            Variant::Mr25h10 => Geometry::known(0x20000, AddressWidth::ThreeByte),
            Variant::Mr25h256 => Geometry::known(0x8000, AddressWidth::TwoByte),
            Variant::Mr25h128 => Geometry::known(0x4000, AddressWidth::TwoByte),
        }
    }
}

impl FromStr for Variant {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.compatible() == s)
            .ok_or(GeometryError::UnknownVariant)
    }
}

impl From<Variant> for Geometry {
    fn from(variant: Variant) -> Geometry {
        variant.geometry()
    }
}

/// Name the registry entry is published under when none is configured
pub const DEFAULT_NAME: &str = "mram0";

/// Advertised write buffer size, the chip itself has no write buffer
pub const DEFAULT_WRITE_BUFFER_SIZE: u32 = 265;

/// Per instance registry settings
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub name: &'static str,
    pub write_buffer_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
        }
    }
}

impl Config {
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}
