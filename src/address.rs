use crate::geometry::GeometryError;

/// Number of address bytes the chip expects after an opcode
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressWidth {
    /// 16-bit address, up to 64kB
    TwoByte,
    /// 24-bit address, up to 16MB
    ThreeByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> usize {
        match self {
            AddressWidth::TwoByte => 2,
            AddressWidth::ThreeByte => 3,
        }
    }

    /// Returns the number of bits clocked out for the address phase
    pub const fn bits(&self) -> usize {
        self.bytes() * 8
    }

    /// Returns the largest memory size this width can address
    pub const fn max_size(&self) -> u32 {
        match self {
            AddressWidth::TwoByte => 0x1_0000,
            AddressWidth::ThreeByte => 0x100_0000,
        }
    }
}

impl TryFrom<u8> for AddressWidth {
    type Error = GeometryError;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        match bytes {
            2 => Ok(AddressWidth::TwoByte),
            3 => Ok(AddressWidth::ThreeByte),
            other => Err(GeometryError::UnsupportedAddressWidth(other)),
        }
    }
}

impl From<AddressWidth> for u8 {
    fn from(width: AddressWidth) -> u8 {
        width.bytes() as u8
    }
}

/// An offset encoded as the big endian address sent after a command
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressBytes {
    bytes: [u8; 3],
    width: AddressWidth,
}

impl AddressBytes {
    /// Encode `offset`, bits above the address width are dropped.
    pub fn encode(offset: u32, width: AddressWidth) -> Self {
        let bytes = match width {
            AddressWidth::ThreeByte => [(offset >> 16) as u8, (offset >> 8) as u8, offset as u8],
            AddressWidth::TwoByte => [(offset >> 8) as u8, offset as u8, 0],
        };
        Self { bytes, width }
    }

    /// The address bytes, most significant first
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.width.bytes()]
    }

    pub fn width(&self) -> AddressWidth {
        self.width
    }

    /// Bit length of the address phase
    pub fn bits(&self) -> usize {
        self.width.bits()
    }
}

impl AsRef<[u8]> for AddressBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_byte_is_big_endian() {
        let addr = AddressBytes::encode(0x010203, AddressWidth::ThreeByte);
        assert_eq!(addr.as_slice(), &[0x01, 0x02, 0x03]);
        assert_eq!(addr.bits(), 24);
    }

    #[test]
    fn two_byte_drops_upper_bits() {
        let addr = AddressBytes::encode(0x1234, AddressWidth::TwoByte);
        assert_eq!(addr.as_slice(), &[0x12, 0x34]);
        assert_eq!(addr.bits(), 16);

        let addr = AddressBytes::encode(0xAB_1234, AddressWidth::TwoByte);
        assert_eq!(addr.as_slice(), &[0x12, 0x34]);
    }

    #[test]
    fn width_from_raw_byte_count() {
        assert_eq!(AddressWidth::try_from(2), Ok(AddressWidth::TwoByte));
        assert_eq!(AddressWidth::try_from(3), Ok(AddressWidth::ThreeByte));
        assert_eq!(
            AddressWidth::try_from(4),
            Err(GeometryError::UnsupportedAddressWidth(4))
        );
        assert_eq!(u8::from(AddressWidth::ThreeByte), 3);
    }
}
