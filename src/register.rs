use bit::BitIndex;

/// Area of the array that rejects writes
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BlockProtect {
    #[default]
    None,
    UpperQuarter,
    UpperHalf,
    All,
}

impl From<u8> for BlockProtect {
    fn from(val: u8) -> Self {
        match val & 0b11 {
            0b00 => BlockProtect::None,
            0b01 => BlockProtect::UpperQuarter,
            0b10 => BlockProtect::UpperHalf,
            _ => BlockProtect::All,
        }
    }
}

impl From<BlockProtect> for u8 {
    fn from(val: BlockProtect) -> Self {
        match val {
            BlockProtect::None => 0b00,
            BlockProtect::UpperQuarter => 0b01,
            BlockProtect::UpperHalf => 0b10,
            BlockProtect::All => 0b11,
        }
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegister {
    /// Locks the register while the WP pin is low
    pub status_register_write_disable: bool,
    pub block_protect: BlockProtect,
    /// Read only, cleared by the chip after every write
    pub write_enable_latch: bool,
}

impl From<u8> for StatusRegister {
    fn from(val: u8) -> StatusRegister {
        StatusRegister {
            status_register_write_disable: val.bit(7),
            block_protect: val.bit_range(2..4).into(),
            write_enable_latch: val.bit(1),
        }
    }
}

impl From<StatusRegister> for u8 {
    fn from(status: StatusRegister) -> u8 {
        let mut val = 0u8;
        val.set_bit(7, status.status_register_write_disable);
        val.set_bit_range(2..4, status.block_protect.into());
        val
    }
}
