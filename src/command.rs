/// MR25H instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Set the write enable latch, required before every write
    WriteEnable = 0x06,
    WriteDisable = 0x04,
    ReadStatus = 0x05,
    WriteStatus = 0x01,
    Read = 0x03,
    Write = 0x02,
    /// Enter the low power sleep mode
    Sleep = 0xB9,
    /// Exit the sleep mode
    Wake = 0xAB,
}

