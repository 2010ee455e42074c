//! In-memory MR25H emulator and registry used by the integration tests.
#![allow(dead_code)]

use mr25h::{
    registry::{DeviceRegistry, RegistryEntry, RegistryError},
    transport::{AsyncCommandTransport, CommandTransport, Framing, Phase},
    Geometry,
};

pub const WREN: u8 = 0x06;
pub const WRDI: u8 = 0x04;
pub const RDSR: u8 = 0x05;
pub const WRSR: u8 = 0x01;
pub const READ: u8 = 0x03;
pub const WRITE: u8 = 0x02;
pub const SLEEP: u8 = 0xB9;
pub const WAKE: u8 = 0xAB;

/// Content of a fresh emulated chip, distinct from zero-filled memory
pub const FILL: u8 = 0xA5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// A phase as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Write(Vec<u8>),
    Read(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub framing: Framing,
    pub phase: Recorded,
}

impl Record {
    pub fn write(framing: Framing, bytes: &[u8]) -> Self {
        Self {
            framing,
            phase: Recorded::Write(bytes.to_vec()),
        }
    }

    pub fn read(framing: Framing, len: usize) -> Self {
        Self {
            framing,
            phase: Recorded::Read(len),
        }
    }
}

/// Behaves like an MR25H behind a chip select framed bus
pub struct Emulator {
    pub memory: Vec<u8>,
    pub log: Vec<Record>,
    /// Index of the phase that fails with [`BusFault`]
    pub fail_at: Option<usize>,
    pub fail_claim: bool,
    pub claimed: bool,
    pub released: bool,
    /// Write commands dropped because the latch was not set
    pub rejected_writes: usize,
    width: usize,
    selected: bool,
    tx: Vec<u8>,
    read_cursor: usize,
    wel: bool,
    status: u8,
    asleep: bool,
}

impl Emulator {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            memory: vec![FILL; geometry.size() as usize],
            log: Vec::new(),
            fail_at: None,
            fail_claim: false,
            claimed: false,
            released: false,
            rejected_writes: 0,
            width: geometry.address_width().bytes(),
            selected: false,
            tx: Vec::new(),
            read_cursor: 0,
            wel: false,
            status: 0,
            asleep: false,
        }
    }

    pub fn failing_at(mut self, phase: usize) -> Self {
        self.fail_at = Some(phase);
        self
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn write_enabled(&self) -> bool {
        self.wel
    }

    pub fn asleep(&self) -> bool {
        self.asleep
    }

    /// Number of phases of a given framing
    pub fn count(&self, framing: Framing) -> usize {
        self.log.iter().filter(|r| r.framing == framing).count()
    }

    /// Phases that opened a transaction with this opcode
    pub fn transactions(&self, opcode: u8) -> usize {
        self.log
            .iter()
            .filter(|r| r.framing.begins() && r.phase == Recorded::Write(vec![opcode]))
            .count()
    }

    fn address(&self) -> usize {
        self.tx[1..1 + self.width]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize)
    }

    fn serve(&mut self, rx: &mut [u8]) {
        match self.tx.first().copied() {
            Some(READ) if !self.asleep => {
                let size = self.memory.len();
                let start = self.address() + self.read_cursor;
                for (i, b) in rx.iter_mut().enumerate() {
                    *b = self.memory[(start + i) % size];
                }
                self.read_cursor += rx.len();
            }
            Some(RDSR) if !self.asleep => {
                let status = self.status | if self.wel { 0b10 } else { 0 };
                rx.fill(status);
            }
            _ => rx.fill(0xFF),
        }
    }

    fn execute(&mut self) {
        let Some(&opcode) = self.tx.first() else {
            return;
        };
        if self.asleep {
            if opcode == WAKE {
                self.asleep = false;
            }
            return;
        }
        match opcode {
            WREN => self.wel = true,
            WRDI => self.wel = false,
            SLEEP => self.asleep = true,
            WRITE => {
                if self.wel {
                    let size = self.memory.len();
                    let addr = self.address();
                    let data = self.tx[1 + self.width..].to_vec();
                    for (i, b) in data.into_iter().enumerate() {
                        self.memory[(addr + i) % size] = b;
                    }
                } else {
                    self.rejected_writes += 1;
                }
                self.wel = false;
            }
            WRSR => {
                if self.wel {
                    self.status = self.tx[1] & 0b1000_1100;
                } else {
                    self.rejected_writes += 1;
                }
                self.wel = false;
            }
            _ => {}
        }
    }

    fn run(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), BusFault> {
        let index = self.log.len();
        self.log.push(match &phase {
            Phase::Write(tx) => Record::write(framing, tx),
            Phase::Read(rx) => Record::read(framing, rx.len()),
        });

        if self.fail_at == Some(index) {
            self.selected = false;
            self.tx.clear();
            return Err(BusFault);
        }

        if framing.begins() {
            assert!(!self.selected, "chip select asserted twice");
            self.selected = true;
            self.tx.clear();
            self.read_cursor = 0;
        }
        assert!(self.selected, "phase outside of a transaction");

        match phase {
            Phase::Write(tx) => self.tx.extend_from_slice(tx),
            Phase::Read(rx) => self.serve(rx),
        }

        if framing.ends() {
            self.execute();
            self.selected = false;
        }
        Ok(())
    }
}

impl CommandTransport for Emulator {
    type Error = BusFault;

    fn claim(&mut self) -> Result<(), BusFault> {
        if self.fail_claim {
            return Err(BusFault);
        }
        self.claimed = true;
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), BusFault> {
        self.run(framing, phase)
    }
}

impl AsyncCommandTransport for Emulator {
    type Error = BusFault;

    fn claim(&mut self) -> Result<(), BusFault> {
        CommandTransport::claim(self)
    }

    fn release(&mut self) {
        CommandTransport::release(self)
    }

    async fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), BusFault> {
        self.run(framing, phase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOp {
    Register(&'static str),
    Unregister(&'static str),
}

/// Storage catalog keeping entries by name
#[derive(Default)]
pub struct MockRegistry {
    pub entries: Vec<RegistryEntry>,
    pub ops: Vec<RegistryOp>,
    pub fail_register: Option<RegistryError>,
    pub fail_unregister: Option<RegistryError>,
}

impl DeviceRegistry for MockRegistry {
    fn register(&mut self, entry: &RegistryEntry) -> Result<(), RegistryError> {
        self.ops.push(RegistryOp::Register(entry.name));
        if let Some(e) = self.fail_register {
            return Err(e);
        }
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.entries.push(*entry);
        Ok(())
    }

    fn unregister(&mut self, entry: &RegistryEntry) -> Result<(), RegistryError> {
        self.ops.push(RegistryOp::Unregister(entry.name));
        if let Some(e) = self.fail_unregister {
            return Err(e);
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.name == entry.name)
            .ok_or(RegistryError::NotRegistered)?;
        self.entries.remove(index);
        Ok(())
    }
}
