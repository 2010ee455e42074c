//! Chip-select framed command phases on top of an SPI bus.
//!
//! A chip transaction is built out of one or more [`Phase`]s. The [`Framing`] of each phase
//! tells the transport whether chip select is asserted before it and released after it,
//! so chip select stays low across consecutive phases until a phase that ends the
//! transaction. When a phase fails the transport releases chip select, which aborts the
//! transaction on the chip side.

use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use embedded_hal_async::spi::SpiBus as AsyncSpiBus;

/// Chip select handling around a phase
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Continue the running transaction
    None,
    /// Assert chip select before the phase
    Begin,
    /// Release chip select after the phase
    End,
    /// A complete transaction on its own
    BeginEnd,
}

impl Framing {
    pub const fn begins(&self) -> bool {
        matches!(self, Framing::Begin | Framing::BeginEnd)
    }

    pub const fn ends(&self) -> bool {
        matches!(self, Framing::End | Framing::BeginEnd)
    }
}

/// Payload of a single phase, either clocked out or clocked in
#[derive(Debug, PartialEq, Eq)]
pub enum Phase<'a> {
    Write(&'a [u8]),
    Read(&'a mut [u8]),
}

impl Phase<'_> {
    pub fn len(&self) -> usize {
        match self {
            Phase::Write(tx) => tx.len(),
            Phase::Read(rx) => rx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bits clocked for this phase
    pub fn bits(&self) -> usize {
        self.len() * 8
    }
}

/// A bus able to run framed command phases
pub trait CommandTransport {
    type Error: Debug;

    /// Take the bus for the lifetime of the driver
    fn claim(&mut self) -> Result<(), Self::Error>;

    /// Give the bus back, called once when the driver is torn down
    fn release(&mut self);

    /// Run one phase. Phases run in issue order.
    fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), Self::Error>;
}

impl<T: CommandTransport + ?Sized> CommandTransport for &mut T {
    type Error = T::Error;

    fn claim(&mut self) -> Result<(), Self::Error> {
        (**self).claim()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), Self::Error> {
        (**self).transfer(framing, phase)
    }
}

/// Async flavour of [`CommandTransport`]
#[allow(async_fn_in_trait)]
pub trait AsyncCommandTransport {
    type Error: Debug;

    /// Take the bus for the lifetime of the driver
    fn claim(&mut self) -> Result<(), Self::Error>;

    /// Give the bus back, called once when the driver is torn down
    fn release(&mut self);

    /// Run one phase. Phases run in issue order.
    async fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), Self::Error>;
}

impl<T: AsyncCommandTransport + ?Sized> AsyncCommandTransport for &mut T {
    type Error = T::Error;

    fn claim(&mut self) -> Result<(), Self::Error> {
        (**self).claim()
    }

    fn release(&mut self) {
        (**self).release()
    }

    async fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), Self::Error> {
        (**self).transfer(framing, phase).await
    }
}

/// Errors of the SPI transports
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError<BusError, PinError> {
    /// An SPI transfer failed.
    Bus(BusError),

    /// The chip select pin could not be set.
    ChipSelect(PinError),
}

/// [`CommandTransport`] over an exclusive SPI bus and a chip select pin
pub struct SpiTransport<BUS, CS> {
    bus: BUS,
    cs: CS,
}

impl<BUS, CS> Debug for SpiTransport<BUS, CS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpiTransport").finish()
    }
}

impl<BUS, CS> SpiTransport<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    pub fn new(bus: BUS, cs: CS) -> Self {
        Self { bus, cs }
    }

    /// Destroy the transport and get the bus and pin back
    pub fn into_inner(self) -> (BUS, CS) {
        (self.bus, self.cs)
    }

    fn clock(&mut self, phase: Phase<'_>, end: bool) -> Result<(), BUS::Error> {
        match phase {
            Phase::Write(tx) => self.bus.write(tx)?,
            Phase::Read(rx) => self.bus.read(rx)?,
        }
        if end {
            self.bus.flush()?;
        }
        Ok(())
    }
}

impl<BUS, CS> CommandTransport for SpiTransport<BUS, CS>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    type Error = TransportError<BUS::Error, CS::Error>;

    fn claim(&mut self) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(TransportError::ChipSelect)
    }

    fn release(&mut self) {
        // Nothing left to report to once the driver is gone
        let _ = self.cs.set_high();
    }

    fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), Self::Error> {
        if framing.begins() {
            self.cs.set_low().map_err(TransportError::ChipSelect)?;
        }
        let res = self.clock(phase, framing.ends()).map_err(TransportError::Bus);
        if res.is_err() || framing.ends() {
            // A bus error takes precedence over failing to release chip select
            let released = self.cs.set_high().map_err(TransportError::ChipSelect);
            return res.and(released);
        }
        res
    }
}

/// [`AsyncCommandTransport`] over an exclusive async SPI bus and a chip select pin
pub struct AsyncSpiTransport<BUS, CS> {
    bus: BUS,
    cs: CS,
}

impl<BUS, CS> Debug for AsyncSpiTransport<BUS, CS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncSpiTransport").finish()
    }
}

impl<BUS, CS> AsyncSpiTransport<BUS, CS>
where
    BUS: AsyncSpiBus,
    CS: OutputPin,
{
    pub fn new(bus: BUS, cs: CS) -> Self {
        Self { bus, cs }
    }

    /// Destroy the transport and get the bus and pin back
    pub fn into_inner(self) -> (BUS, CS) {
        (self.bus, self.cs)
    }

    async fn clock(&mut self, phase: Phase<'_>, end: bool) -> Result<(), BUS::Error> {
        match phase {
            Phase::Write(tx) => self.bus.write(tx).await?,
            Phase::Read(rx) => self.bus.read(rx).await?,
        }
        if end {
            self.bus.flush().await?;
        }
        Ok(())
    }
}

impl<BUS, CS> AsyncCommandTransport for AsyncSpiTransport<BUS, CS>
where
    BUS: AsyncSpiBus,
    CS: OutputPin,
{
    type Error = TransportError<BUS::Error, CS::Error>;

    fn claim(&mut self) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(TransportError::ChipSelect)
    }

    fn release(&mut self) {
        let _ = self.cs.set_high();
    }

    async fn transfer(&mut self, framing: Framing, phase: Phase<'_>) -> Result<(), Self::Error> {
        if framing.begins() {
            self.cs.set_low().map_err(TransportError::ChipSelect)?;
        }
        let res = self.clock(phase, framing.ends()).await.map_err(TransportError::Bus);
        if res.is_err() || framing.ends() {
            // A bus error takes precedence over failing to release chip select
            let released = self.cs.set_high().map_err(TransportError::ChipSelect);
            return res.and(released);
        }
        res
    }
}
