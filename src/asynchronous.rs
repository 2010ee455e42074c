use crate::{
    address::AddressBytes,
    check_bounds,
    command::Command,
    error::{Access, Error},
    geometry::{Config, Geometry},
    register::StatusRegister,
    registry::{DeviceRegistry, Registration, RegistrationState, RegistryEntry},
    transport::{AsyncCommandTransport, Framing, Phase},
    Request, ZERO_BLOCK,
};
use embedded_storage_async::nor_flash::{MultiwriteNorFlash, NorFlash, ReadNorFlash};

/// Async MR25H driver, see [`crate::blocking::MR25H`] for the blocking one
pub struct AsyncMR25H<T>
where
    T: AsyncCommandTransport,
{
    /// Only `None` once [`Self::release`] took it
    transport: Option<T>,
    geometry: Geometry,
    registration: Registration,
}

impl<T> core::fmt::Debug for AsyncMR25H<T>
where
    T: AsyncCommandTransport,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncMR25H")
            .field("geometry", &self.geometry)
            .field("registration", &self.registration)
            .finish()
    }
}

impl<T, E> AsyncMR25H<T>
where
    T: AsyncCommandTransport<Error = E>,
{
    /// Claim the bus and create the driver, without registering it anywhere
    pub fn new(
        mut transport: T,
        geometry: impl Into<Geometry>,
        config: Config,
    ) -> Result<Self, Error<E>> {
        let geometry = geometry.into();
        transport.claim().map_err(Error::BusClaim)?;
        #[cfg(feature = "defmt")]
        defmt::debug!("AsyncMR25H bound: {:?}", geometry);
        Ok(Self {
            transport: Some(transport),
            registration: Registration::new(RegistryEntry::ram(&geometry, &config)),
            geometry,
        })
    }

    /// Claim the bus, create the driver and publish it to `registry`.
    ///
    /// The bus is released again if the registration fails.
    pub fn bind<R: DeviceRegistry>(
        transport: T,
        geometry: impl Into<Geometry>,
        config: Config,
        registry: &mut R,
    ) -> Result<Self, Error<E>> {
        let mut this = Self::new(transport, geometry, config)?;
        // On failure `this` is dropped, which releases the bus
        this.register(registry)?;
        Ok(this)
    }

    /// Remove the registry entry and give the bus back, see [`crate::blocking::MR25H::unbind`]
    pub fn unbind<R: DeviceRegistry>(mut self, registry: &mut R) -> (T, Result<(), Error<E>>) {
        let res = self.unregister(registry);
        (self.release(), res)
    }

    pub fn release(mut self) -> T {
        match self.transport.take() {
            Some(mut transport) => {
                transport.release();
                transport
            }
            None => unreachable!("transport already released"),
        }
    }

    pub fn register<R: DeviceRegistry>(&mut self, registry: &mut R) -> Result<(), Error<E>> {
        Ok(self.registration.register(registry)?)
    }

    pub fn unregister<R: DeviceRegistry>(&mut self, registry: &mut R) -> Result<(), Error<E>> {
        Ok(self.registration.unregister(registry)?)
    }

    pub fn registration(&self) -> RegistrationState {
        self.registration.state()
    }

    pub fn entry(&self) -> &RegistryEntry {
        self.registration.entry()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn capacity(&self) -> usize {
        self.geometry.size() as usize
    }

    async fn phase(
        &mut self,
        req: Request,
        framing: Framing,
        phase: Phase<'_>,
    ) -> Result<(), Error<E>> {
        let Some(transport) = self.transport.as_mut() else {
            unreachable!("transport already released")
        };
        transport
            .transfer(framing, phase)
            .await
            .map_err(|source| req.fail(source))
    }

    async fn command(&mut self, req: Request, bytes: &[u8]) -> Result<(), Error<E>> {
        self.phase(req, Framing::BeginEnd, Phase::Write(bytes))
            .await
    }

    async fn write_enable(&mut self, req: Request) -> Result<(), Error<E>> {
        self.command(req, &[Command::WriteEnable as u8]).await
    }

    async fn begin_write(&mut self, req: Request) -> Result<(), Error<E>> {
        check_bounds(self.geometry.size(), req.offset, req.len)?;
        let addr = AddressBytes::encode(req.offset, self.geometry.address_width());

        self.write_enable(req).await?;
        self.phase(req, Framing::Begin, Phase::Write(&[Command::Write as u8]))
            .await?;
        self.phase(req, Framing::None, Phase::Write(addr.as_slice()))
            .await
    }

    /// Read `buff.len()` bytes from `offset`, returns the number of bytes read
    pub async fn read(&mut self, offset: u32, buff: &mut [u8]) -> Result<usize, Error<E>> {
        let req = Request::new(Access::Read, offset, buff.len());
        check_bounds(self.geometry.size(), offset, buff.len())?;
        let addr = AddressBytes::encode(offset, self.geometry.address_width());

        self.phase(req, Framing::Begin, Phase::Write(&[Command::Read as u8]))
            .await?;
        self.phase(req, Framing::None, Phase::Write(addr.as_slice()))
            .await?;
        self.phase(req, Framing::End, Phase::Read(buff)).await?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Read {=usize} bytes at {=u32}", req.len, offset);
        Ok(req.len)
    }

    /// Write `buff` at `offset`, returns the number of bytes written
    pub async fn write(&mut self, offset: u32, buff: &[u8]) -> Result<usize, Error<E>> {
        let req = Request::new(Access::Write, offset, buff.len());
        self.begin_write(req).await?;
        self.phase(req, Framing::End, Phase::Write(buff)).await?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Wrote {=usize} bytes at {=u32}", req.len, offset);
        Ok(req.len)
    }

    /// Overwrite `len` bytes at `offset` with zeros in a single write transaction
    pub async fn zero_fill(&mut self, offset: u32, len: usize) -> Result<(), Error<E>> {
        let req = Request::new(Access::ZeroFill, offset, len);
        self.begin_write(req).await?;

        let zeros = [0u8; ZERO_BLOCK];
        let mut remaining = len;
        loop {
            let chunk = remaining.min(ZERO_BLOCK);
            remaining -= chunk;
            if remaining == 0 {
                self.phase(req, Framing::End, Phase::Write(&zeros[..chunk]))
                    .await?;
                break;
            }
            self.phase(req, Framing::None, Phase::Write(&zeros[..chunk]))
                .await?;
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("Zero filled {=usize} bytes at {=u32}", len, offset);
        Ok(())
    }

    pub async fn sync(&mut self) -> Result<(), Error<E>> {
        Ok(())
    }

    /// Read the status register
    pub async fn read_status(&mut self) -> Result<StatusRegister, Error<E>> {
        let req = Request::control(1);
        let mut status = [0u8; 1];
        self.phase(req, Framing::Begin, Phase::Write(&[Command::ReadStatus as u8]))
            .await?;
        self.phase(req, Framing::End, Phase::Read(&mut status))
            .await?;
        Ok(status[0].into())
    }

    /// Write the block protection and SRWD bits, the write enable latch is set internally
    pub async fn write_status(&mut self, status: StatusRegister) -> Result<(), Error<E>> {
        let req = Request::control(1);
        self.write_enable(req).await?;
        self.command(req, &[Command::WriteStatus as u8, status.into()])
            .await
    }

    pub async fn write_disable(&mut self) -> Result<(), Error<E>> {
        self.command(Request::control(0), &[Command::WriteDisable as u8])
            .await
    }

    /// Enter the sleep mode, only [`Self::wake`] is accepted afterwards
    pub async fn sleep(&mut self) -> Result<(), Error<E>> {
        self.command(Request::control(0), &[Command::Sleep as u8])
            .await
    }

    pub async fn wake(&mut self) -> Result<(), Error<E>> {
        self.command(Request::control(0), &[Command::Wake as u8])
            .await
    }
}

impl<T> Drop for AsyncMR25H<T>
where
    T: AsyncCommandTransport,
{
    fn drop(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.release();
        }
    }
}

impl<T: AsyncCommandTransport> embedded_storage_async::nor_flash::ErrorType for AsyncMR25H<T> {
    type Error = Error<T::Error>;
}

impl<T: AsyncCommandTransport> ReadNorFlash for AsyncMR25H<T> {
    const READ_SIZE: usize = crate::READ_SIZE;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        Self::read(self, offset, bytes).await.map(|_| ())
    }

    fn capacity(&self) -> usize {
        Self::capacity(self)
    }
}

impl<T: AsyncCommandTransport> NorFlash for AsyncMR25H<T> {
    const WRITE_SIZE: usize = crate::WRITE_SIZE;

    const ERASE_SIZE: usize = crate::ERASE_SIZE;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if from > to {
            return Err(Error::OutOfBounds);
        }
        self.zero_fill(from, (to - from) as usize).await
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        Self::write(self, offset, bytes).await.map(|_| ())
    }
}

impl<T: AsyncCommandTransport> MultiwriteNorFlash for AsyncMR25H<T> {}
