#![no_std]
#![no_main]

use defmt_rtt as _;
use embassy_nrf as _;
use embedded_test as _;

#[cfg(test)]
#[embedded_test::tests]
mod tests {
    use embassy_nrf::{
        bind_interrupts,
        config::Config,
        gpio::{Level, Output, OutputDrive},
        peripherals::{self, SPI3},
        spim::{self, Spim},
    };
    use embedded_storage_async::nor_flash::{NorFlash, ReadNorFlash};
    use mr25h::{asynchronous::AsyncMR25H, transport::AsyncSpiTransport, Variant};

    type Memory = AsyncMR25H<AsyncSpiTransport<Spim<'static, SPI3>, Output<'static>>>;

    bind_interrupts!(struct Irqs {
        SPIM3 => spim::InterruptHandler<peripherals::SPI3>;
    });

    #[init]
    async fn init() -> Memory {
        let p = embassy_nrf::init(Config::default());

        let spi_config = spim::Config::default();
        let spi = Spim::new(p.SPI3, Irqs, p.P1_15, p.P1_14, p.P1_13, spi_config);
        let cs = Output::new(p.P1_12, Level::High, OutputDrive::Standard);
        AsyncMR25H::new(
            AsyncSpiTransport::new(spi, cs),
            Variant::Mr25h40,
            mr25h::Config::default(),
        )
        .unwrap()
    }

    #[test]
    async fn write_then_zero_fill(mut memory: Memory) {
        let mut buff = [0u8; 4];

        memory.write(0x10, &[1, 2, 3, 4]).await.unwrap();
        memory.read(0x10, &mut buff).await.unwrap();
        defmt::info!("Value after write {}", buff);
        defmt::assert_eq!(buff, [1, 2, 3, 4]);

        memory.zero_fill(0x11, 2).await.unwrap();
        memory.read(0x10, &mut buff).await.unwrap();
        defmt::assert_eq!(buff, [1, 0, 0, 4]);
    }

    /// Write and erase a range larger than one zero block through the `NorFlash` traits.
    #[test]
    async fn trait_erase_range(mut memory: Memory) {
        const START: u32 = 0x7_0000;
        const LEN: usize = 4096 + 100;
        let mut buf = [0u8; LEN];
        let data = [0x55u8; LEN];

        NorFlash::write(&mut memory, START, &data).await.unwrap();
        ReadNorFlash::read(&mut memory, START, &mut buf)
            .await
            .unwrap();
        defmt::assert!(buf.iter().all(|&b| b == 0x55));

        NorFlash::erase(&mut memory, START, START + LEN as u32)
            .await
            .unwrap();
        ReadNorFlash::read(&mut memory, START, &mut buf)
            .await
            .unwrap();
        defmt::assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    async fn status_register(mut memory: Memory) {
        let status = memory.read_status().await.unwrap();
        defmt::info!("Status {}", status);
        defmt::assert!(!status.write_enable_latch);
    }
}
