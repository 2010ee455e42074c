#![no_std]
#![no_main]

use defmt_rtt as _;
use embassy_executor::Spawner;
use panic_probe as _;

use embassy_nrf::{
    bind_interrupts,
    config::Config,
    gpio::{Level, Output, OutputDrive},
    peripherals,
    spim::{self, Spim},
};
use embedded_storage_async::nor_flash::{NorFlash, ReadNorFlash};
use mr25h::{asynchronous::AsyncMR25H, transport::AsyncSpiTransport, Variant};

bind_interrupts!(struct Irqs {
    SPIM3 => spim::InterruptHandler<peripherals::SPI3>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(Config::default());

    // MR25H40 on P1.15 SCK, P1.14 SO, P1.13 SI, P1.12 CS
    let mut spi_config = spim::Config::default();
    spi_config.frequency = spim::Frequency::M32;
    let spi = Spim::new(p.SPI3, Irqs, p.P1_15, p.P1_14, p.P1_13, spi_config);
    let cs = Output::new(p.P1_12, Level::High, OutputDrive::Standard);

    let mut memory = match AsyncMR25H::new(
        AsyncSpiTransport::new(spi, cs),
        Variant::Mr25h40,
        mr25h::Config::default(),
    ) {
        Ok(memory) => memory,
        Err(e) => defmt::panic!("Unable to claim the bus: {}", e),
    };

    const START: u32 = 0x1000;
    const LEN: usize = 4096;
    let mut buf = [0u8; LEN];
    let data = [0x55u8; LEN];

    NorFlash::write(&mut memory, START, &data).await.unwrap();
    ReadNorFlash::read(&mut memory, START, &mut buf)
        .await
        .unwrap();
    defmt::assert!(buf.iter().all(|&b| b == 0x55));

    // Erasing an MRAM leaves zeros behind
    NorFlash::erase(&mut memory, START, START + LEN as u32)
        .await
        .unwrap();
    ReadNorFlash::read(&mut memory, START, &mut buf)
        .await
        .unwrap();
    defmt::assert!(buf.iter().all(|&b| b == 0));

    defmt::info!("Done, {=usize} bytes checked", LEN);
}
