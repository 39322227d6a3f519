//! NMH1000 host-I/O demo on Raspberry Pi Pico 2 (blocking driver)
//!
//! Samples the sensor continuously, lights the LED while the field is above
//! the switch threshold, and lets a host tool read and write the demo
//! variables over UART0.
//!
//! Hardware connections:
//! - Sensor SDA: GPIO12, SCL: GPIO13 (I2C0, 400 kHz)
//! - Host UART TX: GPIO0, RX: GPIO1 (115200 8N1)
//! - Indicator LED: GPIO25, lit when low
//!
//! Host frames: `[b'R', offset, len]` answers `len` variable bytes,
//! `[b'W', offset, len, data...]` answers one status byte (0 on success).

#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::{
    bind_interrupts,
    block::ImageDef,
    config::Config,
    gpio::{Level, Output},
    i2c::{Config as I2cConfig, I2c, InterruptHandler as I2cInterruptHandler},
    peripherals::{I2C0, UART0},
    uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig},
};
use embassy_time::{Delay, Duration};
use embedded_io::{Read, ReadReady, Write};
use nmh1000::{AppConfig, HostIoApp, HostIoRegisters, HostLink, I2cInterface, Nmh1000Driver};
use panic_probe as _;

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

const CMD_READ: u8 = b'R';
const CMD_WRITE: u8 = b'W';
const HEADER_LEN: usize = 3;
const FRAME_LEN: usize = HEADER_LEN + HostIoRegisters::SIZE;

/// Minimal request/response framing over a buffered UART
struct UartLink<'d> {
    uart: BufferedUart<'d, UART0>,
    frame: [u8; FRAME_LEN],
    filled: usize,
}

impl<'d> UartLink<'d> {
    fn new(uart: BufferedUart<'d, UART0>) -> Self {
        Self {
            uart,
            frame: [0; FRAME_LEN],
            filled: 0,
        }
    }

    /// Bytes the current frame needs, once its header is known
    fn expected_len(&self) -> Option<usize> {
        if self.filled < HEADER_LEN {
            return None;
        }
        match self.frame[0] {
            CMD_READ => Some(HEADER_LEN),
            _ => Some(HEADER_LEN + usize::from(self.frame[2])),
        }
    }

    fn execute(&mut self, registers: &mut HostIoRegisters) {
        let offset = usize::from(self.frame[1]);
        let len = usize::from(self.frame[2]);
        let mut data = [0u8; HostIoRegisters::SIZE];

        let reply = match self.frame[0] {
            CMD_READ => {
                let read = data
                    .get_mut(..len)
                    .is_some_and(|buf| registers.read_bytes(offset, buf).is_ok());
                if read {
                    &data[..len]
                } else {
                    &[1u8][..]
                }
            }
            CMD_WRITE => {
                let payload = &self.frame[HEADER_LEN..HEADER_LEN + len];
                match registers.write_bytes(offset, payload) {
                    Ok(()) => &[0u8][..],
                    Err(e) => {
                        warn!("host write at {} refused: {}", offset, e);
                        &[1u8][..]
                    }
                }
            }
            other => {
                warn!("unknown host command 0x{:02x}", other);
                &[1u8][..]
            }
        };

        if self.uart.write_all(reply).is_err() {
            warn!("host reply dropped");
        }
    }
}

impl HostLink for UartLink<'_> {
    fn poll(&mut self, registers: &mut HostIoRegisters) {
        while self.uart.read_ready().unwrap_or(false) {
            let mut byte = [0u8];
            if self.uart.read(&mut byte).is_err() {
                self.filled = 0;
                return;
            }
            if self.filled >= FRAME_LEN {
                self.filled = 0;
            }
            self.frame[self.filled] = byte[0];
            self.filled += 1;

            match self.expected_len() {
                Some(len) if len > FRAME_LEN => self.filled = 0,
                Some(len) if self.filled == len => {
                    self.execute(registers);
                    self.filled = 0;
                }
                _ => {}
            }
        }
    }
}

fn halt() -> ! {
    loop {
        embassy_time::block_for(Duration::from_millis(1000));
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("NMH1000 Host I/O Demo");

    let p = embassy_rp::init(Config::default());

    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = 400_000;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_13, p.PIN_12, i2c_config);

    let mut tx_buf = [0u8; 64];
    let mut rx_buf = [0u8; 64];
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;
    let uart = BufferedUart::new(
        p.UART0,
        Irqs,
        p.PIN_0,
        p.PIN_1,
        &mut tx_buf,
        &mut rx_buf,
        uart_config,
    );
    let mut link = UartLink::new(uart);

    let led = Output::new(p.PIN_25, Level::High);

    let mut sensor = match Nmh1000Driver::new(I2cInterface::default(i2c)) {
        Ok(sensor) => sensor,
        Err(e) => {
            error!("Failed to detect NMH1000: status {}", e.status_code());
            halt();
        }
    };

    if let Err(e) = sensor.init(&mut Delay) {
        error!("Failed to reset NMH1000: status {}", e.status_code());
        halt();
    }

    let mut app = HostIoApp::new(sensor, led, AppConfig::default());
    if let Err(e) = app.setup() {
        error!("Failed to configure NMH1000: {:?}", e);
        halt();
    }

    info!(
        "Sampling, {} byte variable block on UART0",
        HostIoRegisters::SIZE
    );

    let e = app.run(&mut link);
    error!("Demo stopped: status {} ({:?})", e.status_code(), e);
    halt();
}
