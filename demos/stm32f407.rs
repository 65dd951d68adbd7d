//! Demo: Environmental monitoring with a BME280 on an STM32F407.
//!
//! This demonstrates:
//! 1. **Initialization**: Setting up I2C and the BMx280 driver.
//! 2. **Configuration**: Choosing oversampling, filter and standby settings.
//! 3. **Data Processing**: Reading measurements and formatting the
//!    fixed-point data for logging.
//!
//! Wire the sensor's SDO pin to GND for the 0x76 address. For a BMP280,
//! construct the driver with `Model::Bmp280`; the humidity field of the
//! measurement is then `None`.

#![no_main]
#![no_std]
#![deny(unsafe_code)]

// The driver is independent of logging frameworks.
// We use defmt explicitly in the demo code only.
use bmx280_driver::interface::{Address, I2cInterface};
use bmx280_driver::settings::{Filter, Oversampling, SettingsBuilder};
use bmx280_driver::{Bmx280, Model};
use defmt_rtt as _;
use panic_probe as _;
use stm32f4xx_hal::{self as hal, prelude::*};

#[cortex_m_rt::entry]
fn main() -> ! {
    // --- 1. Hardware Setup ---
    let dp = hal::pac::Peripherals::take().unwrap();
    let clock_cfg = hal::rcc::Config::default().sysclk(168.MHz());
    let mut rcc = dp.RCC.freeze(clock_cfg);

    // Setup I2C1 (SCL on PB6, SDA on PB7)
    let gpiob = dp.GPIOB.split(&mut rcc);
    let scl = gpiob.pb6.into_open_drain_output();
    let sda = gpiob.pb7.into_open_drain_output();

    let i2c = hal::i2c::I2c1::new(
        dp.I2C1,
        (scl, sda),
        hal::i2c::Mode::Standard {
            frequency: 100.kHz().into(),
        },
        &mut rcc,
    );

    // Setup a delay provider (TIM6) used by the driver for the conversion wait
    let mut delay = dp.TIM6.delay_us(&mut rcc);

    // --- 2. Sensor Configuration ---
    // The defaults reproduce the reference setup (16x oversampling
    // everywhere, filter coefficient 8, 1 s standby); here we trade some
    // precision for conversion speed instead.
    let settings = SettingsBuilder::new()
        .filter(Filter::X4)
        .temp_oversampling(Oversampling::X2)
        .pres_oversampling(Oversampling::X16)
        .hum_oversampling(Oversampling::X1)
        .build();

    // --- 3. Driver Initialization ---
    // Checks the device ID, loads calibration and applies the settings.
    let sensor = Bmx280::new(I2cInterface::new(i2c, Address::SdoGnd), Model::Bme280);
    let mut sensor = sensor.init(&settings).expect("Failed to initialize BME280");

    // --- 4. Measurement Loop ---
    loop {
        // Trigger a forced (one-shot) conversion and compensate the result.
        let data = sensor.measure(&mut delay).expect("Failed to read data");

        // The driver uses fixed-point arithmetic; the helper methods
        // separate integral and decimal parts for human-readable output.
        let temp = data.temp.split();
        let pres = data.pres.as_hpa();

        defmt::println!("Temperature: {}.{} °C", temp.0, temp.1);
        defmt::println!("Pressure:    {}.{} hPa", pres.0, pres.1);
        if let Some(hum) = data.hum {
            let hum = hum.split();
            defmt::println!("Humidity:    {}.{} %", hum.0, hum.1);
        }
        defmt::println!("");

        // Wait 5 seconds before the next measurement cycle
        delay.delay_ms(5000);
    }
}
