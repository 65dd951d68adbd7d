#![no_std]

//! # BMx280 Environmental Sensor Driver
//!
//! A platform-agnostic, `no_std` driver for the Bosch BMP280 and BME280.
//! This driver uses the typestate pattern to ensure the sensor is identified
//! and calibrated before measurements are taken.
//!
//! ## Features
//! - **Two sensor models**: BMP280 (temperature + pressure) and BME280
//!   (temperature + pressure + humidity), selected by device ID.
//! - **I2C and SPI**: the bus interface is chosen at construction time.
//! - **Fixed-Point Arithmetic**: no FPU required; the Bosch compensation
//!   formulas are reproduced bit-exactly.
//! - **Typestate Pattern**: prevents measuring before initialization.
//!
//! ## Units
//! - **Temperature**: Centigrade (C * 100) -> 2350 = 23.50 °C
//! - **Pressure**: Pascal (Pa) -> 101325 = 1013.25 hPa
//! - **Humidity**: Q22.10 %RH -> 47445 = 46.333 %
//!
//! ## Example
//!
//! ```
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//! # let mut i2c = I2cMock::new(&[
//! #     I2cTransaction::write_read(0x76, vec![0xD0], vec![0x58]),
//! #     I2cTransaction::write_read(0x76, vec![0x88], vec![0; 26]),
//! #     I2cTransaction::write(0x76, vec![0xF5, 0xAC]),
//! #     I2cTransaction::write(0x76, vec![0xF2, 0x05]),
//! #     I2cTransaction::write(0x76, vec![0xF4, 0xB4]),
//! #     I2cTransaction::write(0x76, vec![0xF4, 0xB5]),
//! #     I2cTransaction::write_read(0x76, vec![0xF3], vec![0x00]),
//! #     I2cTransaction::write_read(
//! #         0x76,
//! #         vec![0xF7],
//! #         vec![0x50, 0x00, 0x00, 0x82, 0x40, 0x00, 0x7F, 0xFF],
//! #     ),
//! # ]);
//! # let mut delay = NoopDelay::new();
//! use bmx280_driver::interface::{Address, I2cInterface};
//! use bmx280_driver::settings::Settings;
//! use bmx280_driver::{Bmx280, Model};
//!
//! let sensor = Bmx280::new(I2cInterface::new(i2c.clone(), Address::SdoGnd), Model::Bmp280);
//! let mut sensor = sensor.init(&Settings::default())?;
//! let measurement = sensor.measure(&mut delay)?;
//! let (degrees, centi) = measurement.temp.split();
//! # i2c.done();
//! # Ok::<(), bmx280_driver::error::Bmx280Error<embedded_hal::i2c::ErrorKind>>(())
//! ```

#[cfg(test)]
#[macro_use]
extern crate std;

mod calc;
pub mod interface;
pub mod settings;

use core::marker::PhantomData;
use embedded_hal::delay::DelayNs;

use crate::interface::RegisterBus;
use crate::settings::Settings;

/// Register map shared by both sensor variants.
mod reg {
    /// Device-ID register.
    pub const ID: u8 = 0xD0;
    /// First calibration block: temperature and pressure coefficients, plus
    /// the first humidity coefficient on the BME280.
    pub const CALIB1: u8 = 0x88;
    pub const CALIB1_LEN: usize = 26;
    /// Second calibration block: remaining humidity coefficients.
    pub const CALIB2: u8 = 0xE1;
    pub const CALIB2_LEN: usize = 16;
    /// Humidity oversampling.
    pub const CTRL_HUM: u8 = 0xF2;
    /// Conversion status.
    pub const STATUS: u8 = 0xF3;
    /// Temperature/pressure oversampling and power mode.
    pub const CTRL_MEAS: u8 = 0xF4;
    /// Filter and standby configuration.
    pub const CONFIG: u8 = 0xF5;
    /// Raw data block: pressure MSB/LSB/XLSB, temperature MSB/LSB/XLSB,
    /// humidity MSB/LSB.
    pub const DATA: u8 = 0xF7;
    pub const DATA_LEN: usize = 8;

    /// Status bit held high while a conversion is running.
    pub const STATUS_MEASURING: u8 = 1 << 3;
    /// `ctrl_meas` mode bits selecting a one-shot conversion.
    pub const MODE_FORCED: u8 = 0b01;
}

/// Fixed wait applied when the status register still reports a running
/// conversion after the forced-mode trigger.
const CONVERSION_WAIT_MS: u32 = 20;

// --- Typestates ---

/// Sensor has been created but not yet identified and calibrated.
pub struct Uninitialized;
/// Sensor is identified, calibrated and configured; ready for measurements.
pub struct Ready;

/// Error types for the BMx280 driver.
pub mod error {
    /// Errors that can occur during identification or communication.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Bmx280Error<E> {
        /// Bus transfer failed.
        Transport(E),
        /// The device-ID register did not match the expected model.
        IdentityMismatch,
    }

    /// Result type alias for BMx280 operations.
    pub type Result<T, E> = core::result::Result<T, Bmx280Error<E>>;
}

/// Supported sensor models.
///
/// The discriminant is the value of the device-ID register, checked during
/// [`Bmx280::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Model {
    /// BMP280: temperature and pressure.
    Bmp280 = 0x58,
    /// BME280: temperature, pressure and humidity.
    Bme280 = 0x60,
}

impl Model {
    /// Expected device-ID register value.
    pub const fn chip_id(self) -> u8 {
        self as u8
    }

    /// Whether the model carries a humidity sensing element.
    pub const fn has_humidity(self) -> bool {
        matches!(self, Model::Bme280)
    }
}

/// Factory-fused calibration coefficients read from the sensor.
///
/// These are unique to every individual chip and required by the
/// compensation formulas. The humidity coefficients stay zeroed on the
/// BMP280.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CalibData {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibData {
    /// Decodes the temperature and pressure coefficients, low byte first.
    fn parse_temp_pres(block: &[u8; reg::CALIB1_LEN]) -> Self {
        CalibData {
            dig_t1: u16::from_le_bytes([block[0], block[1]]),
            dig_t2: i16::from_le_bytes([block[2], block[3]]),
            dig_t3: i16::from_le_bytes([block[4], block[5]]),
            dig_p1: u16::from_le_bytes([block[6], block[7]]),
            dig_p2: i16::from_le_bytes([block[8], block[9]]),
            dig_p3: i16::from_le_bytes([block[10], block[11]]),
            dig_p4: i16::from_le_bytes([block[12], block[13]]),
            dig_p5: i16::from_le_bytes([block[14], block[15]]),
            dig_p6: i16::from_le_bytes([block[16], block[17]]),
            dig_p7: i16::from_le_bytes([block[18], block[19]]),
            dig_p8: i16::from_le_bytes([block[20], block[21]]),
            dig_p9: i16::from_le_bytes([block[22], block[23]]),
            ..CalibData::default()
        }
    }

    /// Decodes the second-block humidity coefficients. `dig_h4` takes the
    /// low nibble and `dig_h5` the high nibble of the shared middle byte.
    fn parse_humidity(&mut self, block: &[u8; reg::CALIB2_LEN]) {
        self.dig_h2 = i16::from_le_bytes([block[0], block[1]]);
        self.dig_h3 = block[2];
        self.dig_h4 = ((block[3] as i16) << 4) | ((block[4] & 0x0F) as i16);
        self.dig_h5 = ((block[5] as i16) << 4) | (((block[4] >> 4) & 0x0F) as i16);
        self.dig_h6 = block[6] as i8;
    }
}

/// Raw ADC values read from the data block.
///
/// Uncompensated; consumed by the compensation formulas on [`CalibData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawData {
    /// 20-bit pressure reading.
    pub adc_pres: u32,
    /// 20-bit temperature reading.
    pub adc_temp: u32,
    /// 16-bit humidity reading.
    pub adc_hum: u16,
}

impl From<[u8; reg::DATA_LEN]> for RawData {
    fn from(buf: [u8; reg::DATA_LEN]) -> Self {
        RawData {
            adc_pres: ((buf[0] as u32) << 12) | ((buf[1] as u32) << 4) | ((buf[2] as u32) >> 4),
            adc_temp: ((buf[3] as u32) << 12) | ((buf[4] as u32) << 4) | ((buf[5] as u32) >> 4),
            adc_hum: u16::from_be_bytes([buf[6], buf[7]]),
        }
    }
}

/// Output of temperature compensation.
///
/// Carries the fine-temperature term required by
/// [`CalibData::compensate_pressure`] and [`CalibData::compensate_humidity`]
/// for the same raw sample; compensate temperature first, then feed `t_fine`
/// into the other two.
#[derive(Debug, Clone, Copy)]
pub struct CompensatedTemp {
    /// Compensated reading in centi-degrees.
    pub temp: Temperature,
    /// Fine temperature, valid for one measurement cycle.
    pub t_fine: i32,
}

/// Represents temperature in Centigrade (degrees Celsius * 100).
///
/// # Example
/// A value of `2350` represents **23.50 °C**.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    /// Splits the fixed-point value into integral and fractional parts.
    ///
    /// # Example
    /// ```rust
    /// use bmx280_driver::Temperature;
    /// let temp = Temperature(2350);
    /// assert_eq!(temp.split(), (23, 50)); // Represents 23.50 °C
    /// ```
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Represents atmospheric pressure in Pascal (Pa).
///
/// # Example
/// A value of `101325` represents **101325 Pa** (or 1013.25 hPa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub u32);

impl Pressure {
    /// Converts the Pascal value to Hectopascal (hPa) and splits it.
    ///
    /// # Example
    /// ```rust
    /// use bmx280_driver::Pressure;
    /// let press = Pressure(101325);
    /// assert_eq!(press.as_hpa(), (1013, 25)); // Represents 1013.25 hPa
    /// ```
    pub fn as_hpa(&self) -> (u32, u32) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Represents relative humidity in Q22.10 fixed point (22 integer and 10
/// fractional bits).
///
/// # Example
/// A value of `47445` represents **47445 / 1024 = 46.333 %RH**.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub u32);

impl Humidity {
    /// Splits the fixed-point value into integral and fractional parts.
    /// The fraction represents 3 decimal places.
    ///
    /// # Example
    /// ```rust
    /// use bmx280_driver::Humidity;
    /// let hum = Humidity(47445);
    /// assert_eq!(hum.split(), (46, 333)); // Represents 46.333 %
    /// ```
    pub fn split(&self) -> (u32, u32) {
        (self.0 / 1024, (self.0 % 1024) * 1000 / 1024)
    }
}

/// Compensated measurement result in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature data.
    pub temp: Temperature,
    /// Atmospheric pressure data.
    pub pres: Pressure,
    /// Humidity data. `None` on the BMP280, which has no humidity sensing
    /// element.
    pub hum: Option<Humidity>,
}

/// The main BMx280 driver structure.
///
/// Generic over the [`RegisterBus`] chosen at construction time. The `STATE`
/// generic uses the typestate pattern to track initialization status at
/// compile time. Each handle manages exactly one physical sensor; use one
/// handle per device for multi-sensor setups.
#[derive(Debug)]
pub struct Bmx280<B, STATE> {
    bus: B,
    model: Model,
    calib: CalibData,
    /// `ctrl_meas` value written at init; reused for the forced-mode trigger
    /// so the oversampling bits are preserved.
    ctrl_meas: u8,
    _state: PhantomData<STATE>,
}

impl<B, S, E> Bmx280<B, S>
where
    B: RegisterBus<Error = E>,
{
    /// Reads a single byte from a register.
    fn read_reg_byte(&mut self, reg: u8) -> error::Result<u8, E> {
        let mut buf = [0];
        self.bus
            .read_registers(reg, &mut buf)
            .map_err(error::Bmx280Error::Transport)?;
        Ok(buf[0])
    }

    /// Burst-reads starting at a register address into the provided buffer.
    fn read_into(&mut self, reg: u8, buf: &mut [u8]) -> error::Result<(), E> {
        self.bus
            .read_registers(reg, buf)
            .map_err(error::Bmx280Error::Transport)
    }

    /// Writes a single register.
    fn write_reg(&mut self, reg: u8, value: u8) -> error::Result<(), E> {
        self.bus
            .write_register(reg, value)
            .map_err(error::Bmx280Error::Transport)
    }

    /// Releases the underlying bus interface.
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B, E> Bmx280<B, Uninitialized>
where
    B: RegisterBus<Error = E>,
{
    /// Creates a new driver instance in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(bus: B, model: Model) -> Self {
        Bmx280 {
            bus,
            model,
            calib: CalibData::default(),
            ctrl_meas: 0,
            _state: PhantomData,
        }
    }

    /// Initializes the sensor: verifies the device ID, loads factory
    /// calibration data and writes the configuration registers.
    ///
    /// This transitions the driver state from `Uninitialized` to `Ready`.
    /// On failure the handle is consumed, so no partially initialized driver
    /// can be used; construct a fresh one to retry.
    ///
    /// # Errors
    /// [`IdentityMismatch`](error::Bmx280Error::IdentityMismatch) if the
    /// device-ID register does not match `model` (no calibration registers
    /// are read in that case), or
    /// [`Transport`](error::Bmx280Error::Transport) if any bus transfer
    /// fails.
    pub fn init(mut self, settings: &Settings) -> error::Result<Bmx280<B, Ready>, E> {
        let id = self.read_reg_byte(reg::ID)?;
        if id != self.model.chip_id() {
            return Err(error::Bmx280Error::IdentityMismatch);
        }

        let calib = self.read_calib_data()?;
        let ctrl_meas = settings.ctrl_meas_byte();

        self.write_reg(reg::CONFIG, settings.config_byte())?;
        self.write_reg(reg::CTRL_HUM, settings.ctrl_hum_byte())?;
        self.write_reg(reg::CTRL_MEAS, ctrl_meas)?;

        Ok(Bmx280 {
            bus: self.bus,
            model: self.model,
            calib,
            ctrl_meas,
            _state: PhantomData,
        })
    }

    /// Reads the factory calibration coefficients.
    ///
    /// The temperature and pressure coefficients are common to both models;
    /// the BME280 additionally carries `dig_h1` at the tail of the first
    /// block and the remaining humidity coefficients in a second block.
    fn read_calib_data(&mut self) -> error::Result<CalibData, E> {
        let mut block = [0u8; reg::CALIB1_LEN];
        self.read_into(reg::CALIB1, &mut block)?;
        let mut calib = CalibData::parse_temp_pres(&block);

        if self.model.has_humidity() {
            calib.dig_h1 = block[25];

            let mut block = [0u8; reg::CALIB2_LEN];
            self.read_into(reg::CALIB2, &mut block)?;
            calib.parse_humidity(&block);
        }

        Ok(calib)
    }
}

impl<B, E> Bmx280<B, Ready>
where
    B: RegisterBus<Error = E>,
{
    /// The model this handle was initialized for.
    pub fn model(&self) -> Model {
        self.model
    }

    /// The calibration coefficients loaded during [`init`](Bmx280::init).
    pub fn calibration(&self) -> &CalibData {
        &self.calib
    }

    /// Triggers a one-shot conversion and returns the compensated result.
    ///
    /// The measurement-control register is written with forced mode while
    /// keeping the oversampling bits configured at init. If the status
    /// register then still reports a running conversion, a single fixed
    /// 20 ms wait is performed before the data block is read; there is no
    /// polling loop or timeout.
    ///
    /// Temperature is compensated first; its fine-temperature term feeds
    /// the pressure and humidity compensation for the same sample.
    ///
    /// # Errors
    /// [`Transport`](error::Bmx280Error::Transport) if any bus transfer
    /// fails. The cycle holds no state, so the next call starts fresh.
    pub fn measure(&mut self, delay: &mut impl DelayNs) -> error::Result<Measurement, E> {
        self.write_reg(reg::CTRL_MEAS, self.ctrl_meas | reg::MODE_FORCED)?;

        let status = self.read_reg_byte(reg::STATUS)?;
        if status & reg::STATUS_MEASURING != 0 {
            delay.delay_ms(CONVERSION_WAIT_MS);
        }

        let mut buf = [0u8; reg::DATA_LEN];
        self.read_into(reg::DATA, &mut buf)?;
        let raw = RawData::from(buf);

        let t = self.calib.compensate_temperature(raw.adc_temp);
        let pres = self.calib.compensate_pressure(raw.adc_pres, t.t_fine);
        let hum = if self.model.has_humidity() {
            Some(self.calib.compensate_humidity(raw.adc_hum, t.t_fine))
        } else {
            None
        };

        Ok(Measurement {
            temp: t.temp,
            pres,
            hum,
        })
    }
}
