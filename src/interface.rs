//! Register-level transport between the driver and the sensor.
//!
//! The BMx280 exposes the same register map over I2C and 4-wire SPI. The
//! [`RegisterBus`] trait captures the two operations the driver needs; the
//! interface type wrapping the concrete bus is chosen once at construction.

use embedded_hal::i2c;
use embedded_hal::spi::{Operation, SpiDevice};

/// Byte-oriented register access as required by the driver.
pub trait RegisterBus {
    /// Bus error type surfaced through [`Bmx280Error::Transport`](crate::error::Bmx280Error).
    type Error;

    /// Burst-reads `buf.len()` bytes starting at register `reg`.
    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes a single `value` to register `reg`.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;
}

/// I2C device address, determined by the SDO pin strap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    /// SDO tied to GND.
    SdoGnd = 0x76,
    /// SDO tied to V<sub>DDIO</sub>.
    SdoVddio = 0x77,
}

/// [`RegisterBus`] over an I2C bus.
#[derive(Debug)]
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> I2cInterface<I2C>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Wraps an I2C peripheral for the sensor at `address`.
    pub fn new(i2c: I2C, address: Address) -> Self {
        I2cInterface {
            i2c,
            address: address as u8,
        }
    }

    /// Releases the underlying I2C peripheral.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterBus for I2cInterface<I2C>
where
    I2C: i2c::I2c<Error = E>,
{
    type Error = E;

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[reg], buf)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[reg, value])
    }
}

/// [`RegisterBus`] over a 4-wire SPI device.
///
/// Bit 7 of the control byte selects the transfer direction: set for reads,
/// cleared for writes.
#[derive(Debug)]
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI, E> SpiInterface<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    /// Wraps an SPI device with the sensor behind its chip select.
    pub fn new(spi: SPI) -> Self {
        SpiInterface { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI, E> RegisterBus for SpiInterface<SPI>
where
    SPI: SpiDevice<Error = E>,
{
    type Error = E;

    fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), E> {
        self.spi
            .transaction(&mut [Operation::Write(&[reg | 0x80]), Operation::Read(buf)])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), E> {
        self.spi.write(&[reg & 0x7F, value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn i2c_read_is_write_read_of_register() {
        let mut i2c = I2cMock::new(&[I2cTransaction::write_read(
            0x76,
            vec![0xD0],
            vec![0x58, 0x00],
        )]);
        let mut iface = I2cInterface::new(i2c.clone(), Address::SdoGnd);

        let mut buf = [0u8; 2];
        iface.read_registers(0xD0, &mut buf).unwrap();
        assert_eq!(buf, [0x58, 0x00]);
        i2c.done();
    }

    #[test]
    fn i2c_write_prepends_register_address() {
        let mut i2c = I2cMock::new(&[I2cTransaction::write(0x77, vec![0xF4, 0xB5])]);
        let mut iface = I2cInterface::new(i2c.clone(), Address::SdoVddio);

        iface.write_register(0xF4, 0xB5).unwrap();
        i2c.done();
    }

    #[test]
    fn spi_read_sets_direction_bit() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xF7]),
            SpiTransaction::read_vec(vec![0x12, 0x34]),
            SpiTransaction::transaction_end(),
        ]);
        let mut iface = SpiInterface::new(spi.clone());

        let mut buf = [0u8; 2];
        iface.read_registers(0x77, &mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34]);
        spi.done();
    }

    #[test]
    fn spi_write_clears_direction_bit() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x74, 0xB5]),
            SpiTransaction::transaction_end(),
        ]);
        let mut iface = SpiInterface::new(spi.clone());

        iface.write_register(0xF4, 0xB5).unwrap();
        spi.done();
    }
}
