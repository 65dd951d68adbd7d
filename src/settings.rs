//! Sensor configuration written during initialization.
//!
//! The default settings reproduce the reference configuration: 16x
//! oversampling on every channel, filter coefficient 8 and a 1 s inactive
//! duration in normal mode.

/// Oversampling settings for temperature, pressure and humidity.
///
/// Higher oversampling rates reduce noise through in-hardware averaging but
/// lengthen the conversion and raise power consumption per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement. Disables the channel entirely.
    Skipped = 0,
    /// 1x oversampling.
    X1 = 1,
    /// 2x oversampling.
    X2 = 2,
    /// 4x oversampling.
    X4 = 3,
    /// 8x oversampling.
    X8 = 4,
    /// 16x oversampling. Highest precision, longest conversion.
    #[default]
    X16 = 5,
}

/// IIR filter coefficient applied to temperature and pressure.
///
/// The filter smooths short-term disturbances such as a slamming door. It has
/// no effect on humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Filter {
    /// Filter off.
    Off = 0,
    /// Coefficient 2.
    X2 = 1,
    /// Coefficient 4.
    X4 = 2,
    /// Coefficient 8.
    #[default]
    X8 = 3,
    /// Coefficient 16.
    X16 = 4,
}

/// Inactive duration between conversions in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Standby {
    /// 0.5 ms
    Micros500 = 0,
    /// 62.5 ms
    Micros62500 = 1,
    /// 125 ms
    Millis125 = 2,
    /// 250 ms
    Millis250 = 3,
    /// 500 ms
    Millis500 = 4,
    /// 1000 ms
    #[default]
    Millis1000 = 5,
    /// 10 ms
    Millis10 = 6,
    /// 20 ms
    Millis20 = 7,
}

/// Register-level configuration applied once by
/// [`Bmx280::init`](crate::Bmx280::init).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// IIR filter coefficient.
    pub filter: Filter,
    /// Normal-mode inactive duration.
    pub standby: Standby,
    /// Temperature oversampling.
    pub temp_osrs: Oversampling,
    /// Pressure oversampling.
    pub pres_osrs: Oversampling,
    /// Humidity oversampling. Ignored by the BMP280.
    pub hum_osrs: Oversampling,
}

impl Settings {
    /// `config` register value: standby in bits [7:5], filter in [4:2].
    pub(crate) fn config_byte(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2)
    }

    /// `ctrl_hum` register value: humidity oversampling in bits [2:0].
    pub(crate) fn ctrl_hum_byte(&self) -> u8 {
        self.hum_osrs as u8
    }

    /// `ctrl_meas` register value with the mode bits left in sleep:
    /// temperature oversampling in bits [7:5], pressure in [4:2].
    pub(crate) fn ctrl_meas_byte(&self) -> u8 {
        ((self.temp_osrs as u8) << 5) | ((self.pres_osrs as u8) << 2)
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the IIR filter coefficient.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.settings.filter = filter;
        self
    }

    /// Sets the normal-mode inactive duration.
    pub fn standby(mut self, standby: Standby) -> Self {
        self.settings.standby = standby;
        self
    }

    /// Sets the temperature oversampling.
    pub fn temp_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.temp_osrs = os;
        self
    }

    /// Sets the pressure oversampling.
    pub fn pres_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.pres_osrs = os;
        self
    }

    /// Sets the humidity oversampling.
    pub fn hum_oversampling(mut self, os: Oversampling) -> Self {
        self.settings.hum_osrs = os;
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Settings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_configuration() {
        let settings = Settings::default();
        assert_eq!(settings.config_byte(), 0xAC);
        assert_eq!(settings.ctrl_hum_byte(), 0x05);
        assert_eq!(settings.ctrl_meas_byte(), 0xB4);
    }

    #[test]
    fn builder_composes_register_bytes() {
        let settings = SettingsBuilder::new()
            .filter(Filter::Off)
            .standby(Standby::Millis125)
            .temp_oversampling(Oversampling::X1)
            .pres_oversampling(Oversampling::X4)
            .hum_oversampling(Oversampling::Skipped)
            .build();
        assert_eq!(settings.config_byte(), 0b010_000_00);
        assert_eq!(settings.ctrl_hum_byte(), 0b000);
        assert_eq!(settings.ctrl_meas_byte(), 0b001_011_00);
    }
}
