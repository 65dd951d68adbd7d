//! Fixed-point compensation formulas from the Bosch reference algorithm.
//!
//! These are pure functions over the calibration coefficients; the operand
//! ordering and shift amounts are part of the observable contract and must
//! not be rearranged. Pressure and humidity compensation require the fine
//! temperature produced by [`CalibData::compensate_temperature`] for the
//! same raw sample.

use crate::{CalibData, CompensatedTemp, Humidity, Pressure, Temperature};

impl CalibData {
    /// Converts a raw temperature ADC value to centi-degrees Celsius.
    /// An output of 5123 equals 51.23 °C.
    ///
    /// The returned [`CompensatedTemp`] also carries the fine-temperature
    /// term consumed by pressure and humidity compensation.
    pub fn compensate_temperature(&self, adc_t: u32) -> CompensatedTemp {
        let adc_t = adc_t as i32;
        let var1 = (((adc_t >> 3) - ((self.dig_t1 as i32) << 1)) * (self.dig_t2 as i32)) >> 11;
        let var2 = (((((adc_t >> 4) - (self.dig_t1 as i32))
            * ((adc_t >> 4) - (self.dig_t1 as i32)))
            >> 12)
            * (self.dig_t3 as i32))
            >> 14;
        let t_fine = var1 + var2;

        CompensatedTemp {
            temp: Temperature((t_fine * 5 + 128) >> 8),
            t_fine,
        }
    }

    /// Converts a raw pressure ADC value to Pascal.
    /// An output of 96386 equals 96386 Pa = 963.86 hPa.
    ///
    /// Returns 0 when the calibration-derived divisor collapses to zero
    /// instead of dividing.
    pub fn compensate_pressure(&self, adc_p: u32, t_fine: i32) -> Pressure {
        let adc_p = adc_p as i32;
        let mut var1 = (t_fine >> 1) - 64000;
        let mut var2 = (((var1 >> 2) * (var1 >> 2)) >> 11) * (self.dig_p6 as i32);
        var2 += (var1 * (self.dig_p5 as i32)) << 1;
        var2 = (var2 >> 2) + ((self.dig_p4 as i32) << 16);
        var1 = ((((self.dig_p3 as i32) * (((var1 >> 2) * (var1 >> 2)) >> 13)) >> 3)
            + (((self.dig_p2 as i32) * var1) >> 1))
            >> 18;
        var1 = ((32768 + var1) * (self.dig_p1 as i32)) >> 15;

        if var1 == 0 {
            return Pressure(0);
        }

        let mut p: u32 = (1048576i32.wrapping_sub(adc_p) as u32)
            .wrapping_sub((var2 >> 12) as u32)
            .wrapping_mul(3125);
        // Two division strategies: below 2^31 the numerator is doubled before
        // the divide to keep one extra bit, above it the quotient is doubled
        // after. The two paths round differently at the boundary.
        if p < 0x8000_0000 {
            p = (p << 1).wrapping_div(var1 as u32);
        } else {
            p = p.wrapping_div(var1 as u32).wrapping_mul(2);
        }

        let var1 =
            ((self.dig_p9 as i32) * ((((p >> 3).wrapping_mul(p >> 3)) >> 13) as i32)) >> 12;
        let var2 = (((p >> 2) as i32) * (self.dig_p8 as i32)) >> 13;
        Pressure((p as i32).wrapping_add((var1 + var2 + self.dig_p7 as i32) >> 4) as u32)
    }

    /// Converts a raw humidity ADC value to %RH in Q22.10 fixed point.
    /// An output of 47445 represents 47445 / 1024 = 46.333 %RH.
    ///
    /// The result is clamped to [0, 0x19000000] before the final shift;
    /// negative intermediates therefore clamp to 0 %RH instead of wrapping.
    pub fn compensate_humidity(&self, adc_h: u16, t_fine: i32) -> Humidity {
        let adc_h = adc_h as i32;
        let v = t_fine - 76800;
        let x = (((adc_h << 14) - ((self.dig_h4 as i32) << 20) - ((self.dig_h5 as i32) * v))
            + 16384)
            >> 15;
        let y = ((((((v * (self.dig_h6 as i32)) >> 10)
            * (((v * (self.dig_h3 as i32)) >> 11) + 32768))
            >> 10)
            + 2097152)
            * (self.dig_h2 as i32)
            + 8192)
            >> 14;
        let h = x.wrapping_mul(y);
        let h = h - ((((h >> 15).wrapping_mul(h >> 15) >> 7) * (self.dig_h1 as i32)) >> 4);
        let h = h.clamp(0, 0x1900_0000);
        Humidity((h as u32) >> 12)
    }
}

#[cfg(test)]
mod tests {
    use crate::CalibData;

    /// BMP280 datasheet example coefficients plus a typical BME280 humidity
    /// set.
    fn reference_calib() -> CalibData {
        CalibData {
            dig_t1: 27504,
            dig_t2: 26435,
            dig_t3: -1000,
            dig_p1: 36477,
            dig_p2: -10685,
            dig_p3: 3024,
            dig_p4: 2855,
            dig_p5: 140,
            dig_p6: -7,
            dig_p7: 15500,
            dig_p8: -14600,
            dig_p9: 6000,
            dig_h1: 75,
            dig_h2: 362,
            dig_h3: 0,
            dig_h4: 313,
            dig_h5: 50,
            dig_h6: 30,
        }
    }

    #[test]
    fn temperature_matches_datasheet_vector() {
        let calib = reference_calib();
        let t = calib.compensate_temperature(519888);
        assert_eq!(t.temp.0, 2508); // 25.08 degC
        assert_eq!(t.t_fine, 128422);
    }

    #[test]
    fn temperature_5123_is_51_23_degrees() {
        let calib = reference_calib();
        let t = calib.compensate_temperature(603600);
        assert_eq!(t.temp.0, 5123);
        assert_eq!(t.t_fine, 262302);
        assert_eq!(t.temp.split(), (51, 23));
    }

    #[test]
    fn temperature_is_deterministic() {
        let calib = reference_calib();
        let a = calib.compensate_temperature(519888);
        let b = calib.compensate_temperature(519888);
        assert_eq!((a.temp.0, a.t_fine), (b.temp.0, b.t_fine));
    }

    #[test]
    fn pressure_matches_96386_pa_vector() {
        let calib = reference_calib();
        let t_fine = calib.compensate_temperature(519888).t_fine;
        assert_eq!(calib.compensate_pressure(439901, t_fine).0, 96386);
    }

    #[test]
    fn pressure_depends_on_paired_fine_temperature() {
        let calib = reference_calib();
        let paired = calib.compensate_temperature(519888).t_fine;
        let unpaired = calib.compensate_temperature(603600).t_fine;

        let good = calib.compensate_pressure(439901, paired).0;
        let bad = calib.compensate_pressure(439901, unpaired).0;
        assert_eq!(good, 96386);
        assert_ne!(good, bad);
        assert_eq!(bad, 100249);
    }

    #[test]
    fn pressure_zero_divisor_returns_zero() {
        let calib = CalibData::default();
        assert_eq!(calib.compensate_pressure(415148, 128422).0, 0);
    }

    #[test]
    fn humidity_matches_reference_vector() {
        let calib = reference_calib();
        let t_fine = calib.compensate_temperature(519888).t_fine;
        assert_eq!(calib.compensate_humidity(28000, t_fine).0, 44909);
        assert_eq!(calib.compensate_humidity(32768, t_fine).0, 72045);
    }

    #[test]
    fn humidity_negative_intermediate_clamps_to_zero() {
        let calib = CalibData {
            dig_h4: 1000,
            dig_h2: 1,
            ..CalibData::default()
        };
        assert_eq!(calib.compensate_humidity(0, 76800).0, 0);
    }

    #[test]
    fn humidity_clamps_to_full_scale() {
        let calib = CalibData {
            dig_h2: 102,
            ..CalibData::default()
        };
        // 0x19000000 >> 12 is 100 %RH in Q22.10
        assert_eq!(calib.compensate_humidity(65535, 76800).0, 102400);
    }

    #[test]
    fn humidity_stays_within_output_range() {
        let calib = reference_calib();
        for (adc_h, t_fine) in [(0u16, 128422), (0x7FFF, 150253), (0xFFFF, 262302)] {
            let h = calib.compensate_humidity(adc_h, t_fine).0;
            assert!(h <= 0x1900_0000 >> 12);
        }
    }
}
