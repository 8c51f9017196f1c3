/*!
 * Affine physical <-> raw conversion with range validation
 *
 *   physical = raw * scaling + offset
 *   raw      = (physical - offset) / scaling
 *
 * A declared bound is only checked when it is tighter than what the raw field can represent
 * anyway; a bound at or beyond the representable limit is redundant and skipped. Floating
 * signals treat both bounds as redundant unless `CodecConfig::enforce_float_bounds` is set.
 */

use tracing::warn;

use crate::bit_codec::{field_mask, sign_extend};
use crate::config::CodecConfig;
use crate::descriptor::Signal;
use crate::error::{CodecError, Result};
use crate::float_codec;

/// Largest value of a two's complement field of `length` bits.
pub fn signed_max(length: u32) -> i64 {
    if length >= 64 {
        i64::MAX
    } else {
        (1i64 << (length - 1)) - 1
    }
}

/// Smallest value of a two's complement field of `length` bits.
pub fn signed_min(length: u32) -> i64 {
    if length >= 64 {
        i64::MIN
    } else {
        !signed_max(length)
    }
}

pub fn unsigned_max(length: u32) -> u64 {
    field_mask(length)
}

/// The bounds that actually get checked for a signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeCheck {
    minimum: f64,
    maximum: f64,
    check_min: bool,
    check_max: bool,
}

impl RangeCheck {
    pub fn for_signal(signal: &Signal, config: &CodecConfig) -> Self {
        let minimum = signal.minimum();
        let maximum = signal.maximum();
        let length = signal.bit_length();

        let (check_min, check_max) = if !signal.has_range() {
            (false, false)
        } else if signal.is_floating() {
            (config.enforce_float_bounds, config.enforce_float_bounds)
        } else if signal.is_signed() {
            (
                minimum > signed_min(length) as f64,
                maximum < signed_max(length) as f64,
            )
        } else {
            (minimum > 0.0, maximum < unsigned_max(length) as f64)
        };

        Self {
            minimum,
            maximum,
            check_min,
            check_max,
        }
    }

    pub fn checks_min(&self) -> bool {
        self.check_min
    }

    pub fn checks_max(&self) -> bool {
        self.check_max
    }

    /// True when neither bound is checked.
    pub fn is_redundant(&self) -> bool {
        !self.check_min && !self.check_max
    }

    pub fn validate(&self, signal: &str, value: f64) -> Result<()> {
        let below = self.check_min && value < self.minimum;
        let above = self.check_max && value > self.maximum;
        if below || above {
            return Err(CodecError::RangeViolation {
                signal: signal.to_owned(),
                value,
                minimum: self.minimum,
                maximum: self.maximum,
            });
        }
        Ok(())
    }
}

// Identity steps are skipped so that -0.0 survives an unscaled signal.
fn to_scaled(signal: &Signal, physical: f64) -> f64 {
    let mut scaled = physical;
    if signal.offset() != 0.0 {
        scaled -= signal.offset();
    }
    if signal.scaling() != 1.0 {
        scaled /= signal.scaling();
    }
    scaled
}

fn to_physical(signal: &Signal, number: f64) -> f64 {
    let mut physical = number;
    if signal.scaling() != 1.0 {
        physical *= signal.scaling();
    }
    if signal.offset() != 0.0 {
        physical += signal.offset();
    }
    physical
}

/// Convert a physical (engineering) value to the raw bit pattern that gets packed into
/// the frame.
///
/// Integer signals are rounded to the nearest raw step. A raw value the field cannot hold
/// is saturated to the field's limit, never wrapped. Signed results are returned as
/// `bit_length`-bit two's complement. Floating signals are packed as IEEE-754 without
/// rounding.
pub fn compute_raw_value(signal: &Signal, physical: f64, config: &CodecConfig) -> Result<u64> {
    RangeCheck::for_signal(signal, config).validate(signal.name(), physical)?;

    let scaled = to_scaled(signal, physical);
    if let Some(format) = signal.float_format() {
        return Ok(float_codec::pack(scaled, format));
    }

    let length = signal.bit_length();
    let rounded = scaled.round();
    if signal.is_signed() {
        let raw = (rounded as i64).clamp(signed_min(length), signed_max(length));
        if raw as f64 != rounded {
            warn!(signal = signal.name(), physical, raw, "raw value saturated");
        }
        Ok(raw as u64 & field_mask(length))
    } else {
        let raw = (rounded as u64).min(unsigned_max(length));
        if raw as f64 != rounded {
            warn!(signal = signal.name(), physical, raw, "raw value saturated");
        }
        Ok(raw)
    }
}

/// Numeric value of a raw field before scaling: sign extended, IEEE-754 unpacked or
/// taken as unsigned.
pub fn raw_to_number(signal: &Signal, raw: u64) -> f64 {
    if let Some(format) = signal.float_format() {
        return float_codec::unpack(raw, format);
    }
    if signal.is_signed() {
        sign_extend(raw, signal.bit_length()) as f64
    } else {
        raw as f64
    }
}

/// Convert a raw field to its physical value, checking the active bounds.
///
/// On `RangeViolation` the caller substitutes zero for the signal.
pub fn compute_physical_value(signal: &Signal, raw: u64, config: &CodecConfig) -> Result<f64> {
    let physical = to_physical(signal, raw_to_number(signal, raw));
    let check = RangeCheck::for_signal(signal, config);
    if check.is_redundant() {
        return Ok(physical);
    }
    check.validate(signal.name(), physical)?;
    Ok(physical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Endianness;

    fn unsigned(length: u32) -> Signal {
        Signal::builder("u", 0, length).build().unwrap()
    }

    fn motohawk_temperature() -> Signal {
        Signal::builder("Temperature", 0, 12)
            .endianness(Endianness::Motorola)
            .signed(true)
            .scaling(0.01)
            .offset(250.0)
            .range(229.52, 270.47)
            .build()
            .unwrap()
    }

    fn default_config() -> CodecConfig {
        CodecConfig::default()
    }

    // ---------------------------------------------------------------
    // Representable limits
    // ---------------------------------------------------------------

    #[test]
    fn test_representable_limits() {
        assert_eq!(signed_min(8), -128);
        assert_eq!(signed_max(8), 127);
        assert_eq!(signed_min(1), -1);
        assert_eq!(signed_max(1), 0);
        assert_eq!(signed_min(64), i64::MIN);
        assert_eq!(signed_max(64), i64::MAX);
        assert_eq!(unsigned_max(8), 255);
        assert_eq!(unsigned_max(64), u64::MAX);
    }

    // ---------------------------------------------------------------
    // Bound redundancy
    // ---------------------------------------------------------------

    #[test]
    fn test_full_unsigned_range_is_redundant() {
        let signal = Signal::builder("u8", 0, 8).range(0.0, 255.0).build().unwrap();
        let check = RangeCheck::for_signal(&signal, &default_config());
        assert!(check.is_redundant());
        for physical in [-1000.0, 0.0, 128.0, 255.0, 1e9] {
            assert!(
                compute_raw_value(&signal, physical, &default_config()).is_ok(),
                "physical {physical}"
            );
        }
    }

    #[test]
    fn test_unsigned_partial_bounds() {
        let signal = Signal::builder("u8", 0, 8).range(10.0, 255.0).build().unwrap();
        let check = RangeCheck::for_signal(&signal, &default_config());
        assert!(check.checks_min());
        assert!(!check.checks_max());
    }

    #[test]
    fn test_signed_bounds_against_field_limits() {
        let full = Signal::builder("s8", 0, 8)
            .signed(true)
            .range(-128.0, 127.0)
            .build()
            .unwrap();
        assert!(RangeCheck::for_signal(&full, &default_config()).is_redundant());

        let narrow = Signal::builder("s8", 0, 8)
            .signed(true)
            .range(-10.0, 127.0)
            .build()
            .unwrap();
        let check = RangeCheck::for_signal(&narrow, &default_config());
        assert!(check.checks_min());
        assert!(!check.checks_max());
    }

    #[test]
    fn test_equal_bounds_disable_checking() {
        let signal = Signal::builder("u8", 0, 8).range(5.0, 5.0).build().unwrap();
        assert!(RangeCheck::for_signal(&signal, &default_config()).is_redundant());
        assert_eq!(compute_raw_value(&signal, 200.0, &default_config()), Ok(200));
    }

    #[test]
    fn test_float_bounds_unchecked_by_default() {
        let signal = Signal::builder("f", 0, 32)
            .floating(true)
            .range(0.0, 1.0)
            .build()
            .unwrap();
        let raw = compute_raw_value(&signal, 50.0, &default_config()).unwrap();
        assert_eq!(raw, 50.0f32.to_bits() as u64);
        assert_eq!(compute_physical_value(&signal, raw, &default_config()), Ok(50.0));
    }

    #[test]
    fn test_float_bounds_enforced_when_configured() {
        let signal = Signal::builder("f", 0, 32)
            .floating(true)
            .range(0.0, 1.0)
            .build()
            .unwrap();
        let config = CodecConfig::new().with_float_bounds(true);
        assert!(matches!(
            compute_raw_value(&signal, 50.0, &config),
            Err(CodecError::RangeViolation { .. })
        ));
        assert!(compute_raw_value(&signal, 0.5, &config).is_ok());
    }

    // ---------------------------------------------------------------
    // Encode
    // ---------------------------------------------------------------

    #[test]
    fn test_compute_raw_unsigned() {
        // AverageRadius: factor=0.1, offset=0, unsigned 6-bit
        let signal = Signal::builder("AverageRadius", 6, 6)
            .endianness(Endianness::Motorola)
            .scaling(0.1)
            .range(0.0, 5.0)
            .build()
            .unwrap();
        assert_eq!(compute_raw_value(&signal, 1.8, &default_config()), Ok(18));
    }

    #[test]
    fn test_compute_raw_signed_negative() {
        // (244.14 - 250) / 0.01 = -586 -> 12-bit two's complement 0xDB6
        let signal = motohawk_temperature();
        assert_eq!(compute_raw_value(&signal, 244.14, &default_config()), Ok(0xDB6));
    }

    #[test]
    fn test_scaling_with_offset_roundtrip() {
        let signal = Signal::builder("s", 0, 8).scaling(0.5).offset(10.0).build().unwrap();
        assert_eq!(compute_physical_value(&signal, 20, &default_config()), Ok(20.0));
        assert_eq!(compute_raw_value(&signal, 20.0, &default_config()), Ok(20));
    }

    #[test]
    fn test_range_rejection_on_encode() {
        let signal = Signal::builder("pct", 0, 8).range(0.0, 100.0).build().unwrap();
        match compute_raw_value(&signal, 150.0, &default_config()) {
            Err(CodecError::RangeViolation {
                signal,
                value,
                minimum,
                maximum,
            }) => {
                assert_eq!(signal, "pct");
                assert_eq!(value, 150.0);
                assert_eq!(minimum, 0.0);
                assert_eq!(maximum, 100.0);
            }
            other => panic!("expected RangeViolation, got {other:?}"),
        }
        let raw = compute_raw_value(&signal, 50.0, &default_config()).unwrap();
        assert_eq!(raw, 50);
        assert_eq!(compute_physical_value(&signal, raw, &default_config()), Ok(50.0));
    }

    #[test]
    fn test_out_of_field_values_saturate() {
        let signal = unsigned(8);
        assert_eq!(compute_raw_value(&signal, 300.0, &default_config()), Ok(255));
        assert_eq!(compute_raw_value(&signal, -5.0, &default_config()), Ok(0));

        let signed = Signal::builder("s8", 0, 8).signed(true).build().unwrap();
        assert_eq!(compute_raw_value(&signed, 1000.0, &default_config()), Ok(0x7F));
        assert_eq!(compute_raw_value(&signed, -1000.0, &default_config()), Ok(0x80));
    }

    #[test]
    fn test_signed_64bit_extremes() {
        let signal = Signal::builder("s64", 0, 64).signed(true).build().unwrap();
        assert_eq!(
            compute_raw_value(&signal, -1000.0, &default_config()),
            Ok((-1000i64) as u64)
        );
        assert_eq!(
            compute_physical_value(&signal, 0x8000_0000_0000_0000, &default_config()),
            Ok(-9223372036854775808.0)
        );
    }

    #[test]
    fn test_float_signal_not_rounded() {
        let signal = Signal::builder("f", 0, 64)
            .floating(true)
            .scaling(2.0)
            .offset(1.0)
            .build()
            .unwrap();
        let raw = compute_raw_value(&signal, 4.5, &default_config()).unwrap();
        assert_eq!(raw, 1.75f64.to_bits());
        assert_eq!(compute_physical_value(&signal, raw, &default_config()), Ok(4.5));
    }

    // ---------------------------------------------------------------
    // Decode
    // ---------------------------------------------------------------

    #[test]
    fn test_decode_sign_extension() {
        let signal = Signal::builder("s8", 0, 8).signed(true).build().unwrap();
        assert_eq!(compute_physical_value(&signal, 0xFF, &default_config()), Ok(-1.0));
        assert_eq!(compute_physical_value(&signal, 0x80, &default_config()), Ok(-128.0));
    }

    #[test]
    fn test_decode_motohawk_temperature() {
        let signal = motohawk_temperature();
        let physical = compute_physical_value(&signal, 0xDB6, &default_config()).unwrap();
        assert!((physical - 244.14).abs() < 1e-9, "got {physical}");
    }

    #[test]
    fn test_decode_range_violation() {
        let signal = Signal::builder("pct", 0, 8).range(0.0, 100.0).build().unwrap();
        assert!(matches!(
            compute_physical_value(&signal, 200, &default_config()),
            Err(CodecError::RangeViolation { .. })
        ));
        assert_eq!(compute_physical_value(&signal, 100, &default_config()), Ok(100.0));
    }

    #[test]
    fn test_decode_float_special_values_pass_through() {
        let signal = Signal::builder("f", 0, 32).floating(true).build().unwrap();
        let config = default_config();
        assert_eq!(
            compute_physical_value(&signal, 0x7F80_0000, &config),
            Ok(f64::INFINITY)
        );
        assert!(compute_physical_value(&signal, 0x7FFF_FFFF, &config)
            .unwrap()
            .is_nan());
        let negative_zero = compute_physical_value(&signal, 0x8000_0000, &config).unwrap();
        assert!(negative_zero == 0.0 && negative_zero.is_sign_negative());
    }
}
