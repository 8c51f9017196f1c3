/*!
 * Generalized IEEE-754 packing of floating point signals into raw bit patterns
 *
 * Special cases:
 *
 * Zero and sign bit set -> Negative Zero
 *
 * All Exponent Bits Set
 * - Mantissa is zero and sign bit is zero ->  Infinity
 * - Mantissa is zero and sign bit is on   -> -Infinity
 * - Mantissa is non-zero -> NaN
 */

use crate::bit_codec::field_mask;

/// Bit widths of an IEEE-754 binary interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatFormat {
    pub total_bits: u32,
    pub exponent_bits: u32,
}

impl FloatFormat {
    pub const BINARY32: FloatFormat = FloatFormat {
        total_bits: 32,
        exponent_bits: 8,
    };
    pub const BINARY64: FloatFormat = FloatFormat {
        total_bits: 64,
        exponent_bits: 11,
    };

    /// Format for a floating signal of `bit_length` bits, if one exists.
    pub fn for_width(bit_length: u32) -> Option<FloatFormat> {
        match bit_length {
            32 => Some(Self::BINARY32),
            64 => Some(Self::BINARY64),
            _ => None,
        }
    }

    /// Mantissa bits, excluding the implicit leading one.
    pub fn significand_bits(&self) -> u32 {
        self.total_bits - self.exponent_bits - 1
    }

    fn exponent_all_ones(&self) -> u64 {
        field_mask(self.exponent_bits)
    }

    fn bias(&self) -> i64 {
        (1i64 << (self.exponent_bits - 1)) - 1
    }

    fn sign_bit(&self) -> u64 {
        1u64 << (self.total_bits - 1)
    }

    fn infinity(&self) -> u64 {
        self.exponent_all_ones() << self.significand_bits()
    }
}

/// Pack a floating point number into the given IEEE-754 format.
///
/// Finite values are normalized into `[1, 2)` by repeated halving/doubling and the
/// fraction is quantized with a half-ULP bias. Exponents past the top of the format pack
/// as infinity; exponents below the bottom pack as subnormals, or signed zero when no
/// mantissa bits survive.
pub fn pack(value: f64, format: FloatFormat) -> u64 {
    let significand_bits = format.significand_bits();
    let sign = if value.is_sign_negative() {
        format.sign_bit()
    } else {
        0
    };

    if value == 0.0 {
        return sign;
    }
    if value.is_nan() {
        // sign is don't-care for NaN, always 0
        return format.infinity() | field_mask(significand_bits);
    }
    if value.is_infinite() {
        return sign | format.infinity();
    }

    let mut fnorm = value.abs();
    let mut shift: i64 = 0;
    while fnorm >= 2.0 {
        fnorm /= 2.0;
        shift += 1;
    }
    while fnorm < 1.0 {
        fnorm *= 2.0;
        shift -= 1;
    }

    let mut exponent = shift + format.bias();
    if exponent <= 0 {
        return sign | subnormal_significand(fnorm, exponent, significand_bits);
    }

    let scale = (1u64 << significand_bits) as f64 + 0.5;
    let mut significand = ((fnorm - 1.0) * scale) as u64;
    if significand > field_mask(significand_bits) {
        // rounded up into the next binade
        significand = 0;
        exponent += 1;
    }
    if exponent >= format.exponent_all_ones() as i64 {
        return sign | format.infinity();
    }

    sign | ((exponent as u64) << significand_bits) | significand
}

/// Mantissa of a value whose biased exponent is `exponent <= 0`, given its normalized
/// form `fnorm` in `[1, 2)`. A result of `1 << significand_bits` is the smallest normal.
fn subnormal_significand(fnorm: f64, exponent: i64, significand_bits: u32) -> u64 {
    let mut shift = exponent - 1 + significand_bits as i64;
    if shift < -1 {
        return 0;
    }
    let mut scaled = fnorm;
    while shift > 0 {
        scaled *= 2.0;
        shift -= 1;
    }
    if shift < 0 {
        scaled /= 2.0;
    }
    scaled.round() as u64
}

/// Unpack a floating point number from the given IEEE-754 format.
///
/// Bits above `total_bits` are ignored.
pub fn unpack(bits: u64, format: FloatFormat) -> f64 {
    let significand_bits = format.significand_bits();
    let bits = bits & field_mask(format.total_bits);
    let negative = bits & format.sign_bit() != 0;
    let exponent = (bits >> significand_bits) & format.exponent_all_ones();
    let significand = bits & field_mask(significand_bits);

    if exponent == 0 && significand == 0 {
        return if negative { -0.0 } else { 0.0 };
    }
    if exponent == format.exponent_all_ones() {
        if significand != 0 {
            return f64::NAN;
        }
        return if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let mut result = significand as f64 / (1u64 << significand_bits) as f64;
    let mut shift = if exponent == 0 {
        1 - format.bias()
    } else {
        result += 1.0;
        exponent as i64 - format.bias()
    };
    while shift > 0 {
        result *= 2.0;
        shift -= 1;
    }
    while shift < 0 {
        result /= 2.0;
        shift += 1;
    }

    if negative {
        -result
    } else {
        result
    }
}

pub fn pack_f32(value: f32) -> u32 {
    pack(value as f64, FloatFormat::BINARY32) as u32
}

pub fn unpack_f32(bits: u32) -> f32 {
    unpack(bits as u64, FloatFormat::BINARY32) as f32
}

pub fn pack_f64(value: f64) -> u64 {
    pack(value, FloatFormat::BINARY64)
}

pub fn unpack_f64(bits: u64) -> f64 {
    unpack(bits, FloatFormat::BINARY64)
}
