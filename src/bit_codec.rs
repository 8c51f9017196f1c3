/*!
 * Defines the layout in bits of a signal inside the 64-bit frame word so that it can be
 * reused to insert/extract raw values
 *
 * The frame word is the 8 payload bytes read as a little-endian `u64` (byte 0 is the least
 * significant byte). Intel signals are addressed directly in that word. Motorola signals are
 * addressed in its byte-reversed view, where DBC start bit `s` (the field's MSB) maps to
 * `8 * (7 - s / 8) + s % 8`.
 */

/// Bit numbering of a signal within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Big-endian: start bit is the MSB, byte order reversed.
    Motorola,
    /// Little-endian: start bit is the LSB.
    #[default]
    Intel,
}

pub const FRAME_BITS: u32 = 64;

/// Mask covering the low `length` bits. A length of 64 or more gives all ones.
pub fn field_mask(length: u32) -> u64 {
    if length >= FRAME_BITS {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Mask of the frame word bits carried by a payload of `dlc` bytes.
pub fn payload_mask(dlc: u8) -> u64 {
    field_mask(8 * dlc as u32)
}

/// The frame word as seen by a signal of the given endianness. Applying it twice is a no-op.
fn view(frame: u64, endianness: Endianness) -> u64 {
    match endianness {
        Endianness::Intel => frame,
        Endianness::Motorola => frame.swap_bytes(),
    }
}

/// Shift of the field's LSB within the endianness view of the frame word.
///
/// Returns `None` when the field does not fit in 64 bits: zero or oversized length,
/// start bit past the end, or a Motorola field running past the last byte.
pub fn effective_start(start_bit: u32, length: u32, endianness: Endianness) -> Option<u32> {
    if start_bit >= FRAME_BITS || length == 0 || length > FRAME_BITS {
        return None;
    }
    let start = match endianness {
        Endianness::Intel => start_bit,
        Endianness::Motorola => (8 * (7 - start_bit / 8) + start_bit % 8).checked_sub(length - 1)?,
    };
    if start + length > FRAME_BITS {
        return None;
    }
    Some(start)
}

/// Precomputed position of one signal in the frame word.
///
/// Built once per signal descriptor. The same layout is used by both `extract` (decode)
/// and `insert` (encode), so they are inverses by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    start_bit: u32,
    length: u32,
    endianness: Endianness,
    shift: u32,
    mask: u64,
}

impl BitLayout {
    pub fn new(start_bit: u32, length: u32, endianness: Endianness) -> Option<Self> {
        let shift = effective_start(start_bit, length, endianness)?;
        Some(Self {
            start_bit,
            length,
            endianness,
            shift,
            mask: field_mask(length),
        })
    }

    pub fn start_bit(&self) -> u32 {
        self.start_bit
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Shift applied in the endianness view of the frame word.
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Mask of the raw value, `length` low bits set.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Bits of the frame word this field occupies.
    pub fn occupied(&self) -> u64 {
        view(self.mask << self.shift, self.endianness)
    }

    /// Extract the raw unsigned value of the field from the frame word.
    ///
    /// `shift` is always below 64 (a 64-bit field has shift 0), so the shift never overflows.
    pub fn extract(&self, frame: u64) -> u64 {
        (view(frame, self.endianness) >> self.shift) & self.mask
    }

    /// Insert a raw value into the frame word.
    ///
    /// The value is truncated to the field width. Field bits are cleared before writing so
    /// repacking over old data works; every bit outside the field is left as it was.
    pub fn insert(&self, frame: u64, value: u64) -> u64 {
        let field = self.mask << self.shift;
        let word = view(frame, self.endianness);
        let word = (word & !field) | ((value & self.mask) << self.shift);
        view(word, self.endianness)
    }
}

/// Extract `length` bits starting at `start_bit`. `None` if the field does not fit.
pub fn extract(frame: u64, start_bit: u32, length: u32, endianness: Endianness) -> Option<u64> {
    BitLayout::new(start_bit, length, endianness).map(|layout| layout.extract(frame))
}

/// Insert `value` into the field at `start_bit`. `None` if the field does not fit.
pub fn insert(
    frame: u64,
    start_bit: u32,
    length: u32,
    endianness: Endianness,
    value: u64,
) -> Option<u64> {
    BitLayout::new(start_bit, length, endianness).map(|layout| layout.insert(frame, value))
}

/// Smallest of 8/16/32/64 that holds `length` bits.
pub fn natural_width(length: u32) -> u32 {
    match length {
        0..=8 => 8,
        9..=16 => 16,
        17..=32 => 32,
        _ => 64,
    }
}

/// Complement of the field mask, truncated to the natural width of the field.
pub fn extension_mask(length: u32) -> u64 {
    !field_mask(length) & field_mask(natural_width(length))
}

/// Interpret the low `length` bits of `raw` as a two's complement integer.
pub fn sign_extend(raw: u64, length: u32) -> i64 {
    if length == 0 {
        return 0;
    }
    let raw = raw & field_mask(length);
    let top = 1u64 << (length.min(FRAME_BITS) - 1);
    let value = if raw & top != 0 {
        raw | extension_mask(length)
    } else {
        raw
    };
    match natural_width(length) {
        8 => value as u8 as i8 as i64,
        16 => value as u16 as i16 as i64,
        32 => value as u32 as i32 as i64,
        _ => value as i64,
    }
}
