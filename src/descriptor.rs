/*!
 * Immutable descriptions of databases, messages and signals
 *
 * Every constructor validates its invariants and fails with `CodecError::InvalidDescriptor`,
 * so the codec never has to re-check a descriptor per call.
 */

use tracing::debug;

pub use crate::bit_codec::Endianness;
use crate::bit_codec::{payload_mask, BitLayout};
use crate::error::{CodecError, Result};
use crate::float_codec::FloatFormat;

/// One named bit field of a message and the affine transform to its physical value.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    name: String,
    layout: BitLayout,
    is_signed: bool,
    is_floating: bool,
    scaling: f64,
    offset: f64,
    minimum: f64,
    maximum: f64,
    units: String,
    comment: Option<String>,
}

impl Signal {
    /// Start describing a signal. Defaults: Intel, unsigned, integer, scaling 1, offset 0,
    /// no range check.
    pub fn builder(name: impl Into<String>, start_bit: u32, bit_length: u32) -> SignalBuilder {
        SignalBuilder {
            name: name.into(),
            start_bit,
            bit_length,
            endianness: Endianness::Intel,
            is_signed: false,
            is_floating: false,
            scaling: 1.0,
            offset: 0.0,
            minimum: 0.0,
            maximum: 0.0,
            units: String::new(),
            comment: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_bit(&self) -> u32 {
        self.layout.start_bit()
    }

    pub fn bit_length(&self) -> u32 {
        self.layout.length()
    }

    pub fn endianness(&self) -> Endianness {
        self.layout.endianness()
    }

    pub fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    pub fn is_floating(&self) -> bool {
        self.is_floating
    }

    /// IEEE-754 format of a floating signal, `None` for integer signals.
    pub fn float_format(&self) -> Option<FloatFormat> {
        if self.is_floating {
            FloatFormat::for_width(self.bit_length())
        } else {
            None
        }
    }

    pub fn scaling(&self) -> f64 {
        self.scaling
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// False when `minimum == maximum`, the sentinel that disables range checking.
    pub fn has_range(&self) -> bool {
        self.minimum != self.maximum
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Builder for `Signal`.
///
/// Uses the consuming-self pattern; `build` validates everything at once.
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    name: String,
    start_bit: u32,
    bit_length: u32,
    endianness: Endianness,
    is_signed: bool,
    is_floating: bool,
    scaling: f64,
    offset: f64,
    minimum: f64,
    maximum: f64,
    units: String,
    comment: Option<String>,
}

impl SignalBuilder {
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn signed(mut self, is_signed: bool) -> Self {
        self.is_signed = is_signed;
        self
    }

    pub fn floating(mut self, is_floating: bool) -> Self {
        self.is_floating = is_floating;
        self
    }

    pub fn scaling(mut self, scaling: f64) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Declared physical bounds. Equal bounds disable range checking.
    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn build(self) -> Result<Signal> {
        let name = self.name.as_str();
        if self.bit_length == 0 {
            return Err(CodecError::invalid(name, "bit length of 0"));
        }
        if self.bit_length > 64 {
            return Err(CodecError::invalid(
                name,
                format!("bit length {} exceeds 64", self.bit_length),
            ));
        }
        if self.is_floating && FloatFormat::for_width(self.bit_length).is_none() {
            return Err(CodecError::invalid(
                name,
                format!(
                    "floating point signal must be 32 or 64 bits, has length {}",
                    self.bit_length
                ),
            ));
        }
        if self.scaling == 0.0 || !self.scaling.is_finite() {
            return Err(CodecError::invalid(
                name,
                format!("invalid scaling factor {}", self.scaling),
            ));
        }
        if !self.offset.is_finite() {
            return Err(CodecError::invalid(
                name,
                format!("invalid offset {}", self.offset),
            ));
        }
        if self.minimum.is_nan() || self.maximum.is_nan() {
            return Err(CodecError::invalid(name, "range bound is NaN"));
        }
        let layout = BitLayout::new(self.start_bit, self.bit_length, self.endianness)
            .ok_or_else(|| {
                CodecError::invalid(
                    name,
                    format!(
                        "start bit {} length {} ({:?}) does not fit in a 64-bit frame",
                        self.start_bit, self.bit_length, self.endianness
                    ),
                )
            })?;

        Ok(Signal {
            name: self.name,
            layout,
            is_signed: self.is_signed,
            is_floating: self.is_floating,
            scaling: self.scaling,
            offset: self.offset,
            minimum: self.minimum,
            maximum: self.maximum,
            units: self.units,
            comment: self.comment,
        })
    }
}

/// A CAN message: arbitration id, payload length and its signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: u32,
    extended: bool,
    name: String,
    dlc: u8,
    signals: Vec<Signal>,
}

impl Message {
    pub const MAX_STANDARD_ID: u32 = 0x7FF;
    pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;
    pub const MAX_DLC: u8 = 8;

    /// Build a message. Ids above 0x7FF are extended (29-bit).
    pub fn new(id: u32, name: impl Into<String>, dlc: u8, signals: Vec<Signal>) -> Result<Self> {
        Self::build(id, id > Self::MAX_STANDARD_ID, name.into(), dlc, signals)
    }

    /// Build a message with a 29-bit id, even when the id value would fit in 11 bits.
    pub fn new_extended(
        id: u32,
        name: impl Into<String>,
        dlc: u8,
        signals: Vec<Signal>,
    ) -> Result<Self> {
        Self::build(id, true, name.into(), dlc, signals)
    }

    fn build(id: u32, extended: bool, name: String, dlc: u8, signals: Vec<Signal>) -> Result<Self> {
        if id > Self::MAX_EXTENDED_ID {
            return Err(CodecError::invalid(
                &name,
                format!("id 0x{id:X} does not fit in 29 bits"),
            ));
        }
        if dlc > Self::MAX_DLC {
            return Err(CodecError::invalid(
                &name,
                format!("dlc {dlc} exceeds {}", Self::MAX_DLC),
            ));
        }

        let payload = payload_mask(dlc);
        let mut used = 0u64;
        for (i, signal) in signals.iter().enumerate() {
            if signals[..i].iter().any(|other| other.name == signal.name) {
                return Err(CodecError::invalid(
                    &name,
                    format!("duplicate signal '{}'", signal.name),
                ));
            }
            let occupied = signal.layout.occupied();
            if occupied & !payload != 0 {
                return Err(CodecError::invalid(
                    &name,
                    format!("signal '{}' extends past the {dlc}-byte payload", signal.name),
                ));
            }
            if occupied & used != 0 {
                debug!(message_name = %name, signal = %signal.name, "signal overlaps an earlier signal");
            }
            used |= occupied;
        }

        Ok(Self {
            id,
            extended,
            name,
            dlc,
            signals,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|signal| signal.name == name)
    }

    /// Signals in layout order: longest first, declaration order among equals.
    pub fn signals_by_size(&self) -> Vec<&Signal> {
        let mut signals: Vec<&Signal> = self.signals.iter().collect();
        signals.sort_by(|a, b| b.bit_length().cmp(&a.bit_length()));
        signals
    }
}

/// Collection of messages, unique by id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Database {
    messages: Vec<Message>,
}

impl Database {
    pub fn new(messages: Vec<Message>) -> Result<Self> {
        for (i, message) in messages.iter().enumerate() {
            if messages[..i].iter().any(|other| other.id == message.id) {
                return Err(CodecError::invalid(
                    &message.name,
                    format!("duplicate message id 0x{:X}", message.id),
                ));
            }
        }
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_by_id(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn message_by_name(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.name == name)
    }

    /// Messages in ascending id order.
    pub fn messages_by_id(&self) -> Vec<&Message> {
        let mut messages: Vec<&Message> = self.messages.iter().collect();
        messages.sort_by_key(|message| message.id);
        messages
    }
}
