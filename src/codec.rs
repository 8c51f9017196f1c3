/*!
 * Encodes and decodes whole frames by running every signal of a message through the
 * bit, float and scaling codecs
 *
 * Encoding is all-or-nothing: the first signal that fails aborts the message and no frame
 * is produced. Decoding is best-effort: a failing signal gets value 0.0 and its error, the
 * rest of the message is still decoded.
 */

use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::descriptor::{Database, Message};
use crate::error::{CodecError, Result};
use crate::frame::CanFrame;
use crate::scaling::{compute_physical_value, compute_raw_value};

/// One decoded signal. `value` is 0.0 whenever `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    pub name: String,
    pub raw: u64,
    pub value: f64,
    pub error: Option<CodecError>,
}

impl DecodedSignal {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Decoded values of one message, in the message's signal order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub id: u32,
    pub name: String,
    pub signals: Vec<DecodedSignal>,
}

impl DecodedMessage {
    pub fn signal(&self, name: &str) -> Option<&DecodedSignal> {
        self.signals.iter().find(|signal| signal.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.signal(name).map(|signal| signal.value)
    }

    /// True when every signal decoded without error.
    pub fn is_complete(&self) -> bool {
        self.signals.iter().all(DecodedSignal::is_ok)
    }

    pub fn errors(&self) -> impl Iterator<Item = &CodecError> {
        self.signals.iter().filter_map(|signal| signal.error.as_ref())
    }
}

fn check_signal_names(message: &Message, signals: &[(&str, f64)]) -> Result<()> {
    for (signal_name, _) in signals {
        if message.signal(signal_name).is_none() {
            return Err(CodecError::UnknownSignal {
                message: message.name().to_owned(),
                signal: (*signal_name).to_owned(),
            });
        }
    }
    Ok(())
}

/// Encode a full message from signal name/value pairs into a `CanFrame`.
///
/// Signals missing from `signals` stay raw zero. When a name appears twice the last value
/// wins. Returns an error if any name is not a signal of `message`, or if any value fails
/// its range check.
pub fn encode_message(
    message: &Message,
    signals: &[(&str, f64)],
    config: &CodecConfig,
) -> Result<CanFrame> {
    check_signal_names(message, signals)?;

    let mut word = 0u64;
    for signal in message.signals() {
        let Some((_, physical)) = signals
            .iter()
            .rev()
            .find(|(name, _)| *name == signal.name())
        else {
            continue;
        };
        let raw = compute_raw_value(signal, *physical, config).inspect_err(|e| {
            debug!(message_name = message.name(), error = %e, "encode aborted");
        })?;
        trace!(signal = signal.name(), physical, raw, "packed signal");
        word = signal.layout().insert(word, raw);
    }

    let mut frame = CanFrame::from_word(message.id(), message.dlc(), word);
    frame.is_extended = message.is_extended();
    Ok(frame)
}

/// Decode every signal of `message` from `frame`.
///
/// Fails only when the frame is shorter than the message (unless the config allows it);
/// per-signal failures are reported inside the result.
pub fn decode_message(
    message: &Message,
    frame: &CanFrame,
    config: &CodecConfig,
) -> Result<DecodedMessage> {
    if frame.len < message.dlc() && !config.allow_short_frames {
        return Err(CodecError::ShortFrame {
            id: frame.id,
            expected: message.dlc(),
            actual: frame.len,
        });
    }

    let word = frame.word();
    let signals = message
        .signals()
        .iter()
        .map(|signal| {
            let raw = signal.layout().extract(word);
            trace!(signal = signal.name(), raw, "extracted signal");
            match compute_physical_value(signal, raw, config) {
                Ok(value) => DecodedSignal {
                    name: signal.name().to_owned(),
                    raw,
                    value,
                    error: None,
                },
                Err(e) => {
                    debug!(message_name = message.name(), error = %e, "signal decode failed");
                    DecodedSignal {
                        name: signal.name().to_owned(),
                        raw,
                        value: 0.0,
                        error: Some(e),
                    }
                }
            }
        })
        .collect();

    Ok(DecodedMessage {
        id: message.id(),
        name: message.name().to_owned(),
        signals,
    })
}

/// Builder for constructing encoded CAN frames signal-by-signal.
///
/// Uses the consuming-self pattern so that a failing `.set()` drops the half-built frame.
pub struct FrameBuilder<'a> {
    message: &'a Message,
    config: CodecConfig,
    frame: CanFrame,
    word: u64,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self::with_config(message, CodecConfig::default())
    }

    pub fn with_config(message: &'a Message, config: CodecConfig) -> Self {
        let mut frame = CanFrame::from_word(message.id(), message.dlc(), 0);
        frame.is_extended = message.is_extended();
        Self {
            message,
            config,
            frame,
            word: 0,
        }
    }

    /// Set a signal by name. Returns Err if the name is unknown or the value is out of range.
    pub fn set(mut self, signal_name: &str, physical_value: f64) -> Result<Self> {
        let signal = self
            .message
            .signal(signal_name)
            .ok_or_else(|| CodecError::UnknownSignal {
                message: self.message.name().to_owned(),
                signal: signal_name.to_owned(),
            })?;
        let raw = compute_raw_value(signal, physical_value, &self.config)?;
        self.word = signal.layout().insert(self.word, raw);
        Ok(self)
    }

    pub fn timestamp(mut self, ts: f64) -> Self {
        self.frame.timestamp = ts;
        self
    }

    pub fn channel(mut self, ch: impl Into<String>) -> Self {
        self.frame.channel = ch.into();
        self
    }

    /// Consume the builder and produce the finished frame.
    pub fn build(self) -> CanFrame {
        let mut frame = self.frame;
        frame.data = self.word.to_le_bytes();
        frame
    }
}

/// Encoder/decoder over a whole database, routing by message name or frame id.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec<'a> {
    database: &'a Database,
    config: CodecConfig,
}

impl<'a> FrameCodec<'a> {
    pub fn new(database: &'a Database) -> Self {
        Self::with_config(database, CodecConfig::default())
    }

    pub fn with_config(database: &'a Database, config: CodecConfig) -> Self {
        Self { database, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode(&self, message_name: &str, signals: &[(&str, f64)]) -> Result<CanFrame> {
        let message = self
            .database
            .message_by_name(message_name)
            .ok_or_else(|| CodecError::UnknownMessageName(message_name.to_owned()))?;
        encode_message(message, signals, &self.config)
    }

    pub fn decode(&self, frame: &CanFrame) -> Result<DecodedMessage> {
        let message = self
            .database
            .message_by_id(frame.id)
            .ok_or(CodecError::UnknownMessage(frame.id))?;
        decode_message(message, frame, &self.config)
    }

    pub fn builder(&self, message_name: &str) -> Result<FrameBuilder<'a>> {
        let message = self
            .database
            .message_by_name(message_name)
            .ok_or_else(|| CodecError::UnknownMessageName(message_name.to_owned()))?;
        Ok(FrameBuilder::with_config(message, self.config))
    }
}
