/*!
 * Builds a validated `Database` from a DBC file parsed by `can-dbc`
 *
 * Signals and messages that break a descriptor rule are logged and skipped so one bad
 * definition does not hide the rest of the file. Multiplexed signals are imported as plain
 * signals; their overlap is allowed.
 */

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use can_dbc::{ByteOrder, MessageId, SignalExtendedValueType, ValueType, DBC};
use tracing::warn;

use crate::descriptor::{Database, Endianness, Message, Signal};
use crate::error::{CodecError, Result};

/// Read and parse a DBC file into a `Database`.
pub fn load_dbc(dbc_path: impl AsRef<Path>) -> anyhow::Result<Database> {
    let dbc_path = dbc_path.as_ref();
    let buffer = fs::read(dbc_path)
        .with_context(|| format!("failed to read DBC file {}", dbc_path.display()))?;
    database_from_slice(&buffer)
        .with_context(|| format!("failed to load DBC file {}", dbc_path.display()))
}

/// Parse DBC text into a `Database`.
pub fn database_from_slice(buffer: &[u8]) -> anyhow::Result<Database> {
    let dbc = DBC::from_slice(buffer).map_err(|e| anyhow!("DBC parse error: {e:?}"))?;
    Ok(database_from_dbc(&dbc)?)
}

/// Convert every message of a parsed DBC. Fails only when two messages share an id.
pub fn database_from_dbc(dbc: &DBC) -> Result<Database> {
    let messages = dbc
        .messages()
        .iter()
        .filter_map(|message| match message_from_dbc(dbc, message) {
            Ok(converted) => Some(converted),
            Err(e) => {
                warn!(message_name = %message.message_name(), error = %e, "skipping DBC message");
                None
            }
        })
        .collect();
    Database::new(messages)
}

/// Convert one DBC message. Invalid signals are dropped from the message.
pub fn message_from_dbc(dbc: &DBC, message: &can_dbc::Message) -> Result<Message> {
    let message_id = *message.message_id();
    let name = message.message_name();
    let dlc = u8::try_from(*message.message_size())
        .map_err(|_| CodecError::invalid(name, format!("size {}", message.message_size())))?;

    let signals = message
        .signals()
        .iter()
        .filter_map(|signal| match signal_from_dbc(dbc, message_id, signal) {
            Ok(converted) => Some(converted),
            Err(e) => {
                warn!(message_name = %name, error = %e, "skipping DBC signal");
                None
            }
        })
        .collect();

    match message_id {
        MessageId::Standard(id) => Message::new(u32::from(id), name, dlc, signals),
        MessageId::Extended(id) => Message::new_extended(id, name, dlc, signals),
    }
}

/// Convert one DBC signal, picking up its `SIG_VALTYPE_` float type and comment.
pub fn signal_from_dbc(
    dbc: &DBC,
    message_id: MessageId,
    signal: &can_dbc::Signal,
) -> Result<Signal> {
    let name = signal.name();
    let start_bit = u32::try_from(signal.start_bit)
        .map_err(|_| CodecError::invalid(name, format!("start bit {}", signal.start_bit)))?;
    let bit_length = u32::try_from(signal.signal_size)
        .map_err(|_| CodecError::invalid(name, format!("bit length {}", signal.signal_size)))?;

    let endianness = match signal.byte_order() {
        ByteOrder::BigEndian => Endianness::Motorola,
        ByteOrder::LittleEndian => Endianness::Intel,
    };
    let is_floating = matches!(
        dbc.extended_value_type_for_signal(message_id, name),
        Some(SignalExtendedValueType::IEEEfloat32Bit | SignalExtendedValueType::IEEEdouble64bit)
    );

    let mut builder = Signal::builder(name, start_bit, bit_length)
        .endianness(endianness)
        .signed(*signal.value_type() == ValueType::Signed)
        .floating(is_floating)
        .scaling(*signal.factor())
        .offset(*signal.offset())
        .range(*signal.min(), *signal.max())
        .units(signal.unit());
    if let Some(comment) = dbc.signal_comment(message_id, name) {
        builder = builder.comment(comment);
    }
    builder.build()
}
