/*!
 * Classic CAN frame value type and its candump text form
 */

use std::fmt::Write;

use crate::bit_codec::payload_mask;
use crate::error::FrameParseError;

/// Payload capacity of a classic CAN frame.
pub const CLASSIC_PAYLOAD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanFrame {
    // Timestamp: Time the data was received (seconds)
    pub timestamp: f64,
    // Name of the CAN channel the data occurred on.
    pub channel: String,
    // CAN ID: 11-bit standard or 29-bit extended ID
    pub id: u32,
    pub is_extended: bool,
    // Data Length Code (DLC), 0 to 8
    pub len: u8,
    pub data: [u8; CLASSIC_PAYLOAD_LEN],
}

impl CanFrame {
    /// Build a frame from a payload word, dropping bytes past `len`.
    pub fn from_word(id: u32, len: u8, word: u64) -> Self {
        let len = len.min(CLASSIC_PAYLOAD_LEN as u8);
        CanFrame {
            id,
            is_extended: id > 0x7FF,
            len,
            data: (word & payload_mask(len)).to_le_bytes(),
            ..Default::default()
        }
    }

    /// The payload as a little-endian word. Bytes past `len` read as zero.
    pub fn word(&self) -> u64 {
        u64::from_le_bytes(self.data) & payload_mask(self.len.min(CLASSIC_PAYLOAD_LEN as u8))
    }

    /// Upper 32 bits of the payload word (bytes 4..8).
    pub fn data_high(&self) -> u32 {
        (self.word() >> 32) as u32
    }

    /// Lower 32 bits of the payload word (bytes 0..4).
    pub fn data_low(&self) -> u32 {
        self.word() as u32
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(CLASSIC_PAYLOAD_LEN)]
    }
}

/// Turn hex data from a candump line into byte values
pub fn candump_hex_to_bytes(
    hex_str: &str,
) -> Result<([u8; CLASSIC_PAYLOAD_LEN], u8), FrameParseError> {
    if hex_str.len() % 2 != 0 {
        return Err(FrameParseError::Payload(hex_str.to_owned()));
    }
    let len = hex_str.len() / 2;
    if len > CLASSIC_PAYLOAD_LEN {
        return Err(FrameParseError::PayloadTooLong(len));
    }

    let mut data_bytes = [0; CLASSIC_PAYLOAD_LEN];
    for (index, byte) in data_bytes.iter_mut().take(len).enumerate() {
        let pair = hex_str
            .get(2 * index..2 * index + 2)
            .ok_or_else(|| FrameParseError::Payload(hex_str.to_owned()))?;
        *byte = u8::from_str_radix(pair, 16)
            .map_err(|_| FrameParseError::Payload(hex_str.to_owned()))?;
    }
    Ok((data_bytes, len as u8))
}

/// Parse a line in candump format
/// (1436509053.850870) vcan0 1A0#9C20407F96EA167B
/// ```
/// let frame = cancodec::frame::parse_candump_line("(1436509053.850870) vcan0 1A0#9C20407F96EA167B").unwrap();
/// assert_eq!(frame.id, 0x1A0);
/// ```
///
/// Ids written with more than 3 hex digits are extended. CAN FD (`##`) and remote
/// frames are rejected.
pub fn parse_candump_line(line: &str) -> Result<CanFrame, FrameParseError> {
    let missing = |field| FrameParseError::MissingField {
        field,
        line: line.to_owned(),
    };
    let mut line_splits = line.split_whitespace();

    let timestamp = line_splits.next().ok_or_else(|| missing("timestamp"))?;
    let timestamp = timestamp
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| FrameParseError::Timestamp(timestamp.to_owned()))?;

    let channel = line_splits.next().ok_or_else(|| missing("interface"))?;

    let id_and_data = line_splits.next().ok_or_else(|| missing("id#data"))?;
    let (id_str, payload_hex) = id_and_data
        .split_once('#')
        .ok_or_else(|| missing("'#' separator"))?;
    let id = u32::from_str_radix(id_str, 16).map_err(FrameParseError::Id)?;
    if id > 0x1FFF_FFFF {
        return Err(FrameParseError::IdOutOfRange(id));
    }
    let (data, len) = candump_hex_to_bytes(payload_hex)?;

    Ok(CanFrame {
        timestamp,
        channel: channel.to_owned(),
        id,
        is_extended: id_str.len() > 3 || id > 0x7FF,
        len,
        data,
    })
}

/// Convert a CanFrame to an ascii candump line
/// Example: (1436509053.850870) vcan0 1A0#9C20407F96EA167B
///
/// Frames without a channel are written on `any`, candump's name for all interfaces.
pub fn frame_to_candump_line(frame: &CanFrame) -> String {
    let channel = if frame.channel.is_empty() {
        "any"
    } else {
        frame.channel.as_str()
    };
    let mut s = if frame.is_extended {
        format!("({:.6}) {} {:08X}#", frame.timestamp, channel, frame.id)
    } else {
        format!("({:.6}) {} {:03X}#", frame.timestamp, channel, frame.id)
    };
    for byte in frame.payload() {
        // writing into a String cannot fail
        let _ = write!(s, "{byte:02X}");
    }
    s
}
