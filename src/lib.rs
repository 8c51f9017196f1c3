/*!
 * Encode and decode CAN frames from declarative signal descriptions
 *
 * ```
 * use cancodec::{CodecConfig, Endianness, Message, Signal};
 * use cancodec::codec::{decode_message, encode_message};
 *
 * let temperature = Signal::builder("Temperature", 0, 12)
 *     .endianness(Endianness::Motorola)
 *     .signed(true)
 *     .scaling(0.01)
 *     .offset(250.0)
 *     .build()
 *     .unwrap();
 * let message = Message::new(0x1F0, "ExampleMessage", 8, vec![temperature]).unwrap();
 *
 * let config = CodecConfig::default();
 * let frame = encode_message(&message, &[("Temperature", 244.14)], &config).unwrap();
 * let decoded = decode_message(&message, &frame, &config).unwrap();
 * assert!((decoded.value("Temperature").unwrap() - 244.14).abs() < 1e-9);
 * ```
 */

pub mod bit_codec;
pub mod codec;
pub mod config;
pub mod dbc;
pub mod descriptor;
pub mod error;
pub mod float_codec;
pub mod frame;
pub mod scaling;

pub use codec::{DecodedMessage, DecodedSignal, FrameBuilder, FrameCodec};
pub use config::CodecConfig;
pub use descriptor::{Database, Endianness, Message, Signal, SignalBuilder};
pub use error::{CodecError, FrameParseError, Result};
pub use frame::CanFrame;
