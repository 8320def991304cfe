//! Implementation of the DMM integrated servo drive RS232 packet protocol in Rust.
//!
//! Packets are 4 to 7 bytes long and carry an axis id, a 5-bit function code and a
//! signed 28-bit value split into 7-bit groups. There are no start or stop tokens:
//! the address byte is the only byte with bit 7 clear, and a trailing additive
//! checksum protects the rest.
//!
//! The crate is transport-agnostic. [`Packet`] implements [`Encode`] and [`Decode`]
//! for one-shot use, [`FrameAssembler`] splits a raw byte stream into packets, and
//! [`Session`] combines both behind a byte sink and report callbacks.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod assembler;
pub mod command;
pub mod function;
pub mod packet;
pub mod session;
pub mod status;

mod checksum;
mod decode;
mod encode;
mod varint;

pub use assembler::{BUFFER_CAPACITY, FrameAssembler};
pub use checksum::checksum;
pub use command::{Command, MAX_SETTER_VALUE, MIN_SETTER_VALUE};
pub use decode::{Decode, DecodeError, DecodeErrorKind, DecodeWithLength};
pub use encode::Encode;
pub use function::{Parameter, ReadRequest, Signedness};
pub use packet::{MAX_PACKET_SIZE, MIN_PACKET_SIZE, Packet, PacketBytes};
pub use session::{ByteSink, DecodeStatus, ReportHandler, Session, SinkFn};
pub use status::{Alarm, DriveConfig, DriveStatus};
pub use varint::{MAX_GROUPS, VarI28, VarI28SizeError, VarU28, VarU28SizeError};

/// Line rate of the drive's RS232 port. Frames are 8 data bits, no parity, one
/// stop bit.
pub const BAUD_RATE: u32 = 38400;
