//! wirestack - Compile-time composable binary protocols
//!
//! Messages are described as tuples of typed fields, framing is described as
//! a chain of layers, and decoded messages are routed to handlers through
//! statically generated dispatch. No runtime type information is involved
//! and heap allocation is optional.
//!
//! # Quick Start
//!
//! ```rust
//! use wirestack::field::{IntValue, Options};
//! use wirestack::layer::{
//!     BasicSum, ChecksumLayer, MsgIdLayer, PayloadLayer, ProtocolStack, SizeLayer, SyncPrefixLayer,
//! };
//! use wirestack::message::{
//!     DynamicFactory, MessageBase, MessageDispatch, MessageId, MessageLength, MessageRead,
//!     MessageWrite, MsgPtr,
//! };
//!
//! wirestack::field_spec! {
//!     SyncWord = Options::new().default_value(0xabcd)
//! }
//!
//! #[derive(Debug, Default)]
//! struct Ping {
//!     fields: (IntValue<u8>, IntValue<u8>),
//! }
//!
//! impl MessageBase for Ping {
//!     type Id = u8;
//!     type Fields = (IntValue<u8>, IntValue<u8>);
//!     const ID: u8 = 1;
//!     const NAME: &'static str = "Ping";
//!
//!     fn fields(&self) -> &Self::Fields {
//!         &self.fields
//!     }
//!
//!     fn fields_mut(&mut self) -> &mut Self::Fields {
//!         &mut self.fields
//!     }
//! }
//!
//! wirestack::message_interface! {
//!     trait Msg: MessageId<Id = u8> + MessageRead + MessageWrite + MessageLength
//!         + MessageDispatch<dyn Handler>
//! }
//!
//! wirestack::message_handler! {
//!     trait Handler for dyn Msg {
//!         fn handle_ping(Ping);
//!     }
//! }
//!
//! wirestack::message_catalog! {
//!     enum Catalog: dyn Msg {
//!         Ping(Ping),
//!     }
//! }
//!
//! // sync | size | id | payload | checksum over size..payload
//! type Frame = SyncPrefixLayer<
//!     IntValue<u16, SyncWord>,
//!     ChecksumLayer<
//!         IntValue<u8>,
//!         BasicSum,
//!         SizeLayer<IntValue<u16>, MsgIdLayer<IntValue<u8>, DynamicFactory<Catalog>, PayloadLayer<MsgPtr<dyn Msg>>>>,
//!     >,
//! >;
//!
//! #[derive(Default)]
//! struct Counter {
//!     pings: usize,
//!     others: usize,
//! }
//!
//! impl Handler for Counter {
//!     fn handle(&mut self, _msg: &mut dyn Msg) {
//!         self.others += 1;
//!     }
//!
//!     fn handle_ping(&mut self, msg: &mut Ping) {
//!         assert_eq!(msg.fields.1.value(), 2);
//!         self.pings += 1;
//!     }
//! }
//!
//! let stack = ProtocolStack::new(Frame::default());
//! let mut input: &[u8] = &[0xab, 0xcd, 0x00, 0x03, 0x01, 0x01, 0x02, 0x07];
//! let mut msg = stack.read(&mut input)?;
//!
//! let mut counter = Counter::default();
//! msg.dispatch(&mut counter);
//! assert_eq!(counter.pings, 1);
//! assert_eq!(stack.encode(&*msg)?, [0xab, 0xcd, 0x00, 0x03, 0x01, 0x01, 0x02, 0x07]);
//! # Ok::<(), wirestack::Error>(())
//! ```
//!
//! # Features
//!
//! - **Fields** - integers (fixed and variable length, offsets, ranges,
//!   scaling), enums, bitmasks, floats, strings, lists, optionals and bundles
//! - **Layers** - sync prefix, checksum (sum, CRC-16, CRC-32, `XXHash3`), size
//!   prefix, message id and payload
//! - **Messages** - capability traits chosen per interface, heap or in-place
//!   allocation, handler dispatch without downcasting
//! - **Metrics** - process-wide frame and error counters

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cursor;
pub mod error;
pub mod field;
pub mod layer;
pub mod message;
pub mod metrics;

pub use cursor::{SliceWriter, StreamWriter, WriteBuf};
pub use error::{Error, ErrorClass, ErrorStatus, Result, WriteStatus};
pub use layer::ProtocolStack;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
