//! Message interface and capability composition
//!
//! Every operation a message may offer is its own capability trait. An
//! application picks the capabilities its interface exposes by listing them
//! as supertraits (see [`message_interface!`](crate::message_interface)),
//! and works with messages as `dyn Interface`. Operations that were not
//! selected are simply not there:
//!
//! ```compile_fail
//! use wirestack::message::{MessageId, MessageRead};
//!
//! wirestack::message_interface! {
//!     pub trait ReadOnly: MessageId<Id = u8> + MessageRead
//! }
//!
//! fn check(msg: &dyn ReadOnly) -> bool {
//!     msg.valid()
//! }
//! ```
//!
//! Adding the capability makes the same code compile:
//!
//! ```
//! use wirestack::message::{MessageId, MessageRead, MessageValid};
//!
//! wirestack::message_interface! {
//!     pub trait Checked: MessageId<Id = u8> + MessageRead + MessageValid
//! }
//!
//! fn check(msg: &dyn Checked) -> bool {
//!     msg.valid()
//! }
//! ```
//!
//! Concrete messages implement [`MessageBase`]; blanket implementations
//! route every capability to the corresponding `*_impl` hook.

use std::fmt::Debug;
use std::hash::Hash;

use crate::cursor::WriteBuf;
use crate::error::{Error, Result};
use crate::field::{Endian, FieldTuple};

mod factory;
mod handler;

pub use factory::{
    CatalogEntry, CatalogId, DynamicFactory, InPlaceFactory, InPlaceMsg, MessageCatalog, MsgFactory,
    MsgPtr,
};

/// Message identifier type
pub trait MsgId: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T: Copy + Eq + Hash + Debug + Send + Sync + 'static> MsgId for T {}

/// Identifier capability
pub trait MessageId {
    /// Identifier type shared by the message catalog
    type Id: MsgId;

    /// Identifier of this message
    fn id(&self) -> Self::Id;

    /// Human readable message name
    fn name(&self) -> &'static str;
}

/// Byte order capability
pub trait MessageEndian {
    /// Byte order used by the message's fields
    fn endian(&self) -> Endian;
}

/// Read capability
pub trait MessageRead {
    /// Decode the message body from `buf`
    fn read(&mut self, buf: &mut &[u8]) -> Result<()>;
}

/// Write capability
pub trait MessageWrite {
    /// Encode the message body into `out`
    fn write(&self, out: &mut dyn WriteBuf) -> Result<()>;
}

/// Length capability
pub trait MessageLength {
    /// Serialised length of the message body
    fn length(&self) -> usize;
}

/// Validity capability
pub trait MessageValid {
    /// Whether every field holds a valid value
    fn valid(&self) -> bool;
}

/// Refresh capability
pub trait MessageRefresh {
    /// Bring dependent fields back in line. Returns whether anything changed.
    fn refresh(&mut self) -> bool;
}

/// Dispatch capability for handler type `H`
pub trait MessageDispatch<H: ?Sized> {
    /// Invoke the handler method dedicated to this message type
    fn dispatch(&mut self, handler: &mut H);
}

/// Common implementation of a concrete message
///
/// The default hooks operate on the field tuple in declaration order. Hooks
/// can be overridden, for example to read a flags field first and derive
/// the presence of later optional fields from it:
///
/// ```
/// use wirestack::field::{BitmaskValue, FieldTuple, IntValue, Optional};
/// use wirestack::message::{MessageBase, MessageRead};
///
/// #[derive(Debug, Default)]
/// struct Status {
///     fields: (BitmaskValue<u8>, Optional<IntValue<u16>>),
/// }
///
/// impl MessageBase for Status {
///     type Id = u8;
///     type Fields = (BitmaskValue<u8>, Optional<IntValue<u16>>);
///     const ID: u8 = 7;
///     const NAME: &'static str = "Status";
///
///     fn fields(&self) -> &Self::Fields {
///         &self.fields
///     }
///
///     fn fields_mut(&mut self) -> &mut Self::Fields {
///         &mut self.fields
///     }
///
///     fn read_impl(&mut self, buf: &mut &[u8]) -> wirestack::Result<()> {
///         self.fields.read_until(1, buf)?;
///         self.refresh_impl();
///         self.fields.read_from(1, buf)
///     }
///
///     fn refresh_impl(&mut self) -> bool {
///         let present = self.fields.0.bit_value(0);
///         self.fields.1.set_exists(present)
///     }
/// }
///
/// let mut msg = Status::default();
/// let mut buf: &[u8] = &[0x01, 0x00, 0x2a];
/// msg.read(&mut buf).unwrap();
/// assert_eq!(msg.fields.1.get().map(IntValue::value), Some(42));
/// ```
pub trait MessageBase: Default + Debug + 'static {
    /// Identifier type
    type Id: MsgId;
    /// Ordered payload fields
    type Fields: FieldTuple;

    /// Identifier of this message type
    const ID: Self::Id;
    /// Name of this message type
    const NAME: &'static str;
    /// Byte order reported by the endian capability
    const ENDIAN: Endian = Endian::Big;

    /// Payload fields
    fn fields(&self) -> &Self::Fields;

    /// Payload fields, mutably
    fn fields_mut(&mut self) -> &mut Self::Fields;

    /// Read hook: reads every field, stopping at the first failure
    fn read_impl(&mut self, buf: &mut &[u8]) -> Result<()> {
        self.fields_mut().read_all(buf)
    }

    /// Write hook: writes every field, stopping at the first failure
    fn write_impl(&self, out: &mut dyn WriteBuf) -> Result<()> {
        self.fields().write_all(out)
    }

    /// Length hook: sum of the field lengths
    fn length_impl(&self) -> usize {
        self.fields().length_all()
    }

    /// Validity hook: every field is valid
    fn valid_impl(&self) -> bool {
        self.fields().valid_all()
    }

    /// Refresh hook: refreshes every field
    fn refresh_impl(&mut self) -> bool {
        self.fields_mut().refresh_all()
    }
}

/// Read hook body for messages that cannot be decoded
pub fn read_not_supported(_buf: &mut &[u8]) -> Result<()> {
    Err(Error::NotSupported)
}

/// Write hook body for messages that cannot be encoded
pub fn write_not_supported(_out: &mut dyn WriteBuf) -> Result<()> {
    Err(Error::NotSupported)
}

impl<M: MessageBase> MessageId for M {
    type Id = M::Id;

    fn id(&self) -> M::Id {
        M::ID
    }

    fn name(&self) -> &'static str {
        M::NAME
    }
}

impl<M: MessageBase> MessageEndian for M {
    fn endian(&self) -> Endian {
        M::ENDIAN
    }
}

impl<M: MessageBase> MessageRead for M {
    fn read(&mut self, buf: &mut &[u8]) -> Result<()> {
        self.read_impl(buf)
    }
}

impl<M: MessageBase> MessageWrite for M {
    fn write(&self, out: &mut dyn WriteBuf) -> Result<()> {
        if out.remaining_mut() < self.length_impl() {
            return Err(Error::BufferOverflow);
        }
        self.write_impl(out)
    }
}

impl<M: MessageBase> MessageLength for M {
    fn length(&self) -> usize {
        self.length_impl()
    }
}

impl<M: MessageBase> MessageValid for M {
    fn valid(&self) -> bool {
        self.valid_impl()
    }
}

impl<M: MessageBase> MessageRefresh for M {
    fn refresh(&mut self) -> bool {
        self.refresh_impl()
    }
}
