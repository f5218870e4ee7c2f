//! Framing layers
//!
//! A protocol stack is a chain of layers written outermost first, mirroring
//! the order of bytes on the wire:
//!
//! ```text
//! SyncPrefixLayer -> ChecksumLayer -> SizeLayer -> MsgIdLayer -> PayloadLayer
//! [ab cd]            ...              [00 03]      [01]          [01 02]       [cs]
//! ```
//!
//! Each layer owns the field type of its own fragment and the next inner
//! layer. Layers keep no state between calls: a read is always given the
//! whole currently available input and either completes, fails, or reports
//! how many more bytes it needs.

use std::fmt::Debug;
use std::ops::DerefMut;

use crate::cursor::WriteBuf;
use crate::error::{Result, WriteStatus};
use crate::message::MessageId;

mod checksum;
mod id;
mod payload;
mod size;
mod stack;
mod sync;
#[cfg(test)]
mod testing;

pub use checksum::{BasicSum, ChecksumCalc, ChecksumLayer, Crc16Ccitt, Crc32, Xxh3};
pub use id::MsgIdLayer;
pub use payload::PayloadLayer;
pub use size::SizeLayer;
pub use stack::ProtocolStack;
pub use sync::SyncPrefixLayer;

/// One stage of a protocol stack
pub trait ProtocolLayer {
    /// Message interface handled by the stack
    type Msg: ?Sized + MessageId;
    /// Owning message handle produced on read
    type MsgPtr: DerefMut<Target = Self::Msg>;
    /// This layer's field followed by the fields of every inner layer
    type AllFields: Default + Debug;

    /// Read the frame, keeping every layer's field in `fields`
    ///
    /// `buf` advances past the frame only on success. A message created
    /// before a failure is released.
    fn read_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &mut Option<Self::MsgPtr>,
        buf: &mut &[u8],
    ) -> Result<()>;

    /// Write the frame, keeping every layer's field in `fields`
    fn write_fields_cached(
        &self,
        fields: &mut Self::AllFields,
        msg: &Self::Msg,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus>;

    /// Fix up placeholders of a frame written with
    /// [`WriteStatus::UpdateRequired`]. Returns the frame length.
    fn update(&self, buf: &mut [u8]) -> Result<usize>;

    /// Bytes the frame of `msg` occupies from this layer inwards
    fn length(&self, msg: &Self::Msg) -> usize;

    /// Peek the length of the frame starting at `buf` without consuming it
    ///
    /// `None` means the frame extends to the end of the input.
    fn frame_length(&self, buf: &[u8]) -> Result<Option<usize>>;

    /// Read the frame, discarding the transport fields
    fn read(&self, msg: &mut Option<Self::MsgPtr>, buf: &mut &[u8]) -> Result<()> {
        let mut fields = Self::AllFields::default();
        self.read_fields_cached(&mut fields, msg, buf)
    }

    /// Write the frame, discarding the transport fields
    fn write(&self, msg: &Self::Msg, out: &mut dyn WriteBuf) -> Result<WriteStatus> {
        let mut fields = Self::AllFields::default();
        self.write_fields_cached(&mut fields, msg, out)
    }
}

/// Layers able to create a message by identifier
///
/// Provided by the id layer and forwarded by every layer wrapping it.
pub trait CreateMsg: ProtocolLayer {
    /// Default-initialised message for `id`
    fn create_msg(&self, id: <Self::Msg as MessageId>::Id) -> Result<Self::MsgPtr>;
}

/// Implement [`CreateMsg`] for a wrapping layer by forwarding to `self.next`
macro_rules! forward_create_msg {
    ($layer:ident<$($param:ident),+>) => {
        impl<$($param),+, Next> $crate::layer::CreateMsg for $layer<$($param),+, Next>
        where
            Self: $crate::layer::ProtocolLayer<Msg = Next::Msg, MsgPtr = Next::MsgPtr>,
            Next: $crate::layer::CreateMsg,
        {
            fn create_msg(
                &self,
                id: <<Self as $crate::layer::ProtocolLayer>::Msg as $crate::message::MessageId>::Id,
            ) -> $crate::error::Result<<Self as $crate::layer::ProtocolLayer>::MsgPtr> {
                self.next.create_msg(id)
            }
        }
    };
}

pub(crate) use forward_create_msg;
