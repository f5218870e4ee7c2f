//! Boundary wrapper around a chain of layers

use tracing::{debug, instrument, trace};

use super::{CreateMsg, ProtocolLayer};
use crate::cursor::WriteBuf;
use crate::error::{Error, Result, WriteStatus};
use crate::message::MessageId;
use crate::metrics::{self, FrameDirection};

/// Complete protocol stack as seen by an integrator
///
/// Wraps the outermost layer, records frame metrics and logs rejected
/// frames. Reads are stateless: hand every call the whole buffered input and
/// keep the bytes it leaves unconsumed.
///
/// ```
/// use wirestack::field::IntValue;
/// use wirestack::layer::{MsgIdLayer, PayloadLayer, ProtocolStack, SizeLayer};
/// use wirestack::message::{DynamicFactory, MessageBase, MessageId, MessageRead, MessageWrite, MessageLength, MsgPtr};
///
/// #[derive(Debug, Default)]
/// struct Ping {
///     fields: (IntValue<u16>,),
/// }
///
/// impl MessageBase for Ping {
///     type Id = u8;
///     type Fields = (IntValue<u16>,);
///     const ID: u8 = 7;
///     const NAME: &'static str = "Ping";
///
///     fn fields(&self) -> &Self::Fields {
///         &self.fields
///     }
///
///     fn fields_mut(&mut self) -> &mut Self::Fields {
///         &mut self.fields
///     }
/// }
///
/// wirestack::message_interface! {
///     pub trait Msg: MessageId<Id = u8> + MessageRead + MessageWrite + MessageLength
/// }
///
/// wirestack::message_catalog! {
///     pub enum Catalog: dyn Msg {
///         Ping(Ping),
///     }
/// }
///
/// type Frame = SizeLayer<
///     IntValue<u8>,
///     MsgIdLayer<IntValue<u8>, DynamicFactory<Catalog>, PayloadLayer<MsgPtr<dyn Msg>>>,
/// >;
///
/// let stack = ProtocolStack::new(Frame::default());
/// let mut ping = Ping::default();
/// ping.fields.0.set_value(0x0102);
/// let bytes = stack.encode(&ping).unwrap();
/// assert_eq!(bytes, vec![3, 7, 1, 2]);
///
/// let mut input = bytes.as_slice();
/// let msg = stack.read(&mut input).unwrap();
/// assert_eq!(msg.id(), 7);
/// assert!(input.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct ProtocolStack<L> {
    layers: L,
}

impl<L> ProtocolStack<L> {
    /// Wrap the outermost layer
    pub fn new(layers: L) -> Self {
        Self { layers }
    }

    /// Outermost layer
    pub fn layers(&self) -> &L {
        &self.layers
    }
}

impl<L: ProtocolLayer> ProtocolStack<L> {
    /// Decode one frame from the start of `buf`
    ///
    /// On success `buf` is advanced past the frame; on failure it is left
    /// untouched. [`Error::NotEnoughData`] means the frame is incomplete.
    #[instrument(level = "trace", skip_all, fields(available = buf.len()))]
    pub fn read(&self, buf: &mut &[u8]) -> Result<L::MsgPtr> {
        let mut fields = L::AllFields::default();
        self.read_fields_cached(&mut fields, buf)
    }

    /// Decode one frame, keeping the transport fields of every layer
    pub fn read_fields_cached(
        &self,
        fields: &mut L::AllFields,
        buf: &mut &[u8],
    ) -> Result<L::MsgPtr> {
        let mut msg = None;
        self.read_into(fields, &mut msg, buf)?;
        msg.ok_or(Error::NotSupported)
    }

    /// Decode one frame into a caller-held message slot
    ///
    /// The slot is cleared first, which releases a previously decoded
    /// in-place message before the next one is created.
    pub fn read_into(
        &self,
        fields: &mut L::AllFields,
        msg: &mut Option<L::MsgPtr>,
        buf: &mut &[u8],
    ) -> Result<()> {
        *msg = None;
        let available = buf.len();
        match self.layers.read_fields_cached(fields, msg, buf) {
            Ok(()) => {
                let len = available - buf.len();
                trace!(len, "frame read");
                metrics::record_frame(FrameDirection::Read, len);
                Ok(())
            }
            Err(err) => {
                metrics::record_error(err);
                if err.is_recoverable() {
                    trace!(error = ?err, "frame incomplete");
                } else {
                    debug!(error = ?err, "frame rejected");
                }
                Err(err)
            }
        }
    }

    /// Encode one frame into `out`
    ///
    /// Fails with [`Error::BufferOverflow`] before writing anything when
    /// `out` cannot hold the whole frame. A [`WriteStatus::UpdateRequired`]
    /// result must be followed by [`ProtocolStack::update`] over the written
    /// bytes.
    #[instrument(level = "trace", skip_all)]
    pub fn write(&self, msg: &L::Msg, out: &mut dyn WriteBuf) -> Result<WriteStatus> {
        let mut fields = L::AllFields::default();
        self.write_fields_cached(&mut fields, msg, out)
    }

    /// Encode one frame, keeping the transport fields of every layer
    pub fn write_fields_cached(
        &self,
        fields: &mut L::AllFields,
        msg: &L::Msg,
        out: &mut dyn WriteBuf,
    ) -> Result<WriteStatus> {
        let len = self.layers.length(msg);
        if out.remaining_mut() < len {
            debug!(len, remaining = out.remaining_mut(), "output too small");
            metrics::record_error(Error::BufferOverflow);
            return Err(Error::BufferOverflow);
        }
        match self.layers.write_fields_cached(fields, msg, out) {
            Ok(status) => {
                trace!(len, ?status, "frame written");
                metrics::record_frame(FrameDirection::Written, len);
                Ok(status)
            }
            Err(err) => {
                metrics::record_error(err);
                debug!(error = ?err, "frame not written");
                Err(err)
            }
        }
    }

    /// Fill in the placeholders of a frame written into a sequential sink
    ///
    /// Returns the frame length.
    #[instrument(level = "trace", skip_all, fields(len = buf.len()))]
    pub fn update(&self, buf: &mut [u8]) -> Result<usize> {
        metrics::record_update();
        self.layers.update(buf).inspect_err(|err| {
            metrics::record_error(*err);
            debug!(error = ?err, "update failed");
        })
    }

    /// Exact number of bytes [`ProtocolStack::write`] produces for `msg`
    pub fn length(&self, msg: &L::Msg) -> usize {
        self.layers.length(msg)
    }

    /// Peek the length of the frame at the start of `buf`
    ///
    /// `None` when the frame has no length marker and extends to the end of
    /// the input.
    pub fn frame_length(&self, buf: &[u8]) -> Result<Option<usize>> {
        self.layers.frame_length(buf)
    }

    /// Encode one frame into a new vector
    pub fn encode(&self, msg: &L::Msg) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.length(msg));
        self.write(msg, &mut out)?;
        Ok(out)
    }
}

impl<L: CreateMsg> ProtocolStack<L> {
    /// Default-initialised message for `id`, e.g. to fill in and send
    pub fn create_msg(&self, id: <L::Msg as MessageId>::Id) -> Result<L::MsgPtr> {
        self.layers.create_msg(id)
    }
}
