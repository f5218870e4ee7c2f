//! Message catalogs and identifier-keyed factories

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{trace, warn};

use super::MessageId;
use crate::error::{Error, Result};

/// Owning handle of a heap-allocated message
pub type MsgPtr<M> = Box<M>;

/// Identifier type of a catalog's interface
pub type CatalogId<C> = <<C as MessageCatalog>::Msg as MessageId>::Id;

/// Closed set of concrete messages sharing one interface
///
/// Normally generated by [`message_catalog!`](crate::message_catalog): an
/// enum with one variant per message type.
pub trait MessageCatalog: Sized + 'static {
    /// Common message interface, usually `dyn Interface`
    type Msg: ?Sized + MessageId;

    /// Held message as the interface
    fn as_msg(&self) -> &Self::Msg;

    /// Held message as the interface, mutably
    fn as_msg_mut(&mut self) -> &mut Self::Msg;

    /// Constructor table of every message in the catalog
    fn entries() -> Vec<CatalogEntry<Self>>;
}

/// Constructors of one catalog message
pub struct CatalogEntry<C: MessageCatalog> {
    /// Identifier of the message type
    pub id: CatalogId<C>,
    /// Name of the message type
    pub name: &'static str,
    /// Build the default message inline
    pub create: fn() -> C,
    /// Build the default message on the heap
    pub create_boxed: fn() -> Box<C::Msg>,
}

impl<C: MessageCatalog> fmt::Debug for CatalogEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Creates messages by identifier
pub trait MsgFactory {
    /// Interface of the created messages
    type Msg: ?Sized + MessageId;
    /// Owning handle returned by [`MsgFactory::create`]
    type Ptr: DerefMut<Target = Self::Msg>;

    /// Default-initialised message for `id`
    ///
    /// Fails with `InvalidMsgId` for unknown identifiers and with
    /// `MsgAllocFailure` when no storage is available.
    fn create(&self, id: <Self::Msg as MessageId>::Id) -> Result<Self::Ptr>;

    /// Whether `id` belongs to the catalog
    fn contains(&self, id: <Self::Msg as MessageId>::Id) -> bool;
}

fn build_table<C: MessageCatalog, T>(select: impl Fn(&CatalogEntry<C>) -> T) -> HashMap<CatalogId<C>, T> {
    let entries = C::entries();
    let mut table = HashMap::with_capacity(entries.len());
    for entry in &entries {
        if table.insert(entry.id, select(entry)).is_some() {
            warn!(id = ?entry.id, name = entry.name, "duplicate message id in catalog");
        }
    }
    table
}

/// Factory allocating every message on the heap
pub struct DynamicFactory<C: MessageCatalog> {
    table: HashMap<CatalogId<C>, fn() -> Box<C::Msg>>,
}

impl<C: MessageCatalog> DynamicFactory<C> {
    /// Build the lookup table from the catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: build_table::<C, _>(|entry| entry.create_boxed),
        }
    }
}

impl<C: MessageCatalog> Default for DynamicFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: MessageCatalog> fmt::Debug for DynamicFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicFactory")
            .field("messages", &self.table.len())
            .finish()
    }
}

impl<C: MessageCatalog> MsgFactory for DynamicFactory<C> {
    type Msg = C::Msg;
    type Ptr = MsgPtr<C::Msg>;

    fn create(&self, id: CatalogId<C>) -> Result<Self::Ptr> {
        let ctor = self.table.get(&id).ok_or(Error::InvalidMsgId)?;
        trace!(?id, "allocating message on the heap");
        Ok(ctor())
    }

    fn contains(&self, id: CatalogId<C>) -> bool {
        self.table.contains_key(&id)
    }
}

/// Factory with a single message slot
///
/// The message is stored inline in the returned [`InPlaceMsg`]; only one
/// handle per factory may be alive at a time.
///
/// ```
/// use wirestack::field::IntValue;
/// use wirestack::message::{InPlaceFactory, MessageBase, MessageId, MsgFactory};
///
/// #[derive(Debug, Default)]
/// struct Ping {
///     fields: (IntValue<u8>,),
/// }
///
/// impl MessageBase for Ping {
///     type Id = u8;
///     type Fields = (IntValue<u8>,);
///     const ID: u8 = 1;
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
///     pub trait Msg: MessageId<Id = u8>
/// }
///
/// wirestack::message_catalog! {
///     pub enum Catalog: dyn Msg {
///         Ping(Ping),
///     }
/// }
///
/// let factory = InPlaceFactory::<Catalog>::new();
/// let first = factory.create(1).unwrap();
/// assert!(factory.create(1).is_err());
/// drop(first);
/// assert!(factory.create(1).is_ok());
/// ```
pub struct InPlaceFactory<C: MessageCatalog> {
    table: HashMap<CatalogId<C>, fn() -> C>,
    occupied: Arc<AtomicBool>,
}

impl<C: MessageCatalog> InPlaceFactory<C> {
    /// Build the lookup table from the catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: build_table::<C, _>(|entry| entry.create),
            occupied: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a message created by this factory is still alive
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}

impl<C: MessageCatalog> Default for InPlaceFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: MessageCatalog> fmt::Debug for InPlaceFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InPlaceFactory")
            .field("messages", &self.table.len())
            .field("occupied", &self.is_occupied())
            .finish()
    }
}

impl<C: MessageCatalog> MsgFactory for InPlaceFactory<C> {
    type Msg = C::Msg;
    type Ptr = InPlaceMsg<C>;

    fn create(&self, id: CatalogId<C>) -> Result<Self::Ptr> {
        let ctor = self.table.get(&id).ok_or(Error::InvalidMsgId)?;
        if self
            .occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!(?id, "message slot occupied");
            return Err(Error::MsgAllocFailure);
        }
        Ok(InPlaceMsg {
            msg: ctor(),
            occupied: Arc::clone(&self.occupied),
        })
    }

    fn contains(&self, id: CatalogId<C>) -> bool {
        self.table.contains_key(&id)
    }
}

/// Handle of the message living in an [`InPlaceFactory`] slot
///
/// Dropping the handle frees the slot.
pub struct InPlaceMsg<C: MessageCatalog> {
    msg: C,
    occupied: Arc<AtomicBool>,
}

impl<C: MessageCatalog> InPlaceMsg<C> {
    /// Concrete message as the catalog enum
    pub fn as_catalog(&self) -> &C {
        &self.msg
    }

    /// Concrete message as the catalog enum, mutably
    pub fn as_catalog_mut(&mut self) -> &mut C {
        &mut self.msg
    }
}

impl<C: MessageCatalog> Deref for InPlaceMsg<C> {
    type Target = C::Msg;

    fn deref(&self) -> &C::Msg {
        self.msg.as_msg()
    }
}

impl<C: MessageCatalog> DerefMut for InPlaceMsg<C> {
    fn deref_mut(&mut self) -> &mut C::Msg {
        self.msg.as_msg_mut()
    }
}

impl<C: MessageCatalog + fmt::Debug> fmt::Debug for InPlaceMsg<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InPlaceMsg").field(&self.msg).finish()
    }
}

impl<C: MessageCatalog> Drop for InPlaceMsg<C> {
    fn drop(&mut self) {
        self.occupied.store(false, Ordering::Release);
    }
}

/// Declare a catalog enum over concrete message types
///
/// Each variant wraps one [`MessageBase`](crate::message::MessageBase)
/// implementor; the generated enum implements [`MessageCatalog`] for the
/// given interface.
#[macro_export]
macro_rules! message_catalog {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $iface:ty {
            $($variant:ident($msg:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis enum $name {
            $(
                #[allow(missing_docs)]
                $variant($msg)
            ),+
        }

        impl $crate::message::MessageCatalog for $name {
            type Msg = $iface;

            fn as_msg(&self) -> &Self::Msg {
                match self {
                    $(Self::$variant(msg) => msg as &Self::Msg),+
                }
            }

            fn as_msg_mut(&mut self) -> &mut Self::Msg {
                match self {
                    $(Self::$variant(msg) => msg as &mut Self::Msg),+
                }
            }

            fn entries() -> ::std::vec::Vec<$crate::message::CatalogEntry<Self>> {
                ::std::vec![
                    $(
                        $crate::message::CatalogEntry {
                            id: <$msg as $crate::message::MessageBase>::ID,
                            name: <$msg as $crate::message::MessageBase>::NAME,
                            create: || Self::$variant(<$msg as ::core::default::Default>::default()),
                            create_boxed: || ::std::boxed::Box::new(
                                <$msg as ::core::default::Default>::default(),
                            ),
                        }
                    ),+
                ]
            }
        }
    };
}
