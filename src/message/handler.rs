//! Interface and handler declaration macros

/// Declare a message interface from a list of capability traits
///
/// The interface is implemented for every type providing all the listed
/// capabilities, so concrete messages only implement
/// [`MessageBase`](crate::message::MessageBase) (plus dispatch, generated by
/// [`message_handler!`](crate::message_handler)).
///
/// ```
/// use std::fmt::Debug;
/// use wirestack::message::{MessageId, MessageLength, MessageRead, MessageWrite};
///
/// wirestack::message_interface! {
///     /// Messages of the telemetry link
///     pub trait Telemetry: MessageId<Id = u16> + MessageRead + MessageWrite + MessageLength + Debug
/// }
/// ```
#[macro_export]
macro_rules! message_interface {
    ($(#[$meta:meta])* $vis:vis trait $name:ident : $($bounds:tt)+) => {
        $(#[$meta])*
        $vis trait $name: $($bounds)+ {}

        impl<T: $($bounds)+> $name for T {}
    };
}

/// Declare a handler trait and route messages to it
///
/// The generated trait has a required fallback `handle` taking the common
/// interface, and one provided method per listed message type that forwards
/// to the fallback. Handlers override only the methods of the messages they
/// care about. Each listed message gets a
/// [`MessageDispatch`](crate::message::MessageDispatch) implementation that
/// calls its dedicated method.
///
/// ```ignore
/// wirestack::message_handler! {
///     pub trait Handler for dyn Interface {
///         fn handle_ping(Ping);
///         fn handle_pong(Pong);
///     }
/// }
/// ```
#[macro_export]
macro_rules! message_handler {
    (
        $(#[$meta:meta])*
        $vis:vis trait $handler:ident for $iface:ty {
            $($(#[$mmeta:meta])* fn $method:ident($msg:ty);)*
        }
    ) => {
        $(#[$meta])*
        $vis trait $handler {
            /// Fallback for messages without a dedicated method
            fn handle(&mut self, msg: &mut $iface);

            $(
                $(#[$mmeta])*
                fn $method(&mut self, msg: &mut $msg) {
                    self.handle(msg);
                }
            )*
        }

        $(
            impl $crate::message::MessageDispatch<dyn $handler> for $msg {
                fn dispatch(&mut self, handler: &mut (dyn $handler + 'static)) {
                    handler.$method(self);
                }
            }
        )*
    };
}
