//! Event handling - typed bus and gateway fan-out

pub mod bus;
pub mod fanout;

pub use bus::{Dispatch, DispatchReport, EventBus, EventHandler, HandlerHandle, HandlerRegistration};
pub use fanout::{EventFanout, GatewayBridge, GatewayNotification};
