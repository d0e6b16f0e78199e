//! Workspace change notifications.

mod bus;
mod event;

pub use bus::{BroadcastBus, Subscriber, SubscriberId, Subscription};
pub use event::{AutoPopulateData, WorkspaceEvent};
