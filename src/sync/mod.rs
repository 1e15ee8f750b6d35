mod poller;
mod store;

pub use poller::{poll_once, Poller};
pub use store::{ApplyOutcome, MonitorStore, PendingCommands, PollSnapshot, StoreSnapshot};

#[cfg(test)]
pub(crate) use store::tests as store_fixtures;
