pub mod blocking;
pub mod broadcast;
pub mod inbound;
pub mod outbound;
pub mod reconcile;
pub mod worker;

mod app;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{Adapters, ApplicationCore};
