mod core;
mod service;

pub use core::{Adapters, ApplicationCore};
