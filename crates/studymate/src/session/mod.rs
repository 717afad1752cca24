//! Session bookkeeping

mod registry;

pub use registry::SessionRegistry;
