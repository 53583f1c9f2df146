pub mod client;
pub mod store;

pub use client::{RegctlClient, RegctlInspect};
pub use store::{RegistryEntry, RegistryStore, StatusMessage};
