pub mod memory;
pub mod repo;
pub mod secrets;
pub mod sqlite;

pub use repo::{AccountStore, MessageCache, SecretStore};
