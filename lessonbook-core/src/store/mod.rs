//! Persistence: the local durable cache and the optional remote
//! mirror.

pub mod cache;
pub mod remote;

pub use cache::{keys, LocalCache};
pub use remote::{RemoteConfig, RemoteError, RemoteStore};
