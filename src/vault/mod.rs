pub mod client;
pub mod payload;

pub use client::{HttpConnector, VaultClient};
pub use payload::SecretPayload;
