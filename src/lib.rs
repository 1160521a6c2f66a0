pub mod core;
pub mod fetcher;
pub mod security;
pub mod vault;

pub use crate::core::*;
pub use fetcher::SecretFetcher;
pub use security::{TokenFile, mask_token};
pub use vault::{HttpConnector, SecretPayload, VaultClient};
