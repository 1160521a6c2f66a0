pub mod token_manager;

pub use token_manager::{TokenFile, mask_token};
