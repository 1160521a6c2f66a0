pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod state_machine;
pub mod traits;

pub use config::*;
pub use error::*;
pub use logging::{LogFormat, init_logging};
pub use retry::*;
pub use state_machine::*;
pub use traits::*;
