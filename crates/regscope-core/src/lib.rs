pub mod checksum;
pub mod config_manager;
pub mod error;
pub mod logging;
pub mod types;
pub mod views;

pub use checksum::*;
pub use config_manager::*;
pub use error::*;
pub use logging::init_tracing;
pub use types::*;
pub use views::*;
