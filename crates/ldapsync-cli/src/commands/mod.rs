pub mod common;
pub mod config;
pub mod mapping;
pub mod sync;

pub use common::CommandOptions;
pub use config::Config;
pub use mapping::Mapping;
pub use sync::SyncUsers;
