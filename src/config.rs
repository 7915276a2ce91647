//! Configuration loader, schema types and the persisted player state
//! the session reads and writes back.

mod load;
mod schema;
mod store;

pub use load::{SaveError, default_config_path, resolve_config_path};
pub use schema::*;
pub use store::{ConfigStore, FileConfig};
