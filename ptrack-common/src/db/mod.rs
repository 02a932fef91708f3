//! Database initialization and shared queries

pub mod init;
pub mod schema;
pub mod settings;

pub use init::*;
pub use schema::*;
pub use settings::*;
