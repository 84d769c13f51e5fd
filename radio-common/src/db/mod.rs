//! Database access layer
//!
//! The playlist is the only table the delivery core reads.

pub mod init;
pub mod playlist;

pub use init::init_database;
