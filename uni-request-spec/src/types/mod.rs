//! Request and response data types.

pub mod config;
pub mod data;
pub mod response;
pub mod transfer;

pub use config::*;
pub use data::*;
pub use response::*;
pub use transfer::*;
