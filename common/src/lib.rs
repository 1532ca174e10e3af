//! Wire types shared by the hostel backend and its clients.

pub mod errors;
pub mod models;
pub mod payloads;

pub use models::*;
