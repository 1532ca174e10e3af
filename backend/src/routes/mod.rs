pub mod allocation;
pub mod room;
pub mod stats;
pub mod user;
