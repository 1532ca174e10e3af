
pub use room::*;
pub use user::*;
