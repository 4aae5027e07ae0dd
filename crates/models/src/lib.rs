pub mod notification;
pub mod role;

pub use notification::*;
pub use role::*;
