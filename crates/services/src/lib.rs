pub mod error;
pub mod feed;
pub mod gateway;

pub use error::FeedError;
pub use feed::{FeedController, FeedSnapshot, ReadAck, Session};
pub use gateway::{HttpGateway, NotificationGateway};
