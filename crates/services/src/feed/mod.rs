pub mod controller;
pub mod fetcher;
pub mod origin;
pub mod projection;
pub mod scheduler;
pub mod state;
pub mod sync;

pub use controller::{FeedController, FeedSnapshot, Session};
pub use fetcher::{FeedFetcher, FetchOutcome};
pub use origin::NewNotification;
pub use projection::ProjectionSummary;
pub use scheduler::{RefreshScheduler, refresh_interval};
pub use state::{FeedState, FilterUpdate, Filters, Pagination, Period, ReadStatus, ServerCounts};
pub use sync::{ReadAck, ReadSynchronizer};
