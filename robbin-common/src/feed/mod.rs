pub mod controller;
pub mod live;
pub mod range;
pub mod selection;
pub mod store;

pub use controller::{generate_incident, EnvironmentFilter, FeedController, PollOutcome};
pub use live::{poll_once, LiveFeed};
pub use range::{RangePredicate, RelativeWindow, TimeRange};
pub use selection::{SelectionChange, SelectionSet};
pub use store::EventStore;
