pub mod bus;
pub mod feed;
pub mod recorder;

pub use bus::{ActivityBus, Observer};
pub use feed::{FeedEntry, FeedQuery};
pub use recorder::{describe, record};
