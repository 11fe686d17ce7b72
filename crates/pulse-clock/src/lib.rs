pub mod calendar;
pub mod live;
pub mod ticker;

pub use calendar::{DetailedElapsed, detailed_elapsed};
pub use live::{LiveElapsed, live_elapsed};
pub use ticker::Ticker;
