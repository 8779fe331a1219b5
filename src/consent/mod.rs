pub mod error;
pub mod status;
pub mod tracker;
pub mod types;

pub use error::{TrackerError, TrackerErrorKind};
pub use status::ConsentStatus;
pub use tracker::ConsentTracker;
pub use types::{BannerMode, ConsentDecision, TransitionOutcome};
