pub mod allowlist;
pub mod pattern;
pub mod sweeper;

pub use allowlist::Allowlist;
pub use pattern::{CookiePattern, PatternError};
pub use sweeper::{SweepReport, Sweeper, domain_suffixes};
