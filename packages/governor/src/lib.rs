// ABOUTME: Rate Governor for PromptForge admission control
// ABOUTME: Sliding-window ceilings per identity plus a TTL response cache

pub mod admission;
pub mod cache;

pub use admission::{Admission, GovernorConfig, GovernorStats, RateGovernor};
pub use cache::{fingerprint, CacheStats, ResponseCache};
