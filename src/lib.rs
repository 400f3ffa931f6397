pub mod config;
pub mod dashboard;
pub mod environment;
pub mod feed;
pub mod forge;
pub mod git;
pub mod launcher;
pub mod paths;
pub mod pipeline;
pub mod quality;
pub mod render;
pub mod summary;

// Re-export commonly used types
pub use config::Config;
pub use dashboard::{Dashboard, RefreshGate};
pub use feed::{EntryId, FeedEntry, SortView};
pub use pipeline::Aggregator;
pub use summary::RepositorySummary;
