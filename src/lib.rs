//! Hoos Open Library
//!
//! Campus building directory with live open/closed status computed from
//! posted weekly hours, device-local favorites and per-building comments.

pub mod api;
pub mod comments;
pub mod config;
pub mod directory;
pub mod favorites;
pub mod hours;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use api::DirectoryApiClient;
pub use comments::{Comment, CommentError, CommentPolicy, list_comments, post_comment};
pub use config::AppConfig;
pub use directory::{
    Building, BuildingType, DirectoryQuery, Listing, StatusFilter, filter_buildings,
    import_buildings, load_building, load_buildings, weekly_schedule,
};
pub use favorites::Favorites;
pub use hours::{DayGroup, DayKey, HoursError, TimeRange, WeeklyHours, is_open};
pub use store::{FileDocumentStore, FileKeyValueStore};
pub use traits::{
    Clock, Document, DocumentStore, KeyValueStore, MemoryDocumentStore, MemoryKeyValueStore,
    MockClock, SystemClock,
};
