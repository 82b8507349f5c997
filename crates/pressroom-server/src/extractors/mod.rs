//! Request extractors for the HTTP surface.

pub mod path;
pub mod query;

pub use path::ContentPath;
pub use query::CacheActionQuery;
