// CSV ingestion: decoding, cleaning and activity mapping
pub mod datetime;
pub mod loader;
pub mod mapping;
pub mod roster;

pub use datetime::*;
pub use loader::*;
pub use mapping::*;
pub use roster::*;
