pub mod context;
pub mod lifecycle;

pub use lifecycle::{execute, Action};
