// Domain value objects
pub mod confidence;
pub mod identifiers;
pub mod severity;
pub mod zone;

pub use confidence::*;
pub use identifiers::*;
pub use severity::*;
pub use zone::*;
