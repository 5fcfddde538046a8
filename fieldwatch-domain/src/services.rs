// Domain services: pure rule evaluation
pub mod alert_factory;
pub mod enrichment_fallback;
pub mod geo;
pub mod overlap;
pub mod rules_engine;
pub mod travel;

pub use alert_factory::*;
pub use enrichment_fallback::*;
pub use geo::*;
pub use overlap::*;
pub use rules_engine::*;
pub use travel::*;
