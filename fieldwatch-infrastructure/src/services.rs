pub mod enrichment_service;
pub mod report_service;

pub use enrichment_service::*;
pub use report_service::*;
