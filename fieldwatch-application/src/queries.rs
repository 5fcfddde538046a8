// Queries: read-only operations
pub mod alert_queries;
pub mod enrichment_queries;
