// Domain entities
pub mod activity;
pub mod alert;
pub mod client;
pub mod config;
pub mod enrichment;
pub mod ingest;
pub mod run;

pub use activity::*;
pub use alert::*;
pub use client::*;
pub use config::*;
pub use enrichment::*;
pub use ingest::*;
pub use run::*;
