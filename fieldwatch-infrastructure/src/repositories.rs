pub mod clickhouse_repo;
pub mod config_files;
pub mod memory;

pub use clickhouse_repo::*;
pub use config_files::*;
pub use memory::*;
