pub mod error;
pub mod migration;

pub use error::{BoxError, Error, Result};
pub use migration::{AppliedRecord, DEFAULT_TABLE_NAME, Direction, Migration, TableName};
