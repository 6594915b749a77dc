pub mod error;
pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod utils;

pub use error::{ApiError, StorageError};
pub use utils::{create_conn, run_blocking, DbPool};
