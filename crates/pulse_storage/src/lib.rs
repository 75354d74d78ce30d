use std::path::Path;
use std::sync::Arc;

use pulse_core::{ContentStore, Error, Result};

pub mod backends;

pub use backends::*;

/// Construct a backend from its CLI name.
pub async fn create_storage(kind: &str, db_path: Option<&Path>) -> Result<Arc<dyn ContentStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = db_path.unwrap_or_else(|| Path::new("pulse.db"));
            Ok(Arc::new(SqliteStore::new_with_path(path).await?))
        }
        other => Err(Error::Storage(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use pulse_core::{ContentStore, StoreCapabilities};
}
