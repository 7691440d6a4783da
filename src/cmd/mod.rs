//! CLI command implementations.
//!
//! | Module   | Commands handled            |
//! |----------|-----------------------------|
//! | `run`    | `Run`                       |
//! | `store`  | `Init`, `Status`, `Reset`   |

pub mod run;
pub mod store;

pub use run::cmd_run;
pub use store::{cmd_init, cmd_reset, cmd_status};

use annot_reconcile::{AnnotationDb, ReconcileConfig};
use anyhow::Result;

/// Open the configured database, refusing to create one implicitly.
fn open_db(config: &ReconcileConfig) -> Result<AnnotationDb> {
    let path = &config.storage.database;
    if !path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run `annot-reconcile init` first.",
            path.display()
        );
    }
    AnnotationDb::new(path)
}
