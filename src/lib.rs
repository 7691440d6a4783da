pub mod aggregate;
pub mod config;
pub mod consolidate;
pub mod db;
pub mod errors;
pub mod layout;
pub mod logging;
pub mod reconcile;
pub mod scheduler;
pub mod summary;
pub mod util;
pub mod verify;

pub use config::ReconcileConfig;
pub use db::AnnotationDb;
pub use errors::ReconcileError;
pub use reconcile::{PassReport, Reconciler};
pub use scheduler::{LsfScheduler, Scheduler};
