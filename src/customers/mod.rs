//! Customer records: the structured profile, CSV ingestion, and the queue of
//! customers a session works through.

pub mod loader;
pub mod profile;
pub mod queue;

pub use loader::{load_customers, parse_customers};
pub use profile::CustomerProfile;
pub use queue::CustomerQueue;
