//! DB Module
//!
//! The record store exposed to service layers.
//!
//! ## Operations
//! - `create` / `find_by_id` / `update_by_id` / `delete_by_id`
//! - `create_index`, `find_all`, `find_in_range`
//! - JSON-lines bulk loading

mod database;
mod loader;
mod query;
mod record;
mod response;

pub use database::{CachedValue, Database, IndexHandle};
pub use loader::{load_json_lines, load_json_lines_file};
pub use query::{FindOptions, IndexHint, Predicate, RangeQuery, Where};
pub use record::{Fields, Record, ID_FIELD};
pub use response::{Ack, Failure, Status};
