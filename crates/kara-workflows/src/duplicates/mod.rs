//! Duplicate detection for membership requests.
//!
//! Detection is read-then-write and not atomic. Each lookup and each group
//! upsert is an independent store call, so two concurrent writes to sibling
//! requests may leave `duplicateGroupIds` briefly out of step with the groups.
//! The next write to either request brings them back in line.

mod groups;
mod matcher;
mod migration;
mod trigger;

pub use groups::{cleanup_old_groups, mark_requests_as_duplicates, update_duplicate_groups};
pub use matcher::{DuplicateMatches, find_matches};
pub use migration::{MigrationReport, migrate_duplicates};
pub use trigger::{RequestWrite, TriggerOutcome, handle_write, on_request_write};
