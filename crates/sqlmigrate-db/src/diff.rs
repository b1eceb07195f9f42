use std::collections::HashSet;

use sqlmigrate_common::{AppliedRecord, Migration};

/// Catalog entries whose id has no ledger record, in catalog order.
///
/// Duplicate ids inside `catalog` are passed through untouched.
pub fn pending_migrations(catalog: &[Migration], applied: &[AppliedRecord]) -> Vec<Migration> {
    let applied_ids: HashSet<&str> = applied.iter().map(|r| r.id.as_str()).collect();

    catalog
        .iter()
        .filter(|m| !applied_ids.contains(m.id.as_str()))
        .cloned()
        .collect()
}
