//! Keeps exactly one ledger entry per domain transaction that reports.

use tracing::warn;

use crate::{
    domain::{LedgerEntry, TransactionId},
    store::AtomicGroup,
};

/// Stages `fresh` as the mirror of `origin`. An existing mirror keeps its id
/// and creation time; everything else is replaced.
pub(crate) fn upsert(
    group: &mut AtomicGroup<'_>,
    origin: TransactionId,
    fresh: LedgerEntry,
) -> LedgerEntry {
    let entry = match group.ledger_entry_for(origin) {
        Some(existing) => LedgerEntry {
            id: existing.id,
            created_at: existing.created_at,
            ..fresh
        },
        None => fresh,
    };
    group.put(entry.clone());
    entry
}

/// Stages removal of the mirror of `origin`.
pub(crate) fn remove(group: &mut AtomicGroup<'_>, origin: TransactionId) {
    match group.ledger_entry_for(origin) {
        Some(entry) => group.remove::<LedgerEntry>(&entry.id),
        None => warn!(txn = %origin, "No ledger entry mirrors this transaction"),
    }
}
