//! Sequential registry comparison.

use mcw_action::{Action, RegistryRename};
use mcw_store::{RegistryEntry, RegistryKind};
use serde::Serialize;
use tracing::debug;

use crate::progress::Progress;

/// Outcome of comparing one registry between two saves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegistryDiff {
    /// Entries whose name changed only in casing or underscores.
    pub renames: Vec<Action>,
    /// Entries with no counterpart; rendered commented out for manual review.
    pub missing: Vec<Action>,
}

impl RegistryDiff {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.missing.is_empty()
    }
}

/// How an old entry relates to the new registry.
#[derive(Debug, PartialEq, Eq)]
enum Match<'a> {
    Unchanged,
    Similar(&'a RegistryEntry),
    Missing,
}

/// One pass in candidate order; the first candidate that is either the same
/// name or a similar one decides.
fn find_match<'a>(old: &RegistryEntry, candidates: &[&'a RegistryEntry]) -> Match<'a> {
    for &new in candidates {
        if new.name == old.name {
            return Match::Unchanged;
        }
        if old.name.is_similar(&new.name) {
            return Match::Similar(new);
        }
    }
    Match::Missing
}

/// Compare two registries entry by entry, in old-registry order.
///
/// Entries in `reserved_domain` are skipped on both sides. A renamed entry
/// keeps its old id on both sides of the action; the engine never proposes
/// id changes. Missing entries are reported as identity renames.
pub fn diff_registry(
    kind: RegistryKind,
    old: &[RegistryEntry],
    new: &[RegistryEntry],
    reserved_domain: &str,
    progress: Option<&Progress>,
) -> RegistryDiff {
    let candidates: Vec<&RegistryEntry> = new
        .iter()
        .filter(|entry| !entry.name.is_in_domain(reserved_domain))
        .collect();
    let action = |rename: RegistryRename| match kind {
        RegistryKind::Blocks => Action::RenameBlock(rename),
        RegistryKind::Items => Action::RenameItem(rename),
    };

    let mut diff = RegistryDiff::default();
    for entry in old {
        if let Some(progress) = progress {
            progress.advance();
        }
        if entry.name.is_in_domain(reserved_domain) {
            continue;
        }
        match find_match(entry, &candidates) {
            Match::Unchanged => {}
            Match::Similar(found) => diff.renames.push(action(RegistryRename::new(
                entry.name.clone(),
                entry.id,
                found.name.clone(),
                entry.id,
            ))),
            Match::Missing => diff.missing.push(action(RegistryRename::new(
                entry.name.clone(),
                entry.id,
                entry.name.clone(),
                entry.id,
            ))),
        }
    }
    debug!(
        registry = %kind,
        renames = diff.renames.len(),
        missing = diff.missing.len(),
        "compared registry"
    );
    diff
}
