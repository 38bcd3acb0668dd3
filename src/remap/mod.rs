//! Class id remapping across label files.
//!
//! Each annotation line's leading class token is passed through a
//! [`ClassMap`]; box parameters and line order are preserved. Lines without a
//! class token are dropped from the rewritten file and counted.

mod report;

pub use report::{RemapReport, SplitRemap};

use std::collections::BTreeMap;
use std::fs;

use tracing::{debug, info, warn};

use crate::error::{CurateError, FileFailure};
use crate::label::{parse_label_line, ClassId};
use crate::layout::StemIndex;

/// Files between progress log lines.
const PROGRESS_EVERY: usize = 100;

/// A mapping from old class id to new class id. Ids not in the map pass
/// through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassMap {
    map: BTreeMap<ClassId, ClassId>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(old, new)` pairs, rejecting empty ids and
    /// conflicting entries for the same old id.
    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self, CurateError>
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for (old, new) in pairs {
            let (old, new) = (old.as_ref().trim(), new.as_ref().trim());
            if old.is_empty() || new.is_empty() || old.contains(char::is_whitespace)
                || new.contains(char::is_whitespace)
            {
                return Err(CurateError::InvalidClassMap {
                    message: format!("invalid entry '{old}' -> '{new}': ids must be single tokens"),
                });
            }

            let (old, new) = (ClassId::new(old), ClassId::new(new));
            if let Some(existing) = map.get(&old) {
                if existing != &new {
                    return Err(CurateError::InvalidClassMap {
                        message: format!(
                            "class '{old}' is mapped to both '{existing}' and '{new}'"
                        ),
                    });
                }
            }
            map.insert(old, new);
        }
        Ok(Self { map })
    }

    /// Parse `old=new` pairs separated by commas, e.g. `0=4,1=5`. `:` is
    /// accepted in place of `=`.
    pub fn parse(input: &str) -> Result<Self, CurateError> {
        let mut pairs = Vec::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((old, new)) = part.split_once('=').or_else(|| part.split_once(':')) else {
                return Err(CurateError::InvalidClassMap {
                    message: format!("expected OLD=NEW, got '{part}'"),
                });
            };
            pairs.push((old, new));
        }
        Self::from_pairs(pairs)
    }

    /// The id `class_id` maps to.
    pub fn map_id<'a>(&'a self, class_id: &'a str) -> &'a str {
        self.map
            .get(&ClassId::new(class_id))
            .map_or(class_id, ClassId::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Entries in class id order.
    pub fn entries(&self) -> impl Iterator<Item = (&ClassId, &ClassId)> {
        self.map.iter()
    }

    /// Target ids that are themselves keys. Applying such a map twice changes
    /// the result again.
    pub fn chained_ids(&self) -> Vec<ClassId> {
        self.map
            .iter()
            .filter(|(old, new)| old != new && self.map.contains_key(*new))
            .map(|(_, new)| new.clone())
            .collect()
    }
}

/// Outcome of remapping one label file's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemappedText {
    pub text: String,
    /// Lines whose class id changed.
    pub lines_remapped: usize,
    /// Token-less lines removed.
    pub lines_dropped: usize,
}

/// Remap the class token of every line of a label file.
///
/// Lines are re-joined with single spaces and newline-terminated.
pub fn remap_text(text: &str, class_map: &ClassMap) -> RemappedText {
    let mut out = String::with_capacity(text.len());
    let mut lines_remapped = 0;
    let mut lines_dropped = 0;

    for line in text.lines() {
        let Some(parsed) = parse_label_line(line) else {
            lines_dropped += 1;
            continue;
        };
        let mapped = class_map.map_id(parsed.class_id);
        if mapped != parsed.class_id {
            lines_remapped += 1;
        }
        out.push_str(&parsed.render_with(mapped));
        out.push('\n');
    }

    RemappedText {
        text: out,
        lines_remapped,
        lines_dropped,
    }
}

/// Remap every label file of a split. Only files whose text changes are
/// written; a failure on one file is recorded and the rest continue.
pub fn remap_split(stems: &StemIndex, class_map: &ClassMap, dry_run: bool) -> SplitRemap {
    let mut result = SplitRemap::new(stems.split());

    for (stem, path) in stems.labels() {
        result.files_scanned += 1;
        if result.files_scanned % PROGRESS_EVERY == 0 {
            info!(split = %result.split, files = result.files_scanned, "remapping label files");
        }

        let original = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read label file");
                result.failures.push(FileFailure::new(path, err));
                continue;
            }
        };

        let remapped = remap_text(&original, class_map);
        result.lines_remapped += remapped.lines_remapped;
        result.lines_dropped += remapped.lines_dropped;

        if remapped.text == original {
            continue;
        }

        if !dry_run {
            if let Err(err) = fs::write(path, &remapped.text) {
                warn!(path = %path.display(), error = %err, "failed to write label file");
                result.failures.push(FileFailure::new(path, err));
                continue;
            }
        }
        debug!(stem, dry_run, "rewrote label file");
        result.files_changed += 1;
    }

    info!(
        split = %result.split,
        files = result.files_scanned,
        changed = result.files_changed,
        failures = result.failures.len(),
        "remap finished"
    );

    result
}
