//! Curation options.
//!
//! Every operation takes a [`CurateOptions`] value. Options come from an
//! optional YAML file and are then overridden by command-line flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CurateError;
use crate::layout::Split;
use crate::prune::PruneTarget;
use crate::remap::ClassMap;
use crate::sample::DEFAULT_SEED;

/// Options shared by every curation operation.
#[derive(Clone, Debug)]
pub struct CurateOptions {
    pub dataset_root: PathBuf,
    /// Splits to operate on, in order.
    pub splits: Vec<Split>,
    /// Split whose count the prune target refers to.
    pub reference_split: Split,
    pub class_id: Option<String>,
    pub target_count: Option<usize>,
    pub baseline_count: Option<usize>,
    /// Extra per-class prune targets.
    pub targets: Vec<PruneTarget>,
    pub seed: u64,
    pub class_map: ClassMap,
    /// Report what would change without touching the filesystem.
    pub dry_run: bool,
}

impl CurateOptions {
    /// Options for `dataset_root` with every other field at its default.
    pub fn new(dataset_root: impl Into<PathBuf>) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            splits: Split::ALL.to_vec(),
            reference_split: Split::Train,
            class_id: None,
            target_count: None,
            baseline_count: None,
            targets: Vec::new(),
            seed: DEFAULT_SEED,
            class_map: ClassMap::new(),
            dry_run: false,
        }
    }

    /// All prune targets: the single `class_id`/`target_count` pair first,
    /// then `targets`.
    pub fn prune_targets(&self) -> Result<Vec<PruneTarget>, CurateError> {
        let mut all = Vec::new();

        match (&self.class_id, self.target_count) {
            (Some(class_id), Some(target_count)) => all.push(PruneTarget {
                class_id: class_id.clone(),
                target_count,
                baseline_count: self.baseline_count,
            }),
            (Some(_), None) => {
                return Err(CurateError::InvalidPruneParams {
                    message: "a class id was given without a target count".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(CurateError::InvalidPruneParams {
                    message: "a target count was given without a class id".to_string(),
                });
            }
            (None, None) => {}
        }

        all.extend(self.targets.iter().cloned());
        Ok(all)
    }
}

/// A class id as written in YAML, where bare numbers are common.
///
/// A bare number is read as an integer and written back in canonical form, so
/// `007` becomes `7`. Ids whose exact spelling matters must be quoted.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
enum ClassToken {
    Int(i64),
    Str(String),
}

impl ClassToken {
    fn into_string(self) -> String {
        match self {
            ClassToken::Int(id) => id.to_string(),
            ClassToken::Str(id) => id,
        }
    }
}

/// On-disk configuration file. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    dataset_root: Option<PathBuf>,
    splits: Option<Vec<Split>>,
    reference_split: Option<Split>,
    class_id: Option<ClassToken>,
    target_count: Option<usize>,
    baseline_count: Option<usize>,
    #[serde(default)]
    targets: Vec<TargetEntry>,
    seed: Option<u64>,
    #[serde(default)]
    class_map: BTreeMap<ClassToken, ClassToken>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    class_id: ClassToken,
    target_count: usize,
    #[serde(default)]
    baseline_count: Option<usize>,
}

impl ConfigFile {
    /// Parse a config file from YAML text.
    pub fn from_yaml_str(yaml: &str, path: &Path) -> Result<Self, CurateError> {
        serde_yaml::from_str(yaml).map_err(|source| CurateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, CurateError> {
        let yaml = fs::read_to_string(path).map_err(|source| CurateError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// Dataset root named by the file, resolved against the file's directory.
    pub fn dataset_root(&self, config_path: &Path) -> Option<PathBuf> {
        let root = self.dataset_root.as_ref()?;
        if root.is_absolute() {
            return Some(root.clone());
        }
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(root))
    }

    /// Turn the file into options rooted at `dataset_root`.
    pub fn into_options(self, dataset_root: PathBuf) -> Result<CurateOptions, CurateError> {
        let mut opts = CurateOptions::new(dataset_root);

        if let Some(splits) = self.splits {
            opts.splits = splits;
        }
        if let Some(reference) = self.reference_split {
            opts.reference_split = reference;
        }
        opts.class_id = self.class_id.map(ClassToken::into_string);
        opts.target_count = self.target_count;
        opts.baseline_count = self.baseline_count;
        opts.targets = self
            .targets
            .into_iter()
            .map(|t| PruneTarget {
                class_id: t.class_id.into_string(),
                target_count: t.target_count,
                baseline_count: t.baseline_count,
            })
            .collect();
        if let Some(seed) = self.seed {
            opts.seed = seed;
        }
        opts.class_map = ClassMap::from_pairs(
            self.class_map
                .into_iter()
                .map(|(old, new)| (old.into_string(), new.into_string())),
        )?;

        Ok(opts)
    }
}
