#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// A one-line label holding a single box of `class_id`.
pub fn box_line(class_id: &str) -> String {
    format!("{class_id} 0.5 0.5 0.2 0.2\n")
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Builds `<root>/<split>/{images,labels}` trees inside a temp dir.
pub struct DatasetBuilder {
    temp: tempfile::TempDir,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Create an empty split with both subdirectories.
    pub fn split(self, split: &str) -> Self {
        fs::create_dir_all(self.images_dir(split)).expect("create images dir");
        fs::create_dir_all(self.labels_dir(split)).expect("create labels dir");
        self
    }

    /// Add an image and a label with the given text.
    pub fn pair(self, split: &str, stem: &str, label: &str) -> Self {
        write_file(&self.image_path(split, stem), b"img");
        write_file(&self.label_path(split, stem), label);
        self
    }

    /// Add `n` pairs named `<prefix>_<i>`, each with one box of `class_id`.
    pub fn class_pairs(mut self, split: &str, prefix: &str, class_id: &str, n: usize) -> Self {
        for i in 0..n {
            self = self.pair(split, &format!("{prefix}_{i:04}"), &box_line(class_id));
        }
        self
    }

    pub fn label_only(self, split: &str, stem: &str, label: &str) -> Self {
        write_file(&self.label_path(split, stem), label);
        self
    }

    pub fn image_only(self, split: &str, stem: &str) -> Self {
        write_file(&self.image_path(split, stem), b"img");
        self
    }

    pub fn images_dir(&self, split: &str) -> PathBuf {
        self.root().join(split).join("images")
    }

    pub fn labels_dir(&self, split: &str) -> PathBuf {
        self.root().join(split).join("labels")
    }

    pub fn image_path(&self, split: &str, stem: &str) -> PathBuf {
        self.images_dir(split).join(format!("{stem}.jpg"))
    }

    pub fn label_path(&self, split: &str, stem: &str) -> PathBuf {
        self.labels_dir(split).join(format!("{stem}.txt"))
    }
}

/// Number of regular files directly inside `dir`.
pub fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .count()
}
