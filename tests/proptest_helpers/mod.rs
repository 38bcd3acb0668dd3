#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Fewer cases for properties that touch the filesystem.
pub fn fs_proptest_config() -> ProptestConfig {
    let mut config = proptest_config();
    config.cases = config.cases.min(24);
    config
}

/// One label line: a class token from a small pool plus four box values,
/// or occasionally a blank line.
pub fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => (0u8..6, 0.0f64..1.0, 0.0f64..1.0).prop_map(|(class_id, x, y)| {
            format!("{class_id} {x:.4} {y:.4} 0.1000 0.1000")
        }),
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
    ]
}

/// The text of one label file.
pub fn arb_label_text(max_lines: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_line(), 0..=max_lines).prop_map(|lines| lines.join("\n"))
}

/// A split's worth of label texts, keyed by generated stems.
pub fn arb_split_labels(
    max_files: usize,
    max_lines: usize,
) -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(arb_label_text(max_lines), 0..=max_files).prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| (format!("img_{i:04}"), text))
            .collect()
    })
}

/// Lines carrying at least one whitespace-separated token.
pub fn token_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}
