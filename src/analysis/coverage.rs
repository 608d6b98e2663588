//! Test coverage estimate
//!
//! No test suite is executed. Coverage is approximated from the share of
//! source files that are tests, saturating at a 1:1 ratio of tests to code
//! (test files making up half of all source files reads as 100%).

/// Test-file share at which the estimate saturates.
pub const SATURATION_RATIO: f64 = 0.5;

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "specs", "testing"];

/// Whether a path names a test file by common conventions.
pub fn is_test_path(path: &str) -> bool {
    let lower = path.replace('\\', "/").to_ascii_lowercase();
    let mut segments: Vec<&str> = lower.split('/').collect();
    let file = segments.pop().unwrap_or_default();

    if segments.iter().any(|s| TEST_DIRS.contains(s)) {
        return true;
    }

    let stem = file.split('.').next().unwrap_or_default();
    stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_spec")
        || (stem.len() > 4 && stem.ends_with("test") && path_stem_is_camel_test(path))
        || (stem.len() > 5 && stem.ends_with("tests") && path_stem_is_camel_test(path))
        || file.contains(".test.")
        || file.contains(".spec.")
}

/// `FooTest.java`, `FooTests.cs`: the `Test` suffix must follow a capital boundary.
fn path_stem_is_camel_test(path: &str) -> bool {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    stem.ends_with("Test") || stem.ends_with("Tests")
}

/// Estimated coverage percentage from test and source file counts.
pub fn estimate(test_files: usize, source_files: usize) -> f64 {
    if source_files == 0 {
        return 0.0;
    }
    let ratio = test_files as f64 / source_files as f64;
    (ratio / SATURATION_RATIO * 100.0).min(100.0)
}
