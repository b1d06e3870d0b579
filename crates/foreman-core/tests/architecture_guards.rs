//! Architecture guard tests for the foreman workspace.
//!
//! These tests scan source files to enforce design-level consistency:
//! - Error types derive thiserror instead of hand-writing Display
//! - No `Result<_, String>` in foreman-core
//! - No `unwrap()`/`expect()` outside tests in foreman-core
//! - No bare generic type names for public types
//!
//! Run: `cargo test --package foreman-core --test architecture_guards -- --nocapture`

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Walk `dir` recursively, collecting .rs files that pass `filter`.
fn collect_rs_files(dir: &Path, filter: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut result = Vec::new();
    if !dir.exists() {
        return result;
    }
    for entry in walkdir(dir) {
        if entry.extension().is_some_and(|e| e == "rs") && filter(&entry) {
            result.push(entry);
        }
    }
    result
}

/// Simple recursive directory walk (no external dep).
fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(walkdir(&path));
            } else {
                files.push(path);
            }
        }
    }
    files
}

/// Return the workspace root (two levels up from foreman-core/tests/).
fn workspace_root() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")); // crates/foreman-core
    manifest
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .expect("cannot determine workspace root")
        .to_path_buf()
}

fn is_test_file(path: &Path) -> bool {
    let s = path.to_string_lossy();
    s.contains("/tests/")
        || s.ends_with("/tests.rs")
        || s.ends_with("_tests.rs")
        || s.ends_with("_test.rs")
}

/// Strip the workspace root prefix for display.
fn rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Source lines before the file's `#[cfg(test)] mod tests` block
fn production_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    let lines: Vec<&str> = content.lines().collect();
    let end = lines
        .windows(2)
        .position(|w| w[0].trim() == "#[cfg(test)]" && w[1].trim_start().starts_with("mod tests"))
        .unwrap_or(lines.len());
    lines.into_iter().take(end).enumerate()
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with('*')
}

fn report(title: &str, hint: &str, violations: &[(String, usize, String)]) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("\n{}\n{}\n\n", title, hint);
    for (file, line, text) in violations {
        msg.push_str(&format!("  {}:{} -> {}\n", file, line, text));
    }
    msg.push_str("\nAdd to allowlist in architecture_guards.rs if intentional.\n");
    panic!("{msg}");
}

// ---------------------------------------------------------------------------
// Error types must use thiserror, no hand-written Display
// ---------------------------------------------------------------------------

#[test]
fn test_error_types_use_thiserror() {
    let root = workspace_root();
    let files = collect_rs_files(&root.join("crates"), &|p| !is_test_file(p));
    let mut violations = Vec::new();

    for file in &files {
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        let relative = rel(file, &root);
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("impl")
                && trimmed.contains("Display for")
                && trimmed.contains("Error")
            {
                violations.push((relative.clone(), i + 1, trimmed.to_string()));
            }
        }
    }

    report(
        "Hand-written Display for Error types detected.",
        "Use #[derive(thiserror::Error)] instead.",
        &violations,
    );
}

// ---------------------------------------------------------------------------
// No Result<_, String> in foreman-core (use ForemanError/thiserror)
// ---------------------------------------------------------------------------

#[test]
fn test_no_result_string_in_core() {
    let root = workspace_root();
    let files = collect_rs_files(&root.join("crates/foreman-core/src"), &|p| !is_test_file(p));
    let mut violations = Vec::new();

    for file in &files {
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        let relative = rel(file, &root);
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if is_comment(trimmed) {
                continue;
            }
            if let Some(result_pos) = trimmed.find("Result<") {
                let after_result = &trimmed[result_pos..];
                if after_result.contains(", String>") || after_result.contains(",String>") {
                    violations.push((relative.clone(), i + 1, trimmed.to_string()));
                }
            }
        }
    }

    report(
        "Result<_, String> found in foreman-core.",
        "Use ForemanResult / thiserror error types instead.",
        &violations,
    );
}

// ---------------------------------------------------------------------------
// No unwrap()/expect() in foreman-core production code
// ---------------------------------------------------------------------------

#[test]
fn test_no_unwrap_in_core() {
    let root = workspace_root();
    let files = collect_rs_files(&root.join("crates/foreman-core/src"), &|p| !is_test_file(p));
    let mut violations = Vec::new();

    for file in &files {
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        let relative = rel(file, &root);
        for (i, line) in production_lines(&content) {
            let trimmed = line.trim();
            if is_comment(trimmed) {
                continue;
            }
            if trimmed.contains(".unwrap()") || trimmed.contains(".expect(") {
                violations.push((relative.clone(), i + 1, trimmed.to_string()));
            }
        }
    }

    report(
        "unwrap()/expect() outside tests in foreman-core.",
        "Propagate with `?` and a ForemanError instead.",
        &violations,
    );
}

// ---------------------------------------------------------------------------
// No bare generic type names for public types
// ---------------------------------------------------------------------------

#[test]
fn test_no_bare_generic_type_names() {
    let root = workspace_root();

    let bare_names: HashSet<&str> = ["Error", "Status", "Result", "Context", "Session"]
        .into_iter()
        .collect();

    let files = collect_rs_files(&root.join("crates"), &|p| !is_test_file(p));
    let mut violations = Vec::new();

    for file in &files {
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        let relative = rel(file, &root);
        for (i, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if !trimmed.starts_with("pub struct") && !trimmed.starts_with("pub enum") {
                continue;
            }
            let type_name = trimmed
                .trim_start_matches("pub struct ")
                .trim_start_matches("pub enum ")
                .split(|c: char| !c.is_alphanumeric() && c != '_')
                .next()
                .unwrap_or("");
            if bare_names.contains(type_name) {
                violations.push((relative.clone(), i + 1, trimmed.to_string()));
            }
        }
    }

    report(
        "Bare generic type names detected for public types.",
        "Use a domain prefix: ForemanError, TerminalConfig, SessionDescriptor, etc.",
        &violations,
    );
}
