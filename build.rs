use std::path::{Path, PathBuf};
use std::process::Command;

const MAX_LINES: usize = 750;

const CHECKED_EXTENSIONS: &[&str] = &["rs", "yaml"];

/// Only first-party sources are checked.
const CHECKED_DIRS: &[&str] = &["src", "scenarios"];

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/main");
    println!("cargo:rerun-if-changed=.git/packed-refs");

    let sha = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=MIGRATOR_GIT_SHA={}", sha);

    let files = collect_files_to_check();
    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    enforce_line_limits(&files);
    enforce_no_dead_code_allows(&files);
    enforce_no_test_skips(&files);
}

fn manifest_root() -> PathBuf {
    PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set"))
}

fn collect_files_to_check() -> Vec<PathBuf> {
    let root = manifest_root();
    let mut files = Vec::new();
    for dir in CHECKED_DIRS {
        walk_directory(&root.join(dir), &mut files);
    }
    files
}

fn walk_directory(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_directory(&path, files);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CHECKED_EXTENSIONS.contains(&ext))
        {
            files.push(path);
        }
    }
}

fn rust_files(files: &[PathBuf]) -> impl Iterator<Item = &PathBuf> {
    files
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("rs"))
}

fn relative(path: &Path) -> PathBuf {
    let root = manifest_root();
    path.strip_prefix(&root).unwrap_or(path).to_path_buf()
}

fn report_violations(title: &str, violations: &[(PathBuf, usize, String)], advice: &[&str]) {
    eprintln!("\n========================================");
    eprintln!("{}", title);
    eprintln!("========================================");
    eprintln!();
    for (path, line_num, detail) in violations {
        eprintln!("  {}:{}", path.display(), line_num);
        eprintln!("    {}", detail.trim());
        eprintln!();
    }
    eprintln!("========================================");
    for line in advice {
        eprintln!("{}", line);
    }
    eprintln!("========================================\n");
}

fn enforce_line_limits(files: &[PathBuf]) {
    let mut violations = Vec::new();
    for file in files {
        match std::fs::read_to_string(file) {
            Ok(content) => {
                let line_count = content.lines().filter(|l| !l.trim().is_empty()).count();
                if line_count > MAX_LINES {
                    violations.push((
                        relative(file),
                        line_count,
                        format!("{} lines (exceeds by {})", line_count, line_count - MAX_LINES),
                    ));
                }
            }
            Err(e) => println!(
                "cargo:warning=Could not read file {}: {}",
                relative(file).display(),
                e
            ),
        }
    }

    if !violations.is_empty() {
        report_violations(
            &format!("FILE LINE LIMIT EXCEEDED (max {} lines)", MAX_LINES),
            &violations,
            &["Please split these files into smaller modules."],
        );
        panic!(
            "Build failed: {} file(s) exceed the {} line limit",
            violations.len(),
            MAX_LINES
        );
    }
}

fn enforce_no_dead_code_allows(files: &[PathBuf]) {
    let mut violations = Vec::new();

    for file in rust_files(files) {
        if let Ok(content) = std::fs::read_to_string(file) {
            for (line_num, line) in content.lines().enumerate() {
                let trimmed = line.trim();
                if (trimmed.starts_with("#[allow(") || trimmed.starts_with("#![allow("))
                    && trimmed.contains("dead_code")
                {
                    violations.push((relative(file), line_num + 1, line.to_string()));
                }
            }
        }
    }

    if !violations.is_empty() {
        report_violations(
            "#[allow(dead_code)] IS NOT ALLOWED",
            &violations,
            &[
                "Do NOT use #[allow(dead_code)] to silence warnings.",
                "  - DELETE unused code entirely",
                "  - If the code is for tests, use #[cfg(test)]",
            ],
        );
        panic!(
            "Build failed: {} #[allow(dead_code)] occurrence(s) found. Remove the dead code.",
            violations.len()
        );
    }
}

/// Bans tests that silently skip instead of failing.
fn enforce_no_test_skips(files: &[PathBuf]) {
    let skip_patterns = ["Skipping test", "skipping test", "Test skipped", "test skipped"];

    let mut violations = Vec::new();

    for file in rust_files(files) {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();

        let mut in_test_fn = false;
        let mut test_fn_start = 0;
        let mut brace_depth = 0i32;

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();

            if trimmed == "#[test]" || trimmed.starts_with("#[tokio::test") {
                in_test_fn = true;
                test_fn_start = i + 1;
                brace_depth = 0;
                continue;
            }

            if !in_test_fn {
                continue;
            }

            for c in line.chars() {
                match c {
                    '{' => brace_depth += 1,
                    '}' => brace_depth -= 1,
                    _ => {}
                }
            }

            if let Some(pattern) = skip_patterns.iter().find(|p| line.contains(*p)) {
                violations.push((
                    relative(file),
                    test_fn_start,
                    format!("test contains skip pattern: {}", pattern),
                ));
                in_test_fn = false;
            } else if trimmed == "return;" && brace_depth > 1 {
                violations.push((
                    relative(file),
                    test_fn_start,
                    "test has conditional early return (silent skip)".to_string(),
                ));
                in_test_fn = false;
            } else if brace_depth == 0 && trimmed.ends_with('}') {
                in_test_fn = false;
            }
        }
    }

    if !violations.is_empty() {
        report_violations(
            "SILENT TEST SKIPS ARE NOT ALLOWED",
            &violations,
            &["Tests must FAIL if they cannot run, not silently pass."],
        );
        panic!(
            "Build failed: {} silent test skip(s) found. Make tests fail instead of skip.",
            violations.len()
        );
    }
}
