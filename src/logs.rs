use std::path::Path;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;
use crate::workflow::Workflow;

/// Path fragments whose files are never printed.
pub const EXCLUDED_PATHS: [&str; 3] = ["steambootstrapper", "appcache", "steamapps"];

const LOG_FILE_PATTERN: &str = r"\.(log|txt|vdf)$";

/// Files whose path contains this fragment are deleted after printing when clearing.
const CLEARABLE_FRAGMENT: &str = "logs";

/// What a [`print_logs`] pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogReport {
    pub printed: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Prints every log-like file below `directory`, each inside its own group.
///
/// Files ending in `.log`, `.txt` or `.vdf` are printed unless their path
/// contains one of [`EXCLUDED_PATHS`]. With `clear`, printed files whose path
/// contains `logs` are deleted afterwards. Failures on single files are
/// reported through `sink` and do not stop the walk; an unreadable
/// `directory` is reported once.
pub fn print_logs(sink: &dyn Workflow, directory: &Path, clear: bool) -> LogReport {
    let mut report = LogReport::default();
    sink.info(&directory.display().to_string());

    if let Err(err) = std::fs::read_dir(directory) {
        sink.error(&format!("Failed to read logs in {}!\n{}", directory.display(), err));
        report.failed += 1;
        return report;
    }
    let pattern = match Regex::new(LOG_FILE_PATTERN) {
        Ok(pattern) => pattern,
        Err(err) => {
            sink.error(&format!("Failed to read logs in {}!\n{}", directory.display(), err));
            report.failed += 1;
            return report;
        }
    };

    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let name = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                sink.error(&format!("Failed to read log: {}\n{}", name, err));
                report.failed += 1;
                continue;
            }
        };
        let full_path = entry.path();
        let file = full_path
            .strip_prefix(directory)
            .unwrap_or(full_path)
            .display()
            .to_string();

        match print_log(sink, &pattern, full_path, &file, clear) {
            Ok(Outcome::Skipped) => {}
            Ok(Outcome::Printed) => report.printed += 1,
            Ok(Outcome::PrintedAndRemoved) => {
                report.printed += 1;
                report.removed += 1;
            }
            Err(err) => {
                sink.error(&format!("Failed to read log: {}\n{}", file, err));
                report.failed += 1;
            }
        }
    }
    debug!("{:?} for {}", report, directory.display());
    report
}

enum Outcome {
    Skipped,
    Printed,
    PrintedAndRemoved,
}

fn print_log(
    sink: &dyn Workflow,
    pattern: &Regex,
    full_path: &Path,
    file: &str,
    clear: bool,
) -> std::io::Result<Outcome> {
    if !std::fs::metadata(full_path)?.is_file() {
        return Ok(Outcome::Skipped);
    }
    if !pattern.is_match(file) {
        return Ok(Outcome::Skipped);
    }
    let full = full_path.to_string_lossy();
    if EXCLUDED_PATHS.iter().any(|excluded| full.contains(excluded)) {
        return Ok(Outcome::Skipped);
    }
    let content = std::fs::read_to_string(full_path)?;
    sink.start_group(file);
    sink.info(&content);
    sink.end_group();
    if clear && full.contains(CLEARABLE_FRAGMENT) {
        std::fs::remove_file(full_path)?;
        return Ok(Outcome::PrintedAndRemoved);
    }
    Ok(Outcome::Printed)
}
