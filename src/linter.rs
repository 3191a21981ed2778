use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::rule::RuleSet;
use crate::tree::Tree;

/// Rule name for files that could not be read or are not a tree.
pub const LOAD_ERROR_RULE: &str = "Nodesel/LoadError";

/// Thread-safe phase timing counters (nanoseconds) for profiling.
struct PhaseTimers {
    file_io_ns: AtomicU64,
    tree_build_ns: AtomicU64,
    dispatch_ns: AtomicU64,
}

impl PhaseTimers {
    fn new() -> Self {
        Self {
            file_io_ns: AtomicU64::new(0),
            tree_build_ns: AtomicU64::new(0),
            dispatch_ns: AtomicU64::new(0),
        }
    }

    fn add(counter: &AtomicU64, since: Instant) {
        counter.fetch_add(since.elapsed().as_nanos() as u64, Ordering::Relaxed);
    }

    fn log_summary(&self, total: Duration, file_count: usize) {
        let load = |counter: &AtomicU64| Duration::from_nanos(counter.load(Ordering::Relaxed));
        tracing::debug!(
            files = file_count,
            file_io = ?load(&self.file_io_ns),
            tree_build = ?load(&self.tree_build_ns),
            dispatch = ?load(&self.dispatch_ns),
            wall_clock = ?total,
            "linter phase breakdown (per-phase times are summed across threads)"
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LintOptions {
    /// Stop scheduling files once one has produced a diagnostic.
    pub fail_fast: bool,
}

pub struct LintResult {
    pub diagnostics: Vec<Diagnostic>,
    pub file_count: usize,
}

fn load_error(path: &str, message: String) -> Diagnostic {
    Diagnostic {
        path: path.to_string(),
        location: Location::default(),
        severity: Severity::Fatal,
        rule_name: LOAD_ERROR_RULE.to_string(),
        message,
    }
}

/// Lint one tree given as JSON text. Used directly for in-memory input and
/// by [`run_linter`] for each file.
pub fn lint_source(path: &str, text: &str, rules: &RuleSet) -> Vec<Diagnostic> {
    let mut diagnostics = lint_source_inner(path, text, rules, None);
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    diagnostics
}

fn lint_source_inner(
    path: &str,
    text: &str,
    rules: &RuleSet,
    timers: Option<&PhaseTimers>,
) -> Vec<Diagnostic> {
    let build_start = Instant::now();
    let tree = match Tree::from_json_str(text) {
        Ok(tree) => tree,
        Err(e) => return vec![load_error(path, e.to_string())],
    };
    if let Some(t) = timers {
        PhaseTimers::add(&t.tree_build_ns, build_start);
    }

    let dispatch_start = Instant::now();
    let diagnostics = rules.check(path, &tree);
    if let Some(t) = timers {
        PhaseTimers::add(&t.dispatch_ns, dispatch_start);
    }
    diagnostics
}

fn lint_file(path: &Path, rules: &RuleSet, timers: Option<&PhaseTimers>) -> Vec<Diagnostic> {
    let path_str = path.display().to_string();

    let io_start = Instant::now();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path_str, error = %e, "failed to read file");
            return vec![load_error(&path_str, format!("failed to read file: {e}"))];
        }
    };
    if let Some(t) = timers {
        PhaseTimers::add(&t.file_io_ns, io_start);
    }

    lint_source_inner(&path_str, &text, rules, timers)
}

pub fn run_linter(files: &[PathBuf], rules: &RuleSet, options: LintOptions) -> LintResult {
    let wall_start = Instant::now();
    let timers = tracing::enabled!(tracing::Level::DEBUG).then(PhaseTimers::new);
    let found_offense = AtomicBool::new(false);

    let diagnostics: Vec<Diagnostic> = files
        .par_iter()
        .flat_map(|path| {
            if options.fail_fast && found_offense.load(Ordering::Relaxed) {
                return Vec::new();
            }
            let result = lint_file(path, rules, timers.as_ref());
            if options.fail_fast && !result.is_empty() {
                found_offense.store(true, Ordering::Relaxed);
            }
            result
        })
        .collect();

    let mut sorted = diagnostics;
    sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    if let Some(ref t) = timers {
        t.log_summary(wall_start.elapsed(), files.len());
    }

    LintResult {
        diagnostics: sorted,
        file_count: files.len(),
    }
}
