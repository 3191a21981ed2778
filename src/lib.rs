pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod emitter;
pub mod formatter;
pub mod fs;
pub mod generator;
pub mod linter;
pub mod logging;
pub mod matcher;
pub mod rule;
pub mod selector;
pub mod tree;

use std::io::Write;

use anyhow::Result;

use cli::Args;
use config::{ConfigError, load_config};
use formatter::create_formatter;
use fs::discover_files;
use generator::NodeEventGenerator;
use linter::{LintOptions, run_linter};
use rule::{RuleError, RuleFilter, RuleSet};

pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;
pub const EXIT_INVALID_INPUT: i32 = 2;
pub const EXIT_ERROR: i32 = 3;

/// Exit code for an error returned by [`run`]: bad selectors or config are
/// the user's to fix, anything else is an operational failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    let invalid_input = err.chain().any(|cause| {
        cause.is::<RuleError>() || cause.is::<ConfigError>() || cause.is::<serde_yml::Error>()
    });
    if invalid_input {
        EXIT_INVALID_INPUT
    } else {
        EXIT_ERROR
    }
}

/// Print each registered selector with its canonical form, phase and type
/// hint.
pub fn explain(generator: &NodeEventGenerator, out: &mut dyn Write) -> std::io::Result<()> {
    for entry in generator.selectors() {
        writeln!(out, "{}", entry.raw())?;
        writeln!(out, "  parsed: {}", entry.selector())?;
        writeln!(
            out,
            "  fires:  on {}",
            if entry.is_exit() { "leave" } else { "enter" }
        )?;
        match entry.hint() {
            Some(types) => {
                let types: Vec<&str> = types.iter().map(String::as_str).collect();
                writeln!(out, "  types:  {}", types.join(", "))?;
            }
            None => writeln!(out, "  types:  any (checked on every node)")?,
        }
    }
    Ok(())
}

/// Run the checker. Returns the exit code: 0 = clean, 1 = diagnostics
/// reported.
pub fn run(args: Args) -> Result<i32> {
    let target_dir = args.paths.first().map(|p| {
        if p.is_file() {
            p.parent().unwrap_or(p)
        } else {
            p.as_path()
        }
    });
    let config = load_config(args.config.as_deref(), target_dir)?;
    match config.config_path() {
        Some(path) => tracing::debug!(path = %path.display(), "using config"),
        None => tracing::debug!("no config file found"),
    }

    let filter = RuleFilter {
        only: args.only.clone(),
        except: args.except.clone(),
    };
    let rules = RuleSet::from_config(&config, &args.selectors, &filter)?;

    // --list-rules: print enabled rule names and exit
    if args.list_rules {
        let mut seen = std::collections::HashSet::new();
        for rule in rules.rules() {
            if seen.insert(rule.name.as_str()) {
                println!("{}", rule.name);
            }
        }
        return Ok(EXIT_CLEAN);
    }

    // --explain: describe registered selectors and exit
    if args.explain {
        let stdout = std::io::stdout();
        explain(rules.generator(), &mut stdout.lock())?;
        return Ok(EXIT_CLEAN);
    }

    if rules.is_empty() {
        tracing::warn!("no rules enabled; pass --selector or add Rules to .nodesel.yml");
    }

    let files = discover_files(&args.paths, &config)?;
    tracing::debug!(
        files = files.len(),
        rules = rules.len(),
        selectors = rules.generator().len(),
        "starting run"
    );

    let result = run_linter(
        &files,
        &rules,
        LintOptions {
            fail_fast: args.fail_fast,
        },
    );
    let formatter = create_formatter(&args.format);
    formatter.print(&result.diagnostics, &files);

    if result.diagnostics.is_empty() {
        Ok(EXIT_CLEAN)
    } else {
        Ok(EXIT_DIAGNOSTICS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explain_lists_parsed_form_and_hint() {
        let generator =
            NodeEventGenerator::new(["Program  >  Literal[value=1]", "*:exit"]).unwrap();
        let mut buf = Vec::new();
        explain(&generator, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(
            out,
            "Program  >  Literal[value=1]\n  parsed: Program > Literal[value=1]\n  fires:  on enter\n  types:  Literal\n\
             *:exit\n  parsed: *\n  fires:  on leave\n  types:  any (checked on every node)\n"
        );
    }

    #[test]
    fn rule_errors_map_to_invalid_input() {
        let err = RuleSet::new(vec![rule::Rule::adhoc("[")]).unwrap_err();
        let err = anyhow::Error::new(err).context("building rules");
        assert_eq!(exit_code_for(&err), EXIT_INVALID_INPUT);
    }

    #[test]
    fn config_errors_map_to_invalid_input() {
        let err = config::parse_config("Rules:\n  A/B:\n    Severity: x\n").unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INVALID_INPUT);
        let err = config::parse_config("Rules: [").unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INVALID_INPUT);
    }

    #[test]
    fn other_errors_map_to_generic_failure() {
        let err = anyhow::anyhow!("path does not exist: nowhere");
        assert_eq!(exit_code_for(&err), EXIT_ERROR);
    }
}
