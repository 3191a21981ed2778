use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: Metadata,
    offenses: Vec<Offense<'a>>,
}

#[derive(Serialize)]
struct Metadata {
    files_inspected: usize,
    offense_count: usize,
}

#[derive(Serialize)]
struct Offense<'a> {
    path: &'a str,
    line: usize,
    column: usize,
    severity: String,
    rule_name: &'a str,
    message: &'a str,
}

impl Formatter for JsonFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], files: &[PathBuf], out: &mut dyn Write) {
        let output = JsonOutput {
            metadata: Metadata {
                files_inspected: files.len(),
                offense_count: diagnostics.len(),
            },
            offenses: diagnostics
                .iter()
                .map(|d| Offense {
                    path: &d.path,
                    line: d.location.line,
                    column: d.location.column,
                    severity: d.severity.letter().to_string(),
                    rule_name: &d.rule_name,
                    message: &d.message,
                })
                .collect(),
        };
        match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                let _ = writeln!(out, "{text}");
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize diagnostics"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};

    fn render(diagnostics: &[Diagnostic], files: &[PathBuf]) -> String {
        let mut buf = Vec::new();
        JsonFormatter.format_to(diagnostics, files, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_produces_valid_json() {
        let out = render(&[], &[]);
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["metadata"]["files_inspected"], 0);
        assert_eq!(parsed["metadata"]["offense_count"], 0);
        assert_eq!(parsed["offenses"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn offense_fields_present() {
        let d = Diagnostic {
            path: "a.json".to_string(),
            location: Location { line: 3, column: 5 },
            severity: Severity::Fatal,
            rule_name: "Nodesel/LoadError".to_string(),
            message: "bad".to_string(),
        };
        let out = render(&[d], &[PathBuf::from("a.json")]);
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["metadata"]["files_inspected"], 1);
        assert_eq!(parsed["metadata"]["offense_count"], 1);
        let offense = &parsed["offenses"][0];
        assert_eq!(offense["path"], "a.json");
        assert_eq!(offense["line"], 3);
        assert_eq!(offense["column"], 5);
        assert_eq!(offense["severity"], "F");
        assert_eq!(offense["rule_name"], "Nodesel/LoadError");
        assert_eq!(offense["message"], "bad");
    }
}
