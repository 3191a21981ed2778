use std::io::Write;
use std::path::PathBuf;

use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(&self, diagnostics: &[Diagnostic], files: &[PathBuf], out: &mut dyn Write) {
        for d in diagnostics {
            let _ = writeln!(out, "{d}");
        }
        let file_count = files.len();
        let offense_word = if diagnostics.len() == 1 {
            "offense"
        } else {
            "offenses"
        };
        let file_word = if file_count == 1 { "file" } else { "files" };
        let _ = writeln!(
            out,
            "\n{file_count} {file_word} inspected, {} {offense_word} detected",
            diagnostics.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};

    fn render(diagnostics: &[Diagnostic], files: &[PathBuf]) -> String {
        let mut buf = Vec::new();
        TextFormatter.format_to(diagnostics, files, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_prints_summary_only() {
        let out = render(&[], &[PathBuf::from("a.json")]);
        assert_eq!(out, "\n1 file inspected, 0 offenses detected\n");
    }

    #[test]
    fn offenses_then_summary() {
        let d = Diagnostic {
            path: "a.json".to_string(),
            location: Location { line: 2, column: 4 },
            severity: Severity::Error,
            rule_name: "Style/NoVar".to_string(),
            message: "Unexpected var.".to_string(),
        };
        let out = render(&[d], &[PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(
            out,
            "a.json:2:4: E: Style/NoVar: Unexpected var.\n\n2 files inspected, 1 offense detected\n"
        );
    }
}
