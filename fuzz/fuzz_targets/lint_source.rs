#![no_main]

use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use nodesel::linter::lint_source;
use nodesel::rule::{Rule, RuleSet};

static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    let patterns = [
        "*",
        "*:exit",
        "Program > *",
        "CallExpression[callee.name=/^(eval|alert)$/]",
        "[value>1]",
        ".body",
        "FunctionDeclaration ReturnStatement:exit",
    ];
    RuleSet::new(patterns.iter().map(|p| Rule::adhoc(p)).collect())
        .expect("fixed patterns are valid")
});

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = lint_source("fuzz.json", text, &RULES);
});
