//! Benchmark selector dispatch on synthetic trees.
//!
//! Usage:
//!   cargo run --release --bin bench_nodesel                    # default sizes
//!   cargo run --release --bin bench_nodesel -- --nodes 200000  # one larger tree
//!   cargo run --release --bin bench_nodesel -- --output bench/results.md
//!
//! Each run times tree loading, hinted dispatch through the generator, and
//! a naive pass that checks every selector against every node.

use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use serde_json::{Value, json};

use nodesel::emitter::Recorder;
use nodesel::generator::NodeEventGenerator;
use nodesel::matcher::Matcher;
use nodesel::tree::Tree;

// --- CLI ---

#[derive(Parser)]
#[command(about = "Benchmark nodesel dispatch. Prints a markdown table.")]
struct Args {
    /// Approximate node counts to benchmark (repeatable)
    #[arg(long = "nodes", default_values_t = [1_000usize, 10_000, 100_000])]
    nodes: Vec<usize>,

    /// Timed runs per size; the fastest is reported
    #[arg(long, default_value_t = 5)]
    runs: u32,

    /// Also write the table to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

// --- Workload ---

static SELECTORS: &[&str] = &[
    "Program",
    "FunctionDeclaration",
    "FunctionDeclaration:exit",
    "CallExpression[callee.name=/^(eval|setTimeout)$/]",
    "FunctionDeclaration ReturnStatement",
    "BlockStatement > ExpressionStatement",
    "IfStatement > .test",
    "Literal[value>100]",
    "Identifier[name=\"x\"]",
    "VariableDeclaration[kind=var], VariableDeclaration[kind=let]",
    "[loc.start.line>1000]",
    "*:exit",
];

/// A function containing a mix of statements; about 20 nodes.
fn function(index: usize) -> Value {
    json!({
        "type": "FunctionDeclaration",
        "id": { "type": "Identifier", "name": format!("f{index}") },
        "params": [{ "type": "Identifier", "name": "x" }],
        "loc": { "start": { "line": index * 8 + 1, "column": 0 } },
        "body": {
            "type": "BlockStatement",
            "body": [
                {
                    "type": "VariableDeclaration",
                    "kind": if index % 2 == 0 { "var" } else { "const" },
                    "declarations": [{
                        "type": "VariableDeclarator",
                        "id": { "type": "Identifier", "name": "y" },
                        "init": { "type": "Literal", "value": index % 200 }
                    }]
                },
                {
                    "type": "IfStatement",
                    "test": {
                        "type": "BinaryExpression",
                        "operator": ">",
                        "left": { "type": "Identifier", "name": "x" },
                        "right": { "type": "Identifier", "name": "y" }
                    },
                    "consequent": {
                        "type": "ExpressionStatement",
                        "expression": {
                            "type": "CallExpression",
                            "callee": {
                                "type": "Identifier",
                                "name": if index % 10 == 0 { "eval" } else { "log" }
                            },
                            "arguments": [{ "type": "Identifier", "name": "x" }]
                        }
                    },
                    "alternate": null
                },
                {
                    "type": "ReturnStatement",
                    "argument": { "type": "Identifier", "name": "y" }
                }
            ]
        }
    })
}

fn program(approx_nodes: usize) -> Value {
    let functions = (approx_nodes / 20).max(1);
    json!({
        "type": "Program",
        "sourceType": "script",
        "body": (0..functions).map(function).collect::<Vec<_>>()
    })
}

// --- Timing ---

fn fastest<T>(runs: u32, mut f: impl FnMut() -> T) -> (Duration, T) {
    let start = Instant::now();
    let mut out = f();
    let mut best = start.elapsed();
    for _ in 1..runs {
        let start = Instant::now();
        out = f();
        best = best.min(start.elapsed());
    }
    (best, out)
}

/// Every selector checked on every node, without type hints.
fn naive_events(generator: &NodeEventGenerator, tree: &Tree) -> usize {
    let mut matcher = Matcher::new(tree);
    let mut events = 0;
    for node in tree.node_ids() {
        for entry in generator.selectors() {
            if matcher.is_match(entry.selector(), node) {
                events += 1;
            }
        }
    }
    events
}

fn ms(d: Duration) -> String {
    format!("{:.2}", d.as_secs_f64() * 1000.0)
}

fn main() {
    let args = Args::parse();
    let generator = match NodeEventGenerator::new(SELECTORS.iter().copied()) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };

    let mut table = String::new();
    let _ = writeln!(table, "| nodes | load (ms) | dispatch (ms) | naive (ms) | events |");
    let _ = writeln!(table, "|------:|----------:|--------------:|-----------:|-------:|");

    for &size in &args.nodes {
        let text = program(size).to_string();
        let (load, tree) = fastest(args.runs, || Tree::from_json_str(&text));
        let tree = match tree {
            Ok(tree) => tree,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(3);
            }
        };

        let (dispatch, events) = fastest(args.runs, || {
            let mut recorder = Recorder::new();
            generator.run(&tree, &mut recorder);
            recorder.len()
        });
        let (naive, naive_count) = fastest(args.runs, || naive_events(&generator, &tree));
        if naive_count != events {
            eprintln!("warning: naive pass found {naive_count} matches, dispatch emitted {events}");
        }

        let _ = writeln!(
            table,
            "| {} | {} | {} | {} | {} |",
            tree.len(),
            ms(load),
            ms(dispatch),
            ms(naive),
            events
        );
        eprintln!("{size}: done");
    }

    print!("{table}");
    if let Some(path) = args.output {
        if let Err(e) = fs::write(&path, &table) {
            eprintln!("error: failed to write {}: {e}", path.display());
            std::process::exit(3);
        }
    }
}
