use std::process;

use clap::Parser;

use nodesel::cli::Args;
use nodesel::logging::init_logging;

fn main() {
    let args = Args::parse();
    init_logging(args.debug);
    match nodesel::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(nodesel::exit_code_for(&e));
        }
    }
}
