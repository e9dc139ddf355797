#[macro_use]
extern crate log;

use docopt::Docopt;
use rbench::HarnessConfig;
use rscript::Engine;

const USAGE: &str = "
Times calling script handlers once per event against once per trace.

Usage:
  rbench [<script>]
  rbench (-h | --help)

Options:
  -h --help  Show this screen.
";

fn main() {
    env_logger::init();
    let argv = Docopt::new(USAGE)
        .and_then(|d| d.argv(std::env::args()).parse())
        .unwrap_or_else(|e| e.exit());
    let args: Vec<String> = match argv.get_str("<script>") {
        "" => vec![],
        script => vec![script.to_string()],
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = rbench::run(&args, Engine::new, &HarnessConfig::default(), &mut out) {
        error!("could not write results: {}", e);
        std::process::exit(1);
    }
}
