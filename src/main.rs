// Entrypoint for flight-cu.
// - Keeps `main` small: parse arguments and hand them to the library.
// - Any error ends up here, is printed once and sets exit status 1.

use charge_client::{cli, ui};
use clap::Parser;

fn main() {
    let args = cli::Cli::parse();
    if let Err(err) = cli::run(args) {
        ui::error(err);
        std::process::exit(1);
    }
}
