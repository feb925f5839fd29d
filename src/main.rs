use clap::Parser;

mod cli;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    match cli.run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Logging may not be up yet if config loading failed
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
