use clap::Parser;
use lyrac_drv::{run, Cli, DriverError};

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            // Compile failures already rendered their diagnostics.
            if !matches!(err, DriverError::CompileFailed) {
                eprintln!("error: {}", err);
            }
            std::process::exit(err.exit_code());
        }
    }
}
