use clap::Parser;
use mxl_env::cli::Cli;
use mxl_env::{commands, ui};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so printed environments stay clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("mxl_env={}", cli.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match commands::execute(cli) {
        Ok(code) => code,
        Err(err) => {
            ui::error(format!("{err:#}"));
            err.downcast_ref::<mxl_env::Error>()
                .map(mxl_env::Error::exit_code)
                .unwrap_or(1)
        }
    };

    std::process::exit(code);
}
