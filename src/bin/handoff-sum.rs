use std::io::{self, BufReader};

use clap::Parser;

use handoff_sum::app::{App, AppError};
use handoff_sum::cli::Cli;
use handoff_sum::config::RunConfig;
use handoff_sum::consumer::StdoutReporter;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_target(false)
        .format_timestamp(None)
        .init();

    // Build run config from environment, then apply CLI overrides
    let config =
        RunConfig::from_env().with_overrides(cli.consumers, cli.max_sleep_ms, cli.debug);

    let app = match App::new(config) {
        Ok(app) => app.with_ctrlc_handler(),
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    let result = app
        .run(BufReader::new(io::stdin()), &StdoutReporter)
        .and_then(|report| {
            report
                .write_total(io::stdout().lock())
                .map_err(AppError::from)
        });

    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
