mod args;
mod dashboard;

use clap::Parser;
use log::{error, info, LevelFilter};
use snafu::prelude::*;

use crate::args::{Args, Command};
use crate::dashboard::*;

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

async fn run(args: Args) -> DashboardResult<()> {
    let opts = InputOptions {
        config: args.config.clone(),
        input: args.input.clone(),
        input_type: args.input_type.clone(),
        excel_worksheet_name: args.excel_worksheet_name.clone(),
    };
    // Without data, there is nothing to serve.
    let app = load_app_state(&opts).context(LoadSnafu {})?;

    match args.command {
        Command::Serve { host, port } => server::serve(app, &host, port).await,
        Command::Summary { out, reference } => run_summary(&app, out, reference),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("args: {:?}", args);

    if let Err(e) = run(args).await {
        error!("{}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            error!("  caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
