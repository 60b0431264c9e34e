use clap::{Parser, Subcommand};

/// This is a dashboard for the results of the German federal election.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file listing the results files and the
    /// presentation settings. See the manual of the election_results crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A single results file. Ignored if --config is provided.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first
    /// worksheet is used otherwise.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serves the dashboard over HTTP.
    Serve {
        /// The address to listen on.
        #[clap(long, env = "HOST", default_value = "127.0.0.1", value_parser)]
        host: String,
        /// The port to listen on.
        #[clap(short, long, env = "PORT", default_value_t = 8050, value_parser)]
        port: u16,
    },
    /// Prints the national and per-state totals in JSON.
    Summary {
        /// (file path, 'stdout' or empty) Where to write the summary.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference summary in JSON format. If provided, the program
        /// checks that the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
}
