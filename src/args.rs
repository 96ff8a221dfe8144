use clap::{Parser, Subcommand};

/// Loads roll-call vote spreadsheets into a SQLite database and serves reports about them.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, default main.db) The SQLite database holding the vote records. It is created
    /// if it does not exist.
    #[clap(
        long,
        env = "ROLLCALL_DATABASE",
        default_value = "main.db",
        value_parser,
        global = true
    )]
    pub database: String,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reads every spreadsheet of a directory into the database. The name of each file must
    /// start with the date of the vote: YYYYMMDD_
    Ingest {
        /// (directory path, default ./input) The directory containing the spreadsheets.
        #[clap(short, long, default_value = "./input", value_parser)]
        input: String,
    },
    /// Starts the HTTP API.
    Serve {
        /// (default 0.0.0.0) The address to listen on.
        #[clap(long, default_value = "0.0.0.0", value_parser)]
        host: String,
        /// (default 3000) The port to listen on.
        #[clap(short, long, env = "PORT", default_value_t = 3000, value_parser)]
        port: u16,
    },
}
