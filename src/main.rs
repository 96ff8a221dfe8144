use clap::Parser;
use log::{debug, error, info};

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use snafu::prelude::*;

mod args;
mod rollcall;

use crate::args::{Args, Command};
use crate::rollcall::ingest::ingest_directory;
use crate::rollcall::server;
use crate::rollcall::store::VoteStore;
use crate::rollcall::{error_chain, RollcallResult};

fn run(args: &Args) -> RollcallResult<()> {
    let store = VoteStore::open(&args.database)?;
    match &args.command {
        Command::Ingest { input } => {
            ingest_directory(&store, Path::new(input))?;
            info!(
                "{} record(s) in table {}",
                store.count_records()?,
                rollcall::store::TABLE
            );
            Ok(())
        }
        Command::Serve { host, port } => {
            let ip: IpAddr = match host.parse() {
                Ok(ip) => ip,
                Err(e) => whatever!("Invalid host {:?}: {}", host, e),
            };
            let addr = SocketAddr::new(ip, *port);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => whatever!("Cannot start the runtime: {}", e),
            };
            rt.block_on(server::serve(Arc::new(store), addr))
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        error!("{}", error_chain(&e));
        std::process::exit(1);
    }
}
