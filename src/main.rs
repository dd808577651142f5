use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use dockimg::Client;
use log::debug;

use crate::cmd::CmdArgs;

mod cmd;
mod init;
mod subcmd;

fn main() -> ExitCode {
    let args = CmdArgs::parse();
    init::log_init(args.verbose);
    match run(args) {
        Ok(_) => {
            subcmd::print_success();
            ExitCode::SUCCESS
        }
        Err(err) => {
            subcmd::print_failed(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CmdArgs) -> Result<()> {
    let client = match &args.api_version {
        None => Client::new(&args.host)?,
        Some(version) => Client::new_versioned(&args.host, version)?,
    };
    debug!("Using daemon at {}", client.endpoint());
    subcmd::run(&client, args.command)
}
