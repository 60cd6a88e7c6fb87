mod api;
mod auth;
mod authz;
mod config;
mod context;
mod db;
mod dirs;
mod handlers;
mod logs;
mod moderation;
mod ownership;
mod request;
mod restful;
mod roles;
mod secret;
mod validate;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use config::{ConfigArgs, ServerConfig};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct ServerArgs {
    /// Print server configuration data (JSON) and exit.
    #[arg(long)]
    pub print_config: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

async fn run(args: ServerArgs) -> Result<()> {
    let cfg: ServerConfig = args.config.load("server", ServerConfig::default)?;

    if args.print_config {
        let json = serde_json::to_string_pretty(&cfg).context("marshal config")?;
        println!("{json}");
        return Ok(());
    }

    cfg.logs.init("server")?;

    let ctx = cfg.build_ctx()?;

    let restful_server = cfg.build_restful_server(ctx)?;

    restful_server.run().await.context("run restful server")?;

    info!("Server exited by user");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();
    match run(args).await {
        Ok(()) => {}
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
