//! Chat relay server binary.
//!
//! # Usage
//!
//! ```bash
//! chat-relay --bind 0.0.0.0:7000
//! ```

use std::process;

use chat_relay::ChatServer;
use clap::Parser;
use env_logger::Env;
use log::error;

/// Chat room relay server
#[derive(Parser, Debug)]
#[command(name = "chat-relay")]
#[command(about = "Line-oriented chat room relay server")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:7000")]
    bind: String,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut server = match ChatServer::bind(&args.bind) {
        Ok(server) => server,
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    };

    if let Err(err) = server.shutdown_flag().install() {
        error!("failed to install signal handlers: {err}");
        process::exit(1);
    }

    if let Ok(addr) = server.local_addr() {
        println!(" - Chat room server running on {addr}, press CTRL+C to exit");
    }

    if let Err(err) = server.run() {
        error!("{err}");
        process::exit(1);
    }
}
