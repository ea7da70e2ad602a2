mod config;
mod runner;

use std::net::{IpAddr, SocketAddr};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use config::RunnerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Offline,
    Client,
    Server,
}

#[derive(Parser)]
#[command(name = "hopper-server")]
#[command(about = "Headless hopper session runner")]
struct Args {
    /// Session mode to run in
    #[arg(short, long, value_enum, default_value_t = Mode::Server)]
    mode: Mode,

    /// Bind address for server mode
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Server address to connect to in client mode
    #[arg(short, long, default_value = "127.0.0.1")]
    connect: String,

    #[arg(short, long, default_value_t = hopper::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = hopper::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    /// Seconds between status log lines
    #[arg(long, default_value_t = 10)]
    status_interval: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = RunnerConfig {
        tick_rate: args.tick_rate,
        status_interval_secs: args.status_interval,
    };

    match args.mode {
        Mode::Server => {
            let bind: IpAddr = args.bind.parse()?;
            runner::run_server(SocketAddr::new(bind, args.port), &config)
        }
        Mode::Client => {
            let server: IpAddr = args.connect.parse()?;
            runner::run_client(SocketAddr::new(server, args.port), &config)
        }
        Mode::Offline => runner::run_offline(&config),
    }
}
