use clap::Parser;
use log::info;
use ping::PingVersion;
use shared::{PING_PORT, READ_DEADLINE};

#[derive(Parser, Debug)]
#[command(author, version, about = "Pings a zone server", long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long)]
    addr: String,

    /// Server port
    #[arg(short, long, default_value_t = PING_PORT)]
    port: u16,

    /// Log every datagram sent and received
    #[arg(short, long)]
    debug: bool,

    /// Use ping v1 (default)
    #[arg(short = '1', long = "v1", conflicts_with = "v2")]
    v1: bool,

    /// Use ping v2
    #[arg(short = '2', long = "v2")]
    v2: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let version = if args.v2 {
        PingVersion::V2
    } else {
        PingVersion::V1
    };

    info!("SSC Ping ({:?})", version);

    let addr = format!("{}:{}", args.addr, args.port);
    let response = ping::ping(&addr, version, args.debug, READ_DEADLINE).await?;
    info!("{}", response);

    Ok(())
}
