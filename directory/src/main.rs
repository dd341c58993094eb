use clap::Parser;
use directory::packets::{PROTOCOL_CONTINUUM, PROTOCOL_VIE};
use directory::{DirectoryConfig, DirectorySession};
use log::info;
use shared::{Connection, DIRECTORY_PORT};

#[derive(Parser, Debug)]
#[command(author, version, about = "Lists the zones known to a directory server", long_about = None)]
struct Args {
    /// Directory server address
    address: String,

    /// Directory server port
    #[arg(short, long, default_value_t = DIRECTORY_PORT)]
    port: u16,

    /// Log every datagram sent and received
    #[arg(short, long)]
    debug: bool,

    /// Only list zones with at least this many players
    #[arg(short, long, default_value = "0")]
    min_players: u32,

    /// Log in as a Continuum client instead of VIE
    #[arg(long)]
    continuum: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let addr = format!("{}:{}", args.address, args.port);
    info!("Requesting directory at {}", addr);

    let mut connection = Connection::dial(&addr).await?;
    connection.set_debug(args.debug);

    let config = DirectoryConfig {
        min_players: args.min_players,
        protocol_version: if args.continuum {
            PROTOCOL_CONTINUUM
        } else {
            PROTOCOL_VIE
        },
        ..Default::default()
    };

    let mut session = DirectorySession::new(connection, config);
    let directory = session.directory().await?;

    for entry in &directory {
        println!("---");
        println!("{}", entry);
    }
    println!("---");

    Ok(())
}
