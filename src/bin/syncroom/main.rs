use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use syncroom_server::security::get_ssl_mode_settings;
use syncroom_server::sync_server::{SyncServer, SyncServerConfig};

/// Watch a video in sync with a friend
#[derive(Parser, Debug)]
struct Args {
	#[arg(long="host", default_value_t=IpAddr::from([0, 0, 0, 0]))]
	host: IpAddr,
	#[arg(short='p', long="port", default_value_t=8080)]
	port: u16,
	/// Directory holding the static client files
	#[arg(short='a', long="assets", default_value="assets")]
	assets_dir: PathBuf,
	/// Largest accepted body for room creation requests
	#[arg(long="max-body-bytes", default_value_t=16 * 1024)]
	max_body_bytes: u64,
}

#[tokio::main]
async fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();

	let tls = match get_ssl_mode_settings() {
		Ok(tls) => tls,
		Err(e) => {
			log::error!("Invalid TLS configuration: {e}");
			std::process::exit(1);
		}
	};

	let sync_server = SyncServer::new(SyncServerConfig {
		host: args.host,
		port: args.port,
		assets_dir: args.assets_dir,
		max_body_bytes: args.max_body_bytes,
		tls,
	});

	if let Err(e) = sync_server.run().await {
		log::error!("Server error: {e}");
		std::process::exit(1);
	}
}
