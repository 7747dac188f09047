use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use warp::filters::path::FullPath;
use warp::filters::ws::Ws;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::error::{handle_rejection, ApiError};
use crate::join_page;
use crate::naming::{extract_video_id, room_pathname};
use crate::participant::handle_websocket;
use crate::rooms_registry::RoomsRegistry;
use crate::security::SSLModeSettings;
use crate::uuids::{InvalidRoomId, RoomId};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Deserialize)]
struct CreateRoomRequest {
	#[serde(rename = "VideoURL", alias = "videoURL")]
	video_url: String
}

#[derive(Serialize)]
struct CreateRoomResponse {
	pathname: String
}

#[derive(Deserialize)]
struct JoinQuery {
	videoid: Option<String>
}

#[derive(Debug, Clone)]
pub struct SyncServerConfig {
	pub host: IpAddr,
	pub port: u16,
	/// Directory served as static files, the join page expects `room.js` in it
	pub assets_dir: PathBuf,
	pub max_body_bytes: u64,
	pub tls: Option<SSLModeSettings>,
}

impl Default for SyncServerConfig {
	fn default() -> Self {
		SyncServerConfig {
			host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
			port: 8080,
			assets_dir: PathBuf::from("assets"),
			max_body_bytes: 16 * 1024,
			tls: None,
		}
	}
}

#[derive(Debug, Default)]
pub struct SyncServer {
	pub config: SyncServerConfig,
	pub rooms: RoomsRegistry,
}

impl SyncServer {
	pub fn new(config: SyncServerConfig) -> Self {
		SyncServer {
			config,
			rooms: RoomsRegistry::new(),
		}
	}

	/// Every route of the server, errors already turned into responses
	pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
		let with_rooms = warp::any().map({
			let rooms = self.rooms.clone();
			move || rooms.clone()
		});

		let create = warp::path!("rooms")
			.and(warp::post())
			.and(warp::header::optional::<String>("content-type"))
			.and(warp::body::content_length_limit(self.config.max_body_bytes))
			.and(warp::body::bytes())
			.and(with_rooms.clone())
			.and_then(create_room);

		let join = warp::path!("rooms" / String)
			.and(warp::get().or(warp::post()).unify())
			.and(warp::query::<JoinQuery>())
			.and(with_rooms.clone())
			.and_then(join_room);

		let upgrade = warp::path!("ws" / String)
			.and(warp::ws())
			.and(with_rooms)
			.and_then(upgrade_connection);

		let assets = warp::get().and(warp::fs::dir(self.config.assets_dir.clone()));

		let room_id_present = warp::path::full()
			.and_then(require_room_id)
			.untuple_one();

		room_id_present
			.and(create.or(join).or(upgrade).or(assets))
			.recover(handle_rejection)
			.with(warp::log::custom(log_request))
	}

	pub async fn run(&self) -> Result<(), Error> {
		let socket_addr = SocketAddr::new(self.config.host, self.config.port);

		// Stupid syntax
		let server = warp::serve(self.routes());
		match &self.config.tls {
			Some(ssl_settings) => {
				log::info!("Serving on {socket_addr} in secure mode");
				let (_, serving) = server
					.tls()
					.cert_path(&ssl_settings.cert_path)
					.key_path(&ssl_settings.key_path)
					.bind_with_graceful_shutdown(socket_addr, shutdown_signal());
				serving.await;
			},
			None => {
				let (addr, serving) = server.try_bind_with_graceful_shutdown(socket_addr, shutdown_signal())?;
				log::info!("Serving on {addr} in non-secure mode");
				serving.await;
			}
		}

		log::info!("Server stopped");
		Ok(())
	}
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => log::info!("Shutting down"),
		Err(e) => {
			log::error!("Unable to listen for the shutdown signal: {e}");
			std::future::pending::<()>().await
		}
	}
}

fn log_request(info: warp::log::Info) {
	let remote = info.remote_addr().map_or_else(|| "-".to_string(), |addr| addr.to_string());

	log::info!(
		target: "syncroom::requests",
		"{remote} {:?} {} {} {} {:?}",
		info.version(),
		info.method(),
		info.path(),
		info.status().as_u16(),
		info.elapsed()
	);
}

fn is_json(content_type: Option<&str>) -> bool {
	content_type
		.and_then(|value| value.split(';').next())
		.is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// `/rooms/` and `/ws/` would otherwise fall through to other routes
async fn require_room_id(path: FullPath) -> Result<(), Rejection> {
	match path.as_str() {
		"/rooms/" | "/ws/" => Err(ApiError::InvalidRoomId(InvalidRoomId(String::new())).into()),
		_ => Ok(())
	}
}

async fn create_room(content_type: Option<String>, body: Bytes, rooms: RoomsRegistry) -> Result<impl Reply, Rejection> {
	if !is_json(content_type.as_deref()) {
		return Err(ApiError::UnsupportedMediaType(content_type).into());
	}

	let request: CreateRoomRequest = serde_json::from_slice(&body).map_err(ApiError::from)?;

	let id = rooms.create_identifier();
	let video_id = extract_video_id(&request.video_url);

	let response = CreateRoomResponse { pathname: room_pathname(&id, video_id) };
	let json = serde_json::to_string(&response)
		.map_err(|e| ApiError::Internal(format!("failed to encode room {id}: {e}")))?;

	log::info!("Created link for room {id} with video {video_id:?}");
	Ok(warp::reply::with_header(json, "content-type", "application/json"))
}

async fn join_room(id: String, query: JoinQuery, rooms: RoomsRegistry) -> Result<impl Reply, Rejection> {
	let room_id = RoomId::parse(&id).map_err(ApiError::from)?;

	rooms.ensure_room(room_id);
	if rooms.room_is_full(&room_id) {
		return Err(ApiError::RoomFull(room_id).into());
	}

	// The display id comes from the link as is, it is not recomputed
	let video_id = query.videoid.unwrap_or_default();
	Ok(warp::reply::html(join_page::render(&video_id)))
}

async fn upgrade_connection(id: String, ws: Ws, rooms: RoomsRegistry) -> Result<impl Reply, Rejection> {
	let room_id = RoomId::parse(&id).map_err(ApiError::from)?;

	if !rooms.contains(&room_id) {
		return Err(ApiError::RoomNotFound(room_id).into());
	}

	Ok(ws.on_upgrade(move |websocket| handle_websocket(websocket, room_id, rooms)))
}
