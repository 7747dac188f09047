use std::fmt::Display;

use futures_util::{Stream, StreamExt};
use warp::filters::ws::{Message, WebSocket};

use crate::room::{Room, Slot};
use crate::rooms_registry::{RegistryError, RoomsRegistry};
use crate::uuids::{ParticipantId, RoomId};
use crate::websocket::{self, PeerHandle, WsMessageKind, GOING_AWAY, TRY_AGAIN_LATER};

/// Entry point for a freshly upgraded websocket.
/// Seats it in the room and relays its frames until it goes away.
pub async fn handle_websocket(websocket: WebSocket, room_id: RoomId, rooms: RoomsRegistry) {
	let (ws_tx, ws_rx) = websocket.split();
	let peer = PeerHandle::new(ParticipantId::new(), ws_tx);

	match ParticipantConnection::new(rooms, room_id, peer.clone()) {
		Ok(conn) => conn.run(ws_rx).await,
		Err(e) => {
			log::warn!("Refusing participant {} in room {room_id}: {e}", peer.id());

			if let Err(e) = peer.close(TRY_AGAIN_LATER).await {
				log::debug!("Failed to close refused connection {}: {e}", peer.id());
			}
		}
	}
}

/// A participant holding one slot of a room.
/// The slot is held for as long as this value lives, dropping it frees the slot.
pub struct ParticipantConnection {
	peer: PeerHandle,
	room: Room,
	slot: Slot,
	rooms: RoomsRegistry,
}

impl ParticipantConnection {
	pub fn new(rooms: RoomsRegistry, room_id: RoomId, peer: PeerHandle) -> Result<Self, RegistryError> {
		let slot = rooms.assign_slot(&room_id, peer.clone())?;

		// An occupied room is never removed, so the lookup only fails if the slot is already gone
		let Some(room) = rooms.get(&room_id) else {
			return Err(RegistryError::RoomNotFound(room_id));
		};

		log::info!("New participant {} in room {room_id}, {slot}", peer.id());

		Ok(ParticipantConnection {
			peer,
			room,
			slot,
			rooms,
		})
	}

	pub fn id(&self) -> ParticipantId { self.peer.id() }
	pub fn slot(&self) -> Slot { self.slot }

	/// Relays every frame read from `ws_rx` to the other participant, then closes this connection.
	/// Returns once the client is gone or a read fails. A failed forward only loses that frame:
	/// the broken peer's own relay frees its slot, this participant stays seated.
	pub async fn run<S, E>(self, mut ws_rx: S)
	where
		S: Stream<Item = Result<Message, E>> + Unpin,
		E: Display,
	{
		while let Some(msg) = ws_rx.next().await {
			let msg = match msg {
				Ok(msg) => msg,
				Err(e) => {
					log::warn!("websocket error for participant {}: {e}. Closing connection", self.id());
					break;
				}
			};

			let forwarded = match WsMessageKind::from(msg) {
				WsMessageKind::Text(text) => self.forward(Message::text(text)).await,
				WsMessageKind::Binary(bin) => self.forward(Message::binary(bin)).await,
				// Answered by the transport itself
				WsMessageKind::Ping(_) | WsMessageKind::Pong(_) => Ok(()),
				WsMessageKind::Close(frame) => {
					log::debug!("Participant {} sent close frame {:?}", self.id(), frame);
					break;
				},
				WsMessageKind::Unexpected(bytes) => {
					log::warn!("Unexpected websocket frame from participant {}: {} bytes", self.id(), bytes.len());
					Ok(())
				}
			};

			if let Err(e) = forwarded {
				log::warn!("Failed to forward message from participant {}, dropping it: {e}", self.id());
			}
		}

		if let Err(e) = self.peer.close(GOING_AWAY).await {
			log::debug!("Failed to close connection of participant {}: {e}", self.id());
		}
	}

	/// Sends `msg` to whoever occupies the other slot. Dropped when nobody is there.
	async fn forward(&self, msg: Message) -> Result<(), websocket::Error> {
		match self.room.peer_of(self.slot) {
			Some(peer) => peer.send(msg).await,
			None => {
				log::trace!("No peer in room {} for participant {}, dropping message", self.room.id(), self.id());
				Ok(())
			}
		}
	}
}

impl Drop for ParticipantConnection {
	fn drop(&mut self) {
		log::info!("Participant {} is leaving room {}", self.id(), self.room.id());
		self.rooms.release_slot(&self.room.id(), self.slot);
	}
}
