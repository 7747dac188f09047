use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::room::{Room, Slot};
use crate::uuids::RoomId;
use crate::websocket::PeerHandle;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	#[error("room {0} does not exist")]
	RoomNotFound(RoomId),
	#[error("room {0} is full")]
	RoomFull(RoomId),
}

/// Process wide table of rooms.
///
/// The map lock only covers insertion, lookup and removal. Slots are guarded by each room's own lock,
/// so participants of different rooms don't contend. The map lock is never taken while a room lock is held.
#[derive(Debug, Default, Clone)]
pub struct RoomsRegistry {
	rooms: Arc<RwLock<HashMap<RoomId, Room>>>
}
impl RoomsRegistry {
	pub fn new() -> Self {
		RoomsRegistry { rooms: Arc::new(RwLock::new(HashMap::new())) }
	}

	/// A fresh id for a room that doesn't exist yet
	pub fn create_identifier(&self) -> RoomId {
		RoomId::new()
	}

	/// Returns the room for `room_id`, creating it with both slots empty if needed
	pub fn ensure_room(&self, room_id: RoomId) -> Room {
		self.rooms
			.write()
			.entry(room_id)
			.or_insert_with(|| {
				log::info!("Room {room_id} opened");
				Room::new(room_id)
			})
			.clone()
	}

	pub fn get(&self, room_id: &RoomId) -> Option<Room> {
		self.rooms.read().get(room_id).cloned()
	}

	pub fn contains(&self, room_id: &RoomId) -> bool {
		self.rooms.read().contains_key(room_id)
	}

	pub fn room_is_full(&self, room_id: &RoomId) -> bool {
		self.get(room_id).is_some_and(|room| room.is_full())
	}

	pub fn len(&self) -> usize {
		self.rooms.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.rooms.read().is_empty()
	}

	/// Seats `peer` in the first free slot of the room, slot A first.
	/// A full room is refused, existing occupants are never replaced.
	pub fn assign_slot(&self, room_id: &RoomId, peer: PeerHandle) -> Result<Slot, RegistryError> {
		let room = self.get(room_id).ok_or(RegistryError::RoomNotFound(*room_id))?;

		// The room may have been emptied and removed since the lookup, assign() checks for that
		room.assign(peer)
	}

	/// Frees `slot` and drops the room once nobody is left in it
	pub fn release_slot(&self, room_id: &RoomId, slot: Slot) {
		let mut rooms = self.rooms.write();

		let Some(room) = rooms.get(room_id) else {
			return;
		};

		if room.release(slot) {
			rooms.remove(room_id);
			log::info!("Room {room_id} closed");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::websocket::channel_peer;

	#[test]
	fn ensure_room_is_idempotent() {
		let registry = RoomsRegistry::new();
		let id = registry.create_identifier();

		let first = registry.ensure_room(id);
		let second = registry.ensure_room(id);

		assert!(first.same_room(&second));
		assert_eq!(registry.len(), 1);
		assert!(second.is_empty());
	}

	#[test]
	fn concurrent_ensure_room_creates_one_room() {
		let registry = RoomsRegistry::new();
		let id = registry.create_identifier();

		let rooms: Vec<Room> = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..32)
				.map(|_| scope.spawn(|| registry.ensure_room(id)))
				.collect();

			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});

		assert_eq!(registry.len(), 1);
		assert!(rooms.iter().all(|room| room.same_room(&rooms[0])));
		assert_eq!(registry.get(&id).unwrap().occupancy(), 0);
	}

	#[test]
	fn assign_requires_an_existing_room() {
		let registry = RoomsRegistry::new();
		let id = registry.create_identifier();
		let (peer, _rx) = channel_peer();

		assert_eq!(registry.assign_slot(&id, peer), Err(RegistryError::RoomNotFound(id)));
		assert!(registry.is_empty());
	}

	#[test]
	fn third_assignment_is_refused() {
		let registry = RoomsRegistry::new();
		let id = registry.create_identifier();
		registry.ensure_room(id);

		let (a, _rx_a) = channel_peer();
		let (b, _rx_b) = channel_peer();
		let (c, _rx_c) = channel_peer();

		assert_eq!(registry.assign_slot(&id, a.clone()), Ok(Slot::A));
		assert!(!registry.room_is_full(&id));
		assert_eq!(registry.assign_slot(&id, b.clone()), Ok(Slot::B));
		assert!(registry.room_is_full(&id));
		assert_eq!(registry.assign_slot(&id, c), Err(RegistryError::RoomFull(id)));

		let room = registry.get(&id).unwrap();
		assert!(room.occupant(Slot::A).unwrap().same_connection(&a));
		assert!(room.occupant(Slot::B).unwrap().same_connection(&b));
	}

	#[test]
	fn room_removed_when_last_slot_released() {
		let registry = RoomsRegistry::new();
		let id = registry.create_identifier();
		registry.ensure_room(id);

		let (a, _rx_a) = channel_peer();
		let (b, _rx_b) = channel_peer();
		registry.assign_slot(&id, a).unwrap();
		registry.assign_slot(&id, b).unwrap();

		registry.release_slot(&id, Slot::A);
		let room = registry.get(&id).expect("room should survive with one occupant");
		assert_eq!(room.occupancy(), 1);
		assert!(room.occupant(Slot::B).is_some());

		registry.release_slot(&id, Slot::B);
		assert!(!registry.contains(&id));

		// no-op once the room is gone
		registry.release_slot(&id, Slot::B);
		assert!(registry.is_empty());
	}

	#[test]
	fn stale_room_handle_cannot_be_reused_after_removal() {
		let registry = RoomsRegistry::new();
		let id = registry.create_identifier();
		let stale = registry.ensure_room(id);

		let (a, _rx_a) = channel_peer();
		registry.assign_slot(&id, a).unwrap();
		registry.release_slot(&id, Slot::A);

		let (late, _rx_late) = channel_peer();
		assert_eq!(stale.assign(late), Err(RegistryError::RoomNotFound(id)));

		// A new join for the same id starts over with a fresh room
		let fresh = registry.ensure_room(id);
		assert!(!fresh.same_room(&stale));
		let (again, _rx_again) = channel_peer();
		assert_eq!(registry.assign_slot(&id, again), Ok(Slot::A));
	}

	#[test]
	fn distinct_rooms_are_independent() {
		let registry = RoomsRegistry::new();
		let first = registry.create_identifier();
		let second = registry.create_identifier();
		registry.ensure_room(first);
		registry.ensure_room(second);

		let (a, _rx_a) = channel_peer();
		registry.assign_slot(&first, a).unwrap();
		registry.release_slot(&first, Slot::A);

		assert!(!registry.contains(&first));
		assert!(registry.contains(&second));
	}
}
