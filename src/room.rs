use parking_lot::Mutex;
use std::sync::Arc;

use crate::rooms_registry::RegistryError;
use crate::uuids::RoomId;
use crate::websocket::PeerHandle;

/// One of the two positions a participant can take in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
	A,
	B
}
impl Slot {
	/// Scan order used when assigning a free slot
	pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

	pub fn other(self) -> Slot {
		match self {
			Slot::A => Slot::B,
			Slot::B => Slot::A
		}
	}

	fn index(self) -> usize {
		match self {
			Slot::A => 0,
			Slot::B => 1
		}
	}
}
impl std::fmt::Display for Slot {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Slot::A => f.write_str("slot A"),
			Slot::B => f.write_str("slot B")
		}
	}
}

#[derive(Debug, Default)]
pub(crate) struct Slots {
	occupants: [Option<PeerHandle>; 2],
	/// Set once the room has been removed from the registry
	closed: bool,
}
impl Slots {
	fn is_empty(&self) -> bool {
		self.occupants.iter().all(Option::is_none)
	}
}

// Room internal
#[derive(Debug)]
struct Inner {
	id: RoomId,
	slots: Mutex<Slots>,
}
impl Drop for Inner {
	fn drop(&mut self) {
		log::debug!("Room {} dropped", self.id);
	}
}

/// A Room pairs at most two participants.
/// A room is cheap to clone and can be passed to different threads safely as it's data is heap allocated
#[derive(Debug, Clone)]
pub struct Room {
	inner: Arc<Inner>
}
impl Room {
	pub fn new(id: RoomId) -> Self {
		Room {
			inner: Arc::new(Inner {
				id,
				slots: Mutex::new(Slots::default()),
			})
		}
	}

	pub fn id(&self) -> RoomId { self.inner.id }

	pub fn is_full(&self) -> bool {
		self.inner.slots.lock().occupants.iter().all(Option::is_some)
	}

	pub fn is_empty(&self) -> bool {
		self.inner.slots.lock().is_empty()
	}

	/// Number of occupied slots
	pub fn occupancy(&self) -> usize {
		self.inner.slots.lock().occupants.iter().filter(|o| o.is_some()).count()
	}

	pub fn occupant(&self, slot: Slot) -> Option<PeerHandle> {
		self.inner.slots.lock().occupants[slot.index()].clone()
	}

	/// The participant sitting across from `slot`, if any
	pub fn peer_of(&self, slot: Slot) -> Option<PeerHandle> {
		self.occupant(slot.other())
	}

	/// Places `peer` in the first free slot. Never displaces an occupant.
	pub(crate) fn assign(&self, peer: PeerHandle) -> Result<Slot, RegistryError> {
		let mut slots = self.inner.slots.lock();

		if slots.closed {
			return Err(RegistryError::RoomNotFound(self.id()));
		}

		let slot = Slot::ALL
			.into_iter()
			.find(|slot| slots.occupants[slot.index()].is_none())
			.ok_or(RegistryError::RoomFull(self.id()))?;

		slots.occupants[slot.index()] = Some(peer);
		Ok(slot)
	}

	/// Empties `slot` and returns true if the room has no occupant left.
	/// An emptied room is marked closed so late assignments are refused.
	pub(crate) fn release(&self, slot: Slot) -> bool {
		let mut slots = self.inner.slots.lock();
		slots.occupants[slot.index()] = None;

		if slots.is_empty() {
			slots.closed = true;
		}

		slots.closed
	}

	pub fn same_room(&self, other: &Room) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}
