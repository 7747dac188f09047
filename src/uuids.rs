use uuid::{Uuid, Version};
use serde::{Deserialize, Serialize};

// Simple uuid representing a room's id
#[derive(Debug, PartialEq, Eq, Hash, Clone, Deserialize, Serialize, Copy)]
pub struct RoomId(Uuid);
impl RoomId {
	pub fn new() -> Self {
		RoomId(Uuid::new_v4())
	}

	/// Parses a room id out of a request path segment.
	/// Only random (v4) uuids are valid room ids.
	pub fn parse(value: &str) -> Result<Self, InvalidRoomId> {
		let uuid = Uuid::parse_str(value).map_err(|_| InvalidRoomId(value.to_owned()))?;

		match uuid.get_version() {
			Some(Version::Random) => Ok(RoomId(uuid)),
			_ => Err(InvalidRoomId(value.to_owned()))
		}
	}
}
impl Default for RoomId {
	fn default() -> Self {
		Self::new()
	}
}
impl std::fmt::Display for RoomId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&self.0, f)
	}
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{0:?} is not a valid v4 uuid")]
pub struct InvalidRoomId(pub String);

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Copy)]
pub struct ParticipantId(Uuid);
impl ParticipantId {
	pub fn new() -> Self {
		ParticipantId(Uuid::new_v4())
	}
}
impl Default for ParticipantId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for ParticipantId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&self.0, f)
	}
}
