//! Turns the video url a participant pastes into the short id carried in a room link

use crate::uuids::RoomId;

/// Returns the last path segment of `source_url`, without its query string.
///
/// Never fails: with no `/` the whole string is the segment, with no `?` the segment runs to the end.
/// If the segment holds several `?`, everything from the first one on is dropped.
pub fn extract_video_id(source_url: &str) -> &str {
	let start = source_url.rfind('/').map_or(0, |i| i + 1);
	let segment = &source_url[start..];

	match segment.find('?') {
		Some(end) => &segment[..end],
		None => segment
	}
}

/// Path of the join page for a freshly created room
pub fn room_pathname(id: &RoomId, video_id: &str) -> String {
	format!("/rooms/{id}?videoid={}", urlencoding::encode(video_id))
}
