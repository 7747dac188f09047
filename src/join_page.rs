const ROOM_TEMPLATE: &str = include_str!("../templates/room.html");
const VIDEO_ID_PLACEHOLDER: &str = "{{VideoID}}";

/// Renders the page a participant lands on when following a room link
pub fn render(video_id: &str) -> String {
	ROOM_TEMPLATE.replace(VIDEO_ID_PLACEHOLDER, &escape_html(video_id))
}

fn escape_html(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for c in value.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c)
		}
	}

	escaped
}
