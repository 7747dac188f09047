use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Sink, SinkExt};
use tokio::sync::Mutex;
use warp::filters::ws::Message;

use crate::uuids::ParticipantId;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Write half of a participant's websocket, erased so tests can plug in any sink
pub type MessageSink = Pin<Box<dyn Sink<Message, Error = Error> + Send>>;

/// Status code and reason sent along with a close frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCode(pub u16, pub &'static str);

pub const GOING_AWAY: CloseCode = CloseCode(1001, "Going Away");
pub const TRY_AGAIN_LATER: CloseCode = CloseCode(1013, "Try Again Later");

// Convenience enum for pattern matching a warp Message representing a websocket message
#[derive(Debug, PartialEq)]
pub enum WsMessageKind {
	Ping(Vec<u8>),
	Pong(Vec<u8>),
	Text(String),
	Binary(Vec<u8>),
	Close(Option<(u16, String)>),
	// Consider an error if this is the match case
	Unexpected(Vec<u8>)
}

impl From<Message> for WsMessageKind {
	fn from(value: Message) -> Self {
		if value.is_ping() 			{ WsMessageKind::Ping(value.into_bytes()) }
		else if value.is_pong() 	{ WsMessageKind::Pong(value.into_bytes()) }
		else if value.is_text()		{ WsMessageKind::Text(String::from_utf8_lossy(value.as_bytes()).into()) }
		else if value.is_binary()	{ WsMessageKind::Binary(value.into_bytes()) }
		else if value.is_close()	{ WsMessageKind::Close( value.close_frame().map(|t| (t.0, String::from(t.1))) )}
		// Shouldn't happen
		else { WsMessageKind::Unexpected(value.into_bytes()) }
	}
}

/// The sending side of one participant's connection.
/// Clones share the same sink; a frame is written in full before the next one starts.
#[derive(Clone)]
pub struct PeerHandle {
	id: ParticipantId,
	sink: Arc<Mutex<MessageSink>>
}

impl PeerHandle {
	pub fn new<S>(id: ParticipantId, sink: S) -> Self
	where
		S: Sink<Message> + Send + 'static,
		S::Error: Into<Error>,
	{
		let sink = sink.sink_map_err(|e| -> Error { e.into() });

		PeerHandle {
			id,
			sink: Arc::new(Mutex::new(Box::pin(sink)))
		}
	}

	pub fn id(&self) -> ParticipantId { self.id }

	/// True if both handles write to the same connection
	pub fn same_connection(&self, other: &PeerHandle) -> bool {
		Arc::ptr_eq(&self.sink, &other.sink)
	}

	pub async fn send(&self, msg: Message) -> Result<(), Error> {
		self.sink.lock().await.send(msg).await
	}

	/// Sends a close frame and shuts the write half down
	pub async fn close(&self, code: CloseCode) -> Result<(), Error> {
		let mut sink = self.sink.lock().await;
		sink.send(Message::close_with(code.0, code.1)).await?;
		sink.close().await
	}
}

impl std::fmt::Debug for PeerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PeerHandle")
			.field("id", &self.id)
			.field("sink", &"...")
			.finish()
	}
}

#[cfg(test)]
pub(crate) fn channel_peer() -> (PeerHandle, tokio::sync::mpsc::UnboundedReceiver<Message>) {
	let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

	let sink = futures_util::sink::unfold(tx, |tx, msg: Message| async move {
		tx.send(msg)?;
		Ok::<_, Error>(tx)
	});

	(PeerHandle::new(ParticipantId::new(), sink), rx)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_kinds() {
		assert_eq!(WsMessageKind::from(Message::text("hi")), WsMessageKind::Text("hi".into()));
		assert_eq!(WsMessageKind::from(Message::binary(vec![1, 2])), WsMessageKind::Binary(vec![1, 2]));
		assert_eq!(WsMessageKind::from(Message::ping(vec![9])), WsMessageKind::Ping(vec![9]));
		assert_eq!(
			WsMessageKind::from(Message::close_with(1001u16, "Going Away")),
			WsMessageKind::Close(Some((1001, "Going Away".into())))
		);
	}

	#[tokio::test]
	async fn send_then_close_preserves_order() {
		let (peer, mut rx) = channel_peer();

		peer.send(Message::text("one")).await.unwrap();
		peer.send(Message::binary(vec![2])).await.unwrap();
		peer.close(GOING_AWAY).await.unwrap();

		assert_eq!(rx.recv().await.unwrap(), Message::text("one"));
		assert_eq!(rx.recv().await.unwrap(), Message::binary(vec![2]));

		let close = rx.recv().await.unwrap();
		assert_eq!(close.close_frame(), Some((1001, "Going Away")));
	}

	#[tokio::test]
	async fn send_fails_once_the_other_end_is_gone() {
		let (peer, rx) = channel_peer();
		drop(rx);

		assert!(peer.send(Message::text("lost")).await.is_err());
	}

	#[test]
	fn clones_share_the_connection() {
		let (a, _rx_a) = channel_peer();
		let (b, _rx_b) = channel_peer();

		assert!(a.same_connection(&a.clone()));
		assert!(!a.same_connection(&b));
	}
}
