use std::convert::Infallible;

use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::rooms_registry::RegistryError;
use crate::uuids::{InvalidRoomId, RoomId};

/// Errors surfaced by the http routes.
/// Clients only ever see the status line, the detail stays in the server log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	// Validation
	#[error("unsupported content type {0:?}, expected application/json")]
	UnsupportedMediaType(Option<String>),
	#[error("invalid room id: {0}")]
	InvalidRoomId(#[from] InvalidRoomId),
	#[error("malformed request body: {0}")]
	MalformedBody(#[from] serde_json::Error),

	// Not found
	#[error("room {0} does not exist")]
	RoomNotFound(RoomId),

	// Conflict
	#[error("room {0} is full")]
	RoomFull(RoomId),

	#[error("internal error: {0}")]
	Internal(String),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
			ApiError::InvalidRoomId(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
			ApiError::RoomNotFound(_) => StatusCode::NOT_FOUND,
			ApiError::RoomFull(_) => StatusCode::CONFLICT,
			ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<RegistryError> for ApiError {
	fn from(value: RegistryError) -> Self {
		match value {
			RegistryError::RoomNotFound(id) => ApiError::RoomNotFound(id),
			RegistryError::RoomFull(id) => ApiError::RoomFull(id),
		}
	}
}

impl warp::reject::Reject for ApiError {}

/// Turns any rejection into a plain text response holding the status' reason phrase
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
	let status = if let Some(e) = err.find::<ApiError>() {
		match e {
			ApiError::Internal(_) => log::error!("{e}"),
			_ => log::warn!("{e}")
		}
		e.status()
	} else if err.is_not_found() {
		StatusCode::NOT_FOUND
	} else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
		StatusCode::METHOD_NOT_ALLOWED
	} else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
		StatusCode::PAYLOAD_TOO_LARGE
	} else if err.find::<warp::reject::LengthRequired>().is_some() {
		StatusCode::LENGTH_REQUIRED
	} else if err.find::<warp::reject::InvalidQuery>().is_some()
		|| err.find::<warp::reject::MissingHeader>().is_some()
		|| err.find::<warp::reject::InvalidHeader>().is_some() {
		log::warn!("Bad request: {err:?}");
		StatusCode::BAD_REQUEST
	} else {
		log::error!("Unhandled rejection: {err:?}");
		StatusCode::INTERNAL_SERVER_ERROR
	};

	let reason = status.canonical_reason().unwrap_or("Error");
	Ok(warp::reply::with_status(reason.to_string(), status))
}

#[cfg(test)]
mod tests {
	use super::*;
	use warp::hyper::body::to_bytes;

	async fn respond(err: Rejection) -> (StatusCode, String) {
		let response = handle_rejection(err).await.unwrap().into_response();
		let status = response.status();
		let body = to_bytes(response.into_body()).await.unwrap();
		(status, String::from_utf8(body.to_vec()).unwrap())
	}

	#[tokio::test]
	async fn api_errors_map_to_generic_responses() {
		let id = RoomId::new();

		let (status, body) = respond(ApiError::RoomFull(id).into()).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body, "Conflict");

		let (status, body) = respond(ApiError::Internal("template exploded".into()).into()).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, "Internal Server Error");

		let (status, _) = respond(ApiError::RoomNotFound(id).into()).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, _) = respond(ApiError::UnsupportedMediaType(None).into()).await;
		assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
	}

	#[tokio::test]
	async fn detail_is_never_echoed() {
		let err = ApiError::from(RoomId::parse("<script>").unwrap_err());
		let (status, body) = respond(err.into()).await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(!body.contains("script"));
	}

	#[tokio::test]
	async fn warp_not_found() {
		let (status, _) = respond(warp::reject::not_found()).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn question_mark_turns_api_errors_into_rejections() {
		fn seat(full: bool, id: RoomId) -> Result<(), Rejection> {
			if full {
				Err(ApiError::RoomFull(id))?;
			}
			Ok(())
		}

		let id = RoomId::new();
		assert!(seat(false, id).is_ok());

		let rejection = seat(true, id).unwrap_err();
		assert!(matches!(rejection.find::<ApiError>(), Some(ApiError::RoomFull(_))));
		assert_eq!(respond(rejection).await.0, StatusCode::CONFLICT);
	}

	#[test]
	fn registry_errors_convert() {
		let id = RoomId::new();
		assert_eq!(ApiError::from(RegistryError::RoomFull(id)).status(), StatusCode::CONFLICT);
		assert_eq!(ApiError::from(RegistryError::RoomNotFound(id)).status(), StatusCode::NOT_FOUND);
	}
}
