//! Pairs two viewers in a room and relays their player commands over websockets

pub mod error;
pub mod join_page;
pub mod naming;
pub mod participant;
pub mod room;
pub mod rooms_registry;
pub mod security;
pub mod sync_server;
pub mod uuids;
pub mod websocket;
