pub mod chat;
pub mod events;
pub mod n8n;
pub mod session;
pub mod validate;
