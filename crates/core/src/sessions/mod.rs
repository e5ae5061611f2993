//! Sessions module - authenticated browser sessions backed by opaque tokens.

mod memory_store;
mod redis_store;
mod sessions_model;
mod sessions_service;
mod sessions_traits;

pub use memory_store::InMemorySessionStore;
pub use redis_store::RedisSessionStore;
pub use sessions_model::Session;
pub use sessions_service::SessionService;
pub use sessions_traits::{SessionServiceTrait, SessionStoreTrait};
