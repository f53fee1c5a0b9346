//! Session storage: in-memory fallback and optional Redis durability behind
//! one backend trait, fronted by a facade that degrades backend failures to
//! safe defaults.

mod error;
pub use error::StoreError;

mod backend;
pub use backend::SessionBackend;

mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use redis::RedisStore;

mod store;
pub use store::{DEFAULT_SESSION_TTL, SessionStore};
