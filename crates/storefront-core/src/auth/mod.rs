//! Client-side session state.
//!
//! This module provides:
//! - `SessionStore`: the token and cached profile fields shared by the API
//!   client and the front end
//! - `MemorySessionStore`: process-local store, mostly for tests
//! - `PersistentSessionStore`: write-through store over a `SessionBackend`
//!   (`FileBackend` or the OS keychain via `KeyringBackend`)
//!
//! Sessions have no expiry of their own; a token stays until logout.

pub mod credentials;
pub mod persistent;
pub mod session;

pub use credentials::KeyringBackend;
pub use persistent::{FileBackend, PersistentSessionStore, SessionBackend};
pub use session::{MemorySessionStore, SessionStore, UserProfile, SESSION_KEYS};
