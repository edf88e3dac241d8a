//! Core library for the storefront client.
//!
//! This crate contains everything below the presentation layer:
//!
//! - `auth`: the `SessionStore` holding the bearer token and cached profile
//! - `api`: the `AccountClient` for signup, login and profile calls
//! - `notify`: the user-facing notification seam used by the client
//! - `config`: base URL, session backend and timeout settings
//! - `utils`: display formatting shared by front ends

pub mod api;
pub mod auth;
pub mod config;
pub mod notify;
pub mod utils;

pub use api::{AccountClient, ApiError, ApiErrorKind, ProfileResult, TokenResponse};
pub use auth::{MemorySessionStore, PersistentSessionStore, SessionStore, UserProfile};
pub use config::{Config, SessionBackendKind};
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
