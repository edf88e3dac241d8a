//! REST client module for the storefront account backend.
//!
//! This module provides the `AccountClient` for the four account calls
//! (signup, login, profile write, profile read), the `ApiError` taxonomy and
//! the response normalization shared by both profile calls.
//!
//! Protected calls use the bearer token stored by `login`.

pub mod client;
pub mod error;
pub mod profile;

pub use client::AccountClient;
pub use error::{ApiError, ApiErrorKind};
pub use profile::{normalize_profile_response, ProfileResult, TokenResponse};
