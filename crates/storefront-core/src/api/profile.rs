//! Request and response bodies for the account endpoints, and profile
//! normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::UserProfile;

#[derive(Debug, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful `/token` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Profile as handed to the front end. Unknown fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub email: String,
    pub dob: String,
    pub gender: String,
}

/// Reconcile a `/profile` response with what the client already knows.
///
/// The server's `dob` and `gender` win only when both are present as
/// non-empty strings; otherwise both come from `fallback` (the values just
/// sent, or the session cache). `email` always comes from the session, never
/// from the response.
pub fn normalize_profile_response(
    raw: Option<&Value>,
    email: Option<String>,
    fallback: &UserProfile,
) -> ProfileResult {
    let server = raw.and_then(|value| {
        let dob = value.get("dob")?.as_str()?;
        let gender = value.get("gender")?.as_str()?;
        if dob.is_empty() || gender.is_empty() {
            None
        } else {
            Some((dob, gender))
        }
    });

    let (dob, gender) = match server {
        Some((dob, gender)) => (dob.to_string(), gender.to_string()),
        None => (fallback.dob.clone(), fallback.gender.clone()),
    };

    ProfileResult {
        email: email.unwrap_or_default(),
        dob,
        gender,
    }
}
