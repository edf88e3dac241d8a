//! Command handlers. Each one plays the part of a page: it checks the
//! session, calls the account client and prints the outcome.
//!
//! Failure messages from the client arrive through `ConsoleNotifier`, so the
//! handlers only add follow-up hints and pick the exit code.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;

use storefront_core::utils::{capitalize_first, format_dob};
use storefront_core::{
    AccountClient, ApiError, ApiErrorKind, Notification, NotificationLevel, Notifier,
    ProfileResult, SessionStore,
};

/// Prints notifications to stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => eprintln!("error: {}", notification),
            NotificationLevel::Success => eprintln!("{}", notification),
        }
    }
}

fn read_password(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

/// Stop early when there is no session to use
fn require_session(client: &AccountClient, action: &str) -> bool {
    if client.session().is_authenticated() {
        return true;
    }
    ConsoleNotifier.notify(Notification::error(format!(
        "Authentication required: please log in to {}.",
        action
    )));
    eprintln!("Run `storefront login --email <email>` first.");
    false
}

/// Follow-up for a failed profile call
fn handle_profile_error(client: &AccountClient, err: &ApiError, retry: &str) {
    match err.kind() {
        ApiErrorKind::Authentication => {
            debug!("Session rejected, clearing stored token");
            client.session().remove_token();
            eprintln!("Your session has ended. Run `storefront login --email <email>` to sign in again.");
        }
        ApiErrorKind::ProfileFetch | ApiErrorKind::Transport => {
            eprintln!("Run `{}` to try again.", retry);
        }
        _ => {}
    }
}

pub async fn signup(client: &AccountClient, email: &str, password: Option<String>) -> Result<ExitCode> {
    let password = read_password(password)?;
    match client.create_account(email, &password).await {
        Ok(()) => {
            ConsoleNotifier.notify(Notification::success("Account created!"));
            println!("Log in with `storefront login --email {}`.", email);
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

pub async fn login(client: &AccountClient, email: &str, password: Option<String>) -> Result<ExitCode> {
    let password = read_password(password)?;
    match client.login(email, &password).await {
        Ok(_) => {
            ConsoleNotifier.notify(Notification::success(format!("Logged in as {}", email)));
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

pub fn logout(client: &AccountClient) -> ExitCode {
    client.session().remove_token();
    ConsoleNotifier.notify(Notification::success("Logged out successfully"));
    ExitCode::SUCCESS
}

pub fn status(client: &AccountClient) -> ExitCode {
    let session = client.session();
    if session.is_authenticated() {
        let email = session.user_email().unwrap_or_else(|| "unknown account".to_string());
        println!("Logged in as {} ({})", email, client.base_url());
    } else {
        println!("Not logged in ({})", client.base_url());
    }
    ExitCode::SUCCESS
}

pub async fn show_profile(client: &AccountClient) -> ExitCode {
    if !require_session(client, "view your profile") {
        return ExitCode::FAILURE;
    }
    match client.get_profile().await {
        Ok(profile) => {
            print_profile(&profile);
            ExitCode::SUCCESS
        }
        Err(e) => {
            handle_profile_error(client, &e, "storefront profile show");
            ExitCode::FAILURE
        }
    }
}

pub async fn update_profile(client: &AccountClient, dob: &str, gender: &str) -> ExitCode {
    if !require_session(client, "complete your profile") {
        return ExitCode::FAILURE;
    }
    match client.update_profile(dob, gender).await {
        Ok(profile) => {
            ConsoleNotifier.notify(Notification::success("Profile updated!"));
            print_profile(&profile);
            ExitCode::SUCCESS
        }
        Err(e) => {
            handle_profile_error(client, &e, "storefront profile update");
            ExitCode::FAILURE
        }
    }
}

fn print_profile(profile: &ProfileResult) {
    for line in render_profile(profile) {
        println!("{}", line);
    }
}

/// Placeholder shown for profile fields the account has not filled in
const NOT_PROVIDED: &str = "Not provided";

fn or_not_provided(value: String) -> String {
    if value.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        value
    }
}

fn render_profile(profile: &ProfileResult) -> Vec<String> {
    let email = or_not_provided(profile.email.clone());
    let dob = or_not_provided(format_dob(&profile.dob));
    let gender = or_not_provided(capitalize_first(&profile.gender));
    vec![
        format!("{:<15}{}", "Email:", email),
        format!("{:<15}{}", "Date of birth:", dob),
        format!("{:<15}{}", "Gender:", gender),
    ]
}
