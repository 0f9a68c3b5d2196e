// Console output for profiles and activity lists.
// Plain line builders plus styled printers for the terminal.

pub mod format;

use chrono::{DateTime, Utc};
use crossterm::style::Stylize;

use crate::github::{EventRecord, UserProfile};

pub use format::{describe, event_age, time_ago};

/// Lines describing a user profile, with "N/A" for absent fields.
pub fn profile_lines(user: &UserProfile) -> Vec<String> {
    let or_na = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or("N/A")
            .to_string()
    };

    vec![
        format!("- Name: {}", or_na(&user.name)),
        format!("- Bio: {}", or_na(&user.bio)),
        format!("- Public Repos: {}", user.public_repos),
        format!("- Followers: {}", user.followers),
        format!("- Following: {}", user.following),
    ]
}

/// One line per event: description, repository, and age.
pub fn activity_lines(events: &[EventRecord], now: DateTime<Utc>) -> Vec<String> {
    events
        .iter()
        .map(|event| {
            format!(
                "- {} in {} ({})",
                describe(event),
                event.repository_name(),
                event_age(event, now)
            )
        })
        .collect()
}

pub fn print_profile(user: &UserProfile) {
    println!("{}", "\n👤 User Details:".blue());
    for line in profile_lines(user) {
        println!("{}", line);
    }
}

pub fn print_activities(identity: &str, events: &[EventRecord]) {
    if events.is_empty() {
        println!(
            "{}",
            format!("No public activity found for \"{}\".", identity).yellow()
        );
        return;
    }

    println!("{}", "\nRecent Activity:\n".yellow());
    for line in activity_lines(events, Utc::now()) {
        println!("{}", line);
    }
}

pub fn print_info(message: &str) {
    println!("{}", message.cyan());
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}
