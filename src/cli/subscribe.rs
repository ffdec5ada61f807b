use super::exit::ALREADY_SUBSCRIBED;
use super::ui;
use crate::App;
use crate::core::{Registration, SubscriberEmail};
use anyhow::Result;
use std::process::ExitCode;

pub async fn run(app: &App, input: &str) -> Result<ExitCode> {
    let email = SubscriberEmail::parse(input)?;
    match app.registry.register(&email).await? {
        Registration::Added => {
            println!("Email {email} added");
            Ok(ExitCode::SUCCESS)
        }
        Registration::AlreadyPresent => {
            println!(
                "{}",
                ui::style_text(
                    &format!("{email} is already subscribed. No actions performed"),
                    ui::StyleType::Error
                )
            );
            Ok(ExitCode::from(ALREADY_SUBSCRIBED))
        }
    }
}
