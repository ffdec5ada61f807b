use super::ui;
use crate::App;
use anyhow::Result;
use std::process::ExitCode;

/// Dispatches the configured rate and waits for the background submissions,
/// so the process does not exit while mail is still in flight.
pub async fn run(app: &App) -> Result<ExitCode> {
    let rate = &app.config.rate;

    let pb = ui::new_spinner("Fetching rate...");
    let result = app
        .dispatcher
        .dispatch(&rate.base_asset, &rate.quote_currency)
        .await;
    pb.finish_and_clear();

    let handle = result?;
    println!(
        "Emails accepted for {} recipients ({})",
        handle.accepted, handle.quote
    );

    let pb = ui::new_spinner("Sending emails...");
    let report = handle.wait().await;
    pb.finish_and_clear();

    let report = report?;
    println!(
        "{}",
        ui::style_text(
            &format!("Submitted {} emails", report.submitted),
            ui::StyleType::TotalValue
        )
    );
    if report.failed > 0 {
        println!(
            "{}",
            ui::style_text(
                &format!("{} emails could not be submitted", report.failed),
                ui::StyleType::Error
            )
        );
    }
    Ok(ExitCode::SUCCESS)
}
