use super::ui;
use crate::App;
use crate::core::SubscriberEmail;
use anyhow::Result;
use comfy_table::Cell;
use std::process::ExitCode;

pub fn subscribers_table(subscribers: &[SubscriberEmail]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("#"), ui::header_cell("Email")]);
    for (i, email) in subscribers.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(email)]);
    }
    table.to_string()
}

pub async fn run(app: &App) -> Result<ExitCode> {
    let subscribers = app.registry.list_all().await;
    if subscribers.is_empty() {
        println!("{}", ui::style_text("No subscribers yet", ui::StyleType::Subtle));
    } else {
        println!("{}", subscribers_table(&subscribers));
    }
    Ok(ExitCode::SUCCESS)
}
