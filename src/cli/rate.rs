use super::ui;
use crate::App;
use crate::core::RateQuote;
use anyhow::Result;
use comfy_table::Cell;
use std::process::ExitCode;

impl RateQuote {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Leg"),
            ui::header_cell("Pair"),
            ui::header_cell("Rate"),
        ]);
        table.add_row(vec![
            Cell::new("Price"),
            Cell::new(format!("{}/{}", self.base_asset, self.reference_currency)),
            ui::number_cell(self.source_rate),
        ]);
        table.add_row(vec![
            Cell::new("Conversion"),
            Cell::new(format!("{}/{}", self.reference_currency, self.quote_currency)),
            ui::number_cell(self.conversion_rate),
        ]);

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\n{}: {}\n{}",
            ui::style_text(
                &format!("{}/{}", self.base_asset, self.quote_currency),
                ui::StyleType::TotalLabel
            ),
            ui::style_text(&format!("{:.2}", self.rate), ui::StyleType::TotalValue),
            ui::style_text(
                &format!("fetched at {}", self.fetched_at.to_rfc3339()),
                ui::StyleType::Subtle
            ),
        ));
        output
    }
}

/// Prints the current rate, using the configured pair unless overridden.
pub async fn run(app: &App, base: Option<&str>, quote: Option<&str>) -> Result<ExitCode> {
    let base = base.unwrap_or(&app.config.rate.base_asset);
    let quote = quote.unwrap_or(&app.config.rate.quote_currency);

    let pb = ui::new_spinner("Fetching rate...");
    let result = app.aggregator.compute_rate(base, quote).await;
    pb.finish_and_clear();

    let quote = result?;
    println!("{}", quote.display_as_table());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_table_shows_both_legs_and_rate() {
        let quote = RateQuote::new("BTC", "USD", "UAH", 50_000.0, 37.0);
        let output = console::strip_ansi_codes(&quote.display_as_table()).to_string();
        assert!(output.contains("BTC/USD"));
        assert!(output.contains("USD/UAH"));
        assert!(output.contains("50000.00"));
        assert!(output.contains("37.00"));
        assert!(output.contains("BTC/UAH: 1850000.00"));
    }
}
