use crate::output::Output;
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use review_intake_models::{Priority, Review};
use serde_json::Value;
use super::intake::refused;
use super::{review_json, AppContext};

const PREVIEW_CHARS: usize = 60;

pub async fn run_reviews(limit: usize, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let reviews = ctx
        .pipeline
        .recent_reviews(limit)
        .await
        .map_err(|e| refused(e, output))?;

    if output.is_json() {
        output.result(&Value::Array(reviews.iter().map(review_json).collect()), || {});
        return Ok(());
    }
    if reviews.is_empty() {
        output.info("No reviews yet");
        return Ok(());
    }
    output.table(&review_table(&reviews));
    Ok(())
}

fn review_table(reviews: &[Review]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Created", "Stars", "Sentiment", "Priority", "Status", "Tags", "Customer", "Feedback"]);

    for review in reviews {
        let priority = Cell::new(review.priority).fg(match review.priority {
            Priority::Urgent => Color::Red,
            Priority::High => Color::Yellow,
            Priority::Normal => Color::Reset,
            Priority::Low => Color::Green,
        });
        table.add_row(vec![
            Cell::new(review.id),
            Cell::new(review.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(review.rating),
            Cell::new(review.sentiment),
            priority,
            Cell::new(review.status),
            Cell::new(review.tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")),
            Cell::new(review.customer_name.as_deref().unwrap_or("-")),
            Cell::new(preview(&review.text)),
        ]);
    }
    table
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS - 1).collect();
    format!("{}…", cut)
}
