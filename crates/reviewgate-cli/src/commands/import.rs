use crate::output::Output;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use review_intake_core::import_reviews;
use serde_json::Value;
use std::path::Path;
use super::AppContext;

pub async fn run_import(file: &Path, replace: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let records: Vec<Value> = serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not a JSON array of reviews", file.display()))?;

    let progress = if output.is_json() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} reviews")
                .map_err(|e| eyre!("Invalid progress template: {}", e))?
                .progress_chars("=> "),
        );
        pb
    };

    let business_id = ctx.config.business.id;
    let stats = import_reviews(ctx.pipeline.store().as_ref(), business_id, &records, replace, |n| {
        progress.set_position(n as u64)
    })
    .await
    .wrap_err("Import aborted")?;
    progress.finish_and_clear();

    let data = serde_json::to_value(&stats)?;
    output.result(&data, || {
        if replace {
            println!("Deleted existing reviews: {}", stats.deleted);
        }
        println!("Imported:                  {}", stats.imported);
        println!("Skipped (already present): {}", stats.skipped);
        println!("With contact info:         {}", stats.with_contact);
        println!("With improvement feedback: {}", stats.with_improvement);
        println!("Errors:                    {}", stats.errors);
        println!("Total records:             {}", stats.total);
    });
    Ok(())
}
