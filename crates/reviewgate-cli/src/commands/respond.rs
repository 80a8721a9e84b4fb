use crate::output::Output;
use color_eyre::Result;
use super::intake::refused;
use super::{response_json, AppContext};

pub async fn run_respond(review_id: u64, responder_id: u64, text: &str, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let response = ctx
        .pipeline
        .respond_to_review(review_id, responder_id, text)
        .await
        .map_err(|e| refused(e, output))?;

    output.result(&response_json(&response), || {
        println!("Response recorded for review #{}", response.review_id);
    });
    Ok(())
}

pub async fn run_mark_read(review_id: u64, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let changed = ctx
        .pipeline
        .mark_read(review_id)
        .await
        .map_err(|e| refused(e, output))?;

    if changed {
        output.success(format!("Review #{} marked read", review_id));
    } else {
        output.info(format!("Review #{} was already read", review_id));
    }
    Ok(())
}
