use crate::output::Output;
use color_eyre::Result;
use owo_colors::OwoColorize;
use review_intake_models::{ContactMethod, ContactSubmission, RedirectTarget, ReviewSubmission};
use super::intake::refused;
use super::prompts::{prompt_rating, prompt_string, prompt_yes_no};
use super::AppContext;

/// Interactive run of the customer flow: rating and feedback, then the
/// private feedback and contact steps when the review is routed there.
pub async fn run_wizard(client: &str, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let business = if ctx.config.business.name.is_empty() {
        "us".to_string()
    } else {
        ctx.config.business.name.clone()
    };

    output.println(format!("How was your visit to {}?", business.bold()));
    let rating = prompt_rating("Rating (1-5)")?;
    let feedback = prompt_string("Tell us about it", None)?;

    let outcome = ctx
        .pipeline
        .submit_review(&ReviewSubmission::new(rating, feedback), client)
        .await
        .map_err(|e| refused(e, output))?;

    if outcome.redirect == RedirectTarget::Share {
        output.success("Thanks! We'd love it if you shared your review publicly.");
        return Ok(());
    }

    let Some(review_ref) = outcome.review_ref else {
        output.warn("We couldn't save your review right now. Please try again later.");
        return Ok(());
    };

    output.println("We're sorry to hear that. What could we do better?");
    let improvement = prompt_string("Improvement suggestions", Some(""))?;
    let areas = prompt_string("Areas (comma separated, optional)", Some(""))?;
    let areas: Vec<String> = areas
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    ctx.pipeline
        .submit_feedback_detail(&review_ref.token, &improvement, &areas)
        .await
        .map_err(|e| refused(e, output))?;

    let contact = if prompt_yes_no("May we contact you about this?", true)? {
        let name = prompt_string("Your name", None)?;
        let email = prompt_string("Email (optional)", Some(""))?;
        let phone = prompt_string("Phone (optional)", Some(""))?;
        let preferred_contact = if email.trim().is_empty() && !phone.trim().is_empty() {
            ContactMethod::Phone
        } else {
            ContactMethod::Email
        };
        ContactSubmission { wants_contact: true, name, email, phone, preferred_contact }
    } else {
        ContactSubmission::declined()
    };

    let step = ctx
        .pipeline
        .submit_contact_info(&review_ref.token, &contact)
        .await
        .map_err(|e| refused(e, output))?;

    match step.redirect {
        RedirectTarget::ThankYou => output.success("Thank you! Someone will be in touch."),
        _ => output.success("Thanks for your feedback. Goodbye!"),
    }
    Ok(())
}
