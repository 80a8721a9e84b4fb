use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use review_intake_core::IntakeError;
use review_intake_models::{ContactMethod, ContactSubmission, CorrelationToken, ReviewSubmission};
use serde_json::Value;
use super::{error_json, step_json, submission_json, AppContext};

/// Numbers stay numbers; anything else is passed through as a string and rejected by validation
pub fn parse_rating_arg(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw.trim())
        .ok()
        .filter(Value::is_number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

pub fn contact_submission(
    no_contact: bool,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    preferred: &str,
) -> Result<ContactSubmission> {
    if no_contact {
        return Ok(ContactSubmission::declined());
    }
    let preferred_contact = preferred.parse::<ContactMethod>().map_err(|e| eyre!(e))?;
    Ok(ContactSubmission {
        wants_contact: true,
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        preferred_contact,
    })
}

pub async fn run_submit(rating: &str, feedback: &str, client: &str, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let submission = ReviewSubmission::new(parse_rating_arg(rating), feedback);

    let outcome = ctx
        .pipeline
        .submit_review(&submission, client)
        .await
        .map_err(|e| refused(e, output))?;

    output.result(&submission_json(&outcome), || {
        match &outcome.review_ref {
            Some(review_ref) => {
                println!("{} Review #{} recorded ({})", "✓".green(), review_ref.id, outcome.sentiment);
                println!("Session token: {}", review_ref.token.bold());
            }
            None => println!("{} Review could not be saved", "⚠".yellow()),
        }
        if outcome.degraded {
            println!("{} Sentiment fell back to the star rating", "⚠".yellow());
        }
        println!("Next: {}", outcome.redirect.path().cyan());
    });
    Ok(())
}

pub async fn run_feedback(token: &str, text: &str, areas: &[String], output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let token = CorrelationToken::from(token);
    let outcome = ctx
        .pipeline
        .submit_feedback_detail(&token, text, areas)
        .await
        .map_err(|e| refused(e, output))?;

    output.result(&step_json(&outcome), || {
        println!("{} Improvement details saved", "✓".green());
        println!("Next: {}", outcome.redirect.path().cyan());
    });
    Ok(())
}

pub async fn run_contact(token: &str, contact: &ContactSubmission, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let token = CorrelationToken::from(token);
    let outcome = ctx
        .pipeline
        .submit_contact_info(&token, contact)
        .await
        .map_err(|e| refused(e, output))?;

    output.result(&step_json(&outcome), || {
        if contact.wants_contact {
            println!("{} Contact details saved", "✓".green());
        }
        println!("Next: {}", outcome.redirect.path().cyan());
    });
    Ok(())
}

/// Report the refusal in the selected format and turn it into the exit error
pub(super) fn refused(error: IntakeError, output: &Output) -> color_eyre::Report {
    if output.is_json() {
        output.result(&error_json(&error), || {});
    }
    eyre!("{} ({})", error, error.reason())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_arg_keeps_numbers() {
        assert_eq!(parse_rating_arg("4"), json!(4));
        assert_eq!(parse_rating_arg(" 3.5 "), json!(3.5));
        assert_eq!(parse_rating_arg("four"), json!("four"));
        assert_eq!(parse_rating_arg("\"4\""), json!("\"4\""));
    }

    #[test]
    fn test_contact_submission_from_flags() {
        let declined = contact_submission(true, None, None, None, "email").unwrap();
        assert!(!declined.wants_contact);

        let contact = contact_submission(
            false,
            Some("Ann".to_string()),
            None,
            Some("555-0100".to_string()),
            "phone",
        )
        .unwrap();
        assert!(contact.wants_contact);
        assert_eq!(contact.preferred_contact, ContactMethod::Phone);
        assert_eq!(contact.email, "");

        assert!(contact_submission(false, None, None, None, "pigeon").is_err());
    }
}
