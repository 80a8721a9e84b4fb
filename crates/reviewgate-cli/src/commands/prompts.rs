use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(default_value) = default {
        input = input.default(default_value.to_string());
    }
    input
        .interact_text()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Masked input
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read password: {}", e))
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Re-prompts until the answer is a star rating
pub fn prompt_rating(prompt: &str) -> Result<u8> {
    loop {
        let raw = Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))?;
        match raw.trim().parse::<u8>() {
            Ok(stars @ 1..=5) => return Ok(stars),
            _ => eprintln!("Please enter a whole number from 1 to 5."),
        }
    }
}
