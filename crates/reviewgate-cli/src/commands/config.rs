use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use review_intake_config::{Config, CredentialStore, PathManager, API_KEY_ENV_VAR};
use serde_json::json;
use super::prompts::{prompt_password, prompt_yes_no};

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show => show(&paths, output),
        ConfigCommands::Init { force } => init(&paths, force, output),
        ConfigCommands::SetApiKey { key } => set_api_key(&paths, key, output),
    }
}

fn show(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let key_source = if std::env::var(API_KEY_ENV_VAR).map(|v| !v.trim().is_empty()).unwrap_or(false) {
        format!("set (from {})", API_KEY_ENV_VAR)
    } else {
        match credentials.get_classifier_api_key() {
            Some(key) => format!("set ({})", mask(key)),
            None => "not set".to_string(),
        }
    };

    if output.is_json() {
        let data = json!({
            "config_file": config_file.display().to_string(),
            "config": serde_json::to_value(&config)?,
            "api_key": key_source,
        });
        output.result(&data, || {});
        return Ok(());
    }

    let rendered = toml::to_string_pretty(&config).map_err(|e| eyre!("Failed to render config: {}", e))?;
    output.println(format!("# {}", config_file.display()));
    output.println(rendered);
    output.println(format!("API key: {}", key_source));
    if let Some(saved_at) = credentials.get_classifier_api_key_saved_at() {
        output.println(format!("API key saved: {}", saved_at.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Err(e) = config.validate() {
        output.warn(format!("Configuration problem: {}", e));
    }
    Ok(())
}

fn init(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force && !prompt_yes_no("Configuration exists. Overwrite with defaults?", false)? {
        output.info("Left existing configuration unchanged");
        return Ok(());
    }
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}

fn set_api_key(paths: &PathManager, key: Option<String>, output: &Output) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => prompt_password("Classifier API key")?,
    };
    if key.trim().is_empty() {
        return Err(eyre!("API key cannot be empty"));
    }

    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    credentials.set_classifier_api_key(key.trim().to_string());
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    output.success("Stored classifier API key");
    Ok(())
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    format!("****{}", chars[chars.len() - 4..].iter().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask("sk-abcdefghijkl"), "****ijkl");
        assert_eq!(mask("short"), "****");
    }
}
