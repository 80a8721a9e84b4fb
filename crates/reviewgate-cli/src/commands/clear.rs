use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use review_intake_config::{Config, PathManager};
use review_intake_core::store::SnapshotStorage;

pub async fn run_clear(all: bool, store: bool, credentials: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if !(all || store || credentials) {
        output.warn("No clear option specified. Use --store, --credentials, or --all");
        output.println("\nExample: reviewgate clear --store");
        return Ok(());
    }

    if all || store {
        clear_store(&path_manager, output)?;
    }
    if all || credentials {
        clear_credentials(&path_manager, output)?;
    }
    Ok(())
}

fn clear_store(path_manager: &PathManager, output: &Output) -> Result<()> {
    let config = Config::load_or_default(&path_manager.config_file())
        .map_err(|e| eyre!("Failed to load config: {}", e))?;
    let path = config.store.path.clone().unwrap_or_else(|| path_manager.review_store_file());
    let storage = SnapshotStorage::new(&path, config.store.compress);

    if !storage.path().exists() {
        output.info("No review store found to clear");
        return Ok(());
    }
    let size = storage.size().map_err(|e| eyre!("{}", e))?;
    storage
        .clear()
        .map_err(|e| eyre!("Failed to remove review store at {}: {}", path.display(), e))?;
    output.success(format!("Cleared review store: {} ({} bytes)", path.display(), size));
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();
    if !credentials_file.exists() {
        output.info("No credentials file found to clear");
        return Ok(());
    }
    std::fs::remove_file(&credentials_file)
        .map_err(|e| eyre!("Failed to remove credentials file at {}: {}", credentials_file.display(), e))?;
    output.success(format!("Cleared credentials: {}", credentials_file.display()));
    Ok(())
}
