use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::database::Database;

/// Returns the default path of the leads database
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/leadbox/leads.sqlite3`
/// - **Linux**: `~/.local/share/leadbox/leads.sqlite3`
/// - **Windows**: `%LOCALAPPDATA%\leadbox\leads.sqlite3`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("leadbox").join("leads.sqlite3"))
}

/// Open the configured database, falling back to the platform default path
pub fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<(Arc<Database>, PathBuf)> {
    let db_path = match &config.path {
        Some(path) => path.clone(),
        None => get_db_path()?,
    };

    let db = Database::new(&db_path)?;
    Ok((Arc::new(db), db_path))
}
