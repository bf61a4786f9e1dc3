use std::path::PathBuf;

use crate::db::Store;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path, DB_FILE};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;
    save_settings(&settings)?;

    let db_path = dir.join(DB_FILE);
    Store::open(&db_path)?;
    tracing::info!("initialized {}", db_path.display());

    println!("Data dir:  {}", dir.display());
    println!("Database:  {}", db_path.display());
    println!();
    println!("Next: `tently signup` or `tently login`, then `tently demo` for sample data.");
    Ok(())
}
