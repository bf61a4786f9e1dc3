use std::path::PathBuf;

use colored::Colorize;

use super::{open_store, require_login};
use crate::error::Result;
use crate::importer::import_file;

pub fn run(file: &str) -> Result<()> {
    let store = open_store()?;
    require_login(&store)?;

    let result = import_file(&store, &PathBuf::from(file))?;
    println!(
        "{} imported, {} skipped (email already on file), {} rejected",
        result.imported,
        result.skipped,
        result.rejected.len()
    );
    for row in &result.rejected {
        let problems: Vec<String> = row.errors.iter().map(|e| e.to_string()).collect();
        println!("  {} {}", format!("line {}:", row.line).yellow(), problems.join("; "));
    }
    Ok(())
}
