use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::core::normalizer::KeywordRecord;

/// Append a produced record to the history log
///
/// One line per user action. Explanations are flattened to a single
/// line so the log stays greppable.
pub fn append(kind: &str, record: &KeywordRecord) -> Result<()> {
    // Determine config directory (respecting XDG)
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
    let log_dir = config_dir.join("querysmith");
    std::fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("history.log");

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    writeln!(
        file,
        "[{}] {} | {} | {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        kind,
        record.keyword,
        record.explanation.replace('\n', " ")
    )?;
    Ok(())
}
