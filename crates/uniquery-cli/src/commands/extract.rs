//! The `uniquery extract` command.

use std::path::PathBuf;

use anyhow::Result;

use uniquery_core::extract::Extractor;
use uniquery_core::model::ExtractionMode;

use super::read_input;

pub fn execute(input: PathBuf, mode: ExtractionMode, options: usize) -> Result<()> {
    anyhow::ensure!(options >= 2, "a question needs at least 2 options");

    let raw = read_input(&input)?;
    let extractor = Extractor::new(mode).with_option_count(options);

    match extractor.extract(&raw) {
        Ok(questions) => {
            eprintln!("Extracted {} question(s) in {mode} mode", questions.len());
            println!("{}", serde_json::to_string_pretty(&questions)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Raw response:\n{}", e.raw_text().unwrap_or(&raw));
            Err(anyhow::Error::new(e).context(format!("{mode} extraction failed")))
        }
    }
}
