//! The `uniquery list-models` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use uniquery_providers::create_provider;

pub fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = uniquery_providers::load_config_from(config_path.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Provider", "Model", "Name", "Context", "Default"]);
    let mut rows = 0;

    for (name, provider_config) in &config.providers {
        if provider_filter.as_ref().is_some_and(|filter| filter != name) {
            continue;
        }

        let provider = match create_provider(name, provider_config, config.timeout_secs) {
            Ok(provider) => provider,
            Err(e) => {
                eprintln!("Skipping provider {name}: {e:#}");
                continue;
            }
        };

        for model in provider.available_models() {
            let is_default = *name == config.default_provider && model.id == config.default_model;
            let context = if model.max_context == 0 {
                "-".to_string()
            } else {
                format!("{}K", model.max_context / 1024)
            };
            table.add_row(vec![
                Cell::new(name),
                Cell::new(&model.id),
                Cell::new(&model.name),
                Cell::new(context),
                Cell::new(if is_default { "*" } else { "" }),
            ]);
            rows += 1;
        }
    }

    if rows == 0 {
        println!("No providers configured. Run `uniquery init` to create a config file.");
    } else {
        println!("{table}");
    }

    Ok(())
}
