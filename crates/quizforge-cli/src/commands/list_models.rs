//! The `quizforge list-models` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizforge_providers::create_provider;

pub fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = quizforge_providers::config::load_config_from(config_path.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec![
        "Provider",
        "Model",
        "Name",
        "Context",
        "$/1K in",
        "$/1K out",
    ]);

    let mut found_any = false;

    for (name, provider_config) in &config.providers {
        if let Some(filter) = &provider_filter {
            if name != filter {
                continue;
            }
        }

        let provider = create_provider(name, provider_config)?;
        for model in provider.available_models() {
            found_any = true;
            table.add_row(vec![
                Cell::new(name),
                Cell::new(&model.id),
                Cell::new(&model.name),
                Cell::new(format!("{}K", model.max_context / 1000)),
                Cell::new(format!("{:.4}", model.cost_per_1k_input)),
                Cell::new(format!("{:.4}", model.cost_per_1k_output)),
            ]);
        }
    }

    if found_any {
        println!("{table}");
    } else {
        println!("No providers configured. Run `quizforge init` to create a config file.");
    }

    Ok(())
}
