use super::{mask_string, prompts, AppContext};
use crate::output::{new_table, Output};
use crate::ConfigCommands;
use cinelist_config::ACCESS_TOKEN_ENV;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color};
use serde_json::json;

pub fn run_config(context: AppContext, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => {
            show_config(&context, full, output);
            Ok(())
        }
        ConfigCommands::Token { token, account_id } => configure_token(context, token, account_id, output),
    }
}

/// Where the effective access token comes from
fn token_source(context: &AppContext) -> &'static str {
    let from_env = std::env::var(ACCESS_TOKEN_ENV)
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    if from_env {
        "environment"
    } else if context.credentials.get_access_token().is_some() {
        "credentials file"
    } else {
        "not set"
    }
}

fn show_config(context: &AppContext, full: bool, output: &Output) {
    let config = &context.config;
    let token = context.credentials.resolve_access_token().unwrap_or_default();
    let token_display = if full { token.clone() } else { mask_string(&token) };
    let config_file = context.paths.config_file();

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "storage_dir": context.paths.storage_dir().display().to_string(),
            "api": {
                "base_url": config.api.base_url,
                "image_base_url": config.api.image_base_url,
                "timeout_ms": config.api.timeout_ms,
                "language": config.api.language,
                "region": config.api.region,
            },
            "feed": {
                "stale_secs": config.feed.stale_secs,
                "gc_secs": config.feed.gc_secs,
            },
            "logging": {
                "level": config.logging.level,
                "json": config.logging.json,
                "file": config.logging.file.as_ref().map(|p| p.display().to_string()),
            },
            "access_token": token_display,
            "access_token_source": token_source(context),
            "account_id": context.credentials.get_account_id(),
        }));
        return;
    }

    if !config_file.exists() {
        output.warn(format!("No configuration file at {}; using defaults", config_file.display()));
    }

    let section = |title: &str, rows: Vec<(&str, String)>| {
        let mut table = new_table();
        table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
        for (label, value) in rows {
            table.add_row(vec![Cell::new(label), Cell::new(value)]);
        }
        output.table(&table);
    };

    output.heading("Configuration");
    section(
        "Files",
        vec![
            ("Config file", config_file.display().to_string()),
            ("Credentials", context.paths.credentials_file().display().to_string()),
            ("Storage", context.paths.storage_dir().display().to_string()),
        ],
    );
    section(
        "API",
        vec![
            ("Base URL", config.api.base_url.clone()),
            ("Image base URL", config.api.image_base_url.clone()),
            ("Timeout", format!("{}ms", config.api.timeout_ms)),
            ("Language", config.api.language.clone()),
            ("Region", config.api.region.clone().unwrap_or_else(|| "-".to_string())),
            ("Access token", format!("{} ({})", token_display, token_source(context))),
            (
                "Account id",
                context
                    .credentials
                    .get_account_id()
                    .cloned()
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ],
    );
    section(
        "Feed cache",
        vec![
            ("Fresh for", format!("{}s", config.feed.stale_secs)),
            ("Evicted after", format!("{}s idle", config.feed.gc_secs)),
        ],
    );
    section(
        "Logging",
        vec![
            ("Level", config.logging.level.clone()),
            ("JSON", config.logging.json.to_string()),
            (
                "File",
                config
                    .logging
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "stderr".to_string()),
            ),
        ],
    );
}

fn configure_token(
    mut context: AppContext,
    token: Option<String>,
    account_id: Option<String>,
    output: &Output,
) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => prompts::prompt_password("API read access token")?,
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(color_eyre::eyre::eyre!("Access token cannot be empty"));
    }

    context.credentials.set_access_token(token);
    if let Some(account_id) = account_id {
        context.credentials.set_account_id(account_id.trim().to_string());
    }

    let credentials_file = context.paths.credentials_file();
    context
        .credentials
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", credentials_file.display(), e))?;

    output.success(format!("Access token saved to {}", credentials_file.display()));
    if token_source(&context) == "environment" {
        output.warn(format!("{} is set and takes precedence over the stored token", ACCESS_TOKEN_ENV));
    }
    Ok(())
}
