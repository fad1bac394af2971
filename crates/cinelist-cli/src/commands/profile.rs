use super::progress::Spinner;
use super::{describe_api_error, AppContext};
use crate::output::{new_table, Output};
use cinelist_api::ProfileService;
use color_eyre::Result;
use comfy_table::{Attribute, Cell};
use serde_json::json;

pub async fn run_profile(context: &AppContext, account_id: Option<String>, output: &Output) -> Result<()> {
    let account_id = account_id
        .or_else(|| context.credentials.get_account_id().cloned())
        .ok_or_else(|| {
            color_eyre::eyre::eyre!("No account id given; pass one or run `cinelist config token --account-id <id>`")
        })?;

    let service = ProfileService::new(context.http_client()?);
    let spinner = Spinner::start("Fetching profile...", output.is_human());
    let profile = service.profile(&account_id).await;
    spinner.finish();
    let profile = profile
        .map_err(|e| color_eyre::eyre::eyre!("Failed to fetch profile {}: {}", account_id, describe_api_error(&e)))?;

    if !output.is_human() {
        output.json(&json!(profile));
        return Ok(());
    }

    let mut table = new_table();
    let rows = [
        ("Id", profile.id.to_string()),
        ("Name", profile.name.clone()),
        ("Username", profile.username.clone()),
        ("Language", profile.iso_639_1.clone()),
        ("Region", profile.iso_3166_1.clone()),
        ("Adult content", if profile.include_adult { "yes" } else { "no" }.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    output.heading("Profile");
    output.table(&table);
    Ok(())
}
