use super::progress::is_interactive;
use super::{prompts, AppContext};
use crate::output::{new_table, Output};
use crate::PrefsCommands;
use cinelist_core::PreferenceStore;
use cinelist_models::{Category, SortFilter};
use color_eyre::Result;
use comfy_table::{Attribute, Cell};
use serde_json::json;

pub fn run_prefs(context: &AppContext, cmd: PrefsCommands, output: &Output) -> Result<()> {
    let mut store = PreferenceStore::load(context.storage()?);
    if let Err(e) = store.initialize() {
        output.warn(format!("Could not save default preferences: {}", e));
    }

    match cmd {
        PrefsCommands::Show => {
            show(&store, output);
            Ok(())
        }
        PrefsCommands::Set { category, sort } => {
            let (category, sort) = if category.is_none() && sort.is_none() {
                pick(&store)?
            } else {
                (category, sort)
            };

            if let Some(category) = category {
                store.set_selected_category(category).map_err(|e| {
                    color_eyre::eyre::eyre!("Failed to save category {}: {}", category, e)
                })?;
            }
            if let Some(sort) = sort {
                store
                    .set_selected_sort(sort)
                    .map_err(|e| color_eyre::eyre::eyre!("Failed to save sort {}: {}", sort, e))?;
            }

            let (category, sort) = store.active_selection();
            output.success(format!("Browsing {} sorted by {}", category, sort));
            Ok(())
        }
    }
}

fn pick(store: &PreferenceStore) -> Result<(Option<Category>, Option<SortFilter>)> {
    if !is_interactive() {
        return Err(color_eyre::eyre::eyre!("Pass --category and/or --sort when not running in a terminal"));
    }

    let (current_category, current_sort) = store.active_selection();
    let categories = store.categories();
    let sorts = store.sort_filters();

    let category_index = prompts::prompt_select(
        "Category",
        categories,
        categories.iter().position(|c| *c == current_category).unwrap_or(0),
    )?;
    let sort_index = prompts::prompt_select(
        "Sort by",
        sorts,
        sorts.iter().position(|s| *s == current_sort).unwrap_or(0),
    )?;

    Ok((Some(categories[category_index]), Some(sorts[sort_index])))
}

fn show(store: &PreferenceStore, output: &Output) {
    let (category, sort) = store.active_selection();

    if !output.is_human() {
        output.json(&json!({
            "selectedCategory": category.value(),
            "selectedSort": sort.value(),
            "categories": store.categories().iter().map(|c| c.value()).collect::<Vec<_>>(),
            "sortFilters": store.sort_filters().iter().map(|s| s.value()).collect::<Vec<_>>(),
        }));
        return;
    }

    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Preference").add_attribute(Attribute::Bold),
        Cell::new("Selected").add_attribute(Attribute::Bold),
        Cell::new("Options").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Category"),
        Cell::new(category.label()),
        Cell::new(
            store
                .categories()
                .iter()
                .map(|c| c.value())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Sort"),
        Cell::new(sort.label()),
        Cell::new(
            store
                .sort_filters()
                .iter()
                .map(|s| s.value())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]);
    output.table(&table);
}
