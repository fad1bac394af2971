use super::progress::{is_interactive, Spinner};
use super::{describe_api_error, prompts, AppContext};
use crate::output::{new_table, Output};
use crate::WatchlistCommands;
use cinelist_core::summary::{format_release_date, truncate_title};
use cinelist_core::{SortOrder, WatchlistSortKey, WatchlistStore};
use color_eyre::Result;
use comfy_table::Cell;
use serde_json::json;

pub async fn run_watchlist(context: &AppContext, cmd: WatchlistCommands, output: &Output) -> Result<()> {
    let mut store = WatchlistStore::load(context.storage()?);

    match cmd {
        WatchlistCommands::List { sort, order } => {
            list(&store, sort, order, output);
            Ok(())
        }
        WatchlistCommands::Add { id } => add(context, &mut store, id, output).await,
        WatchlistCommands::Remove { id } => {
            match store.remove(id) {
                Ok(true) => output.success(format!("Removed {} from watchlist", id)),
                Ok(false) => output.info(format!("Movie {} is not in the watchlist", id)),
                Err(e) => output.warn(format!("Removed for now, but the change was not saved: {}", e)),
            }
            Ok(())
        }
        WatchlistCommands::Clear { yes } => {
            if store.is_empty() {
                output.info("Watchlist is already empty");
                return Ok(());
            }
            if !yes {
                if !is_interactive() {
                    return Err(color_eyre::eyre::eyre!("Refusing to clear without confirmation; pass --yes"));
                }
                let prompt = format!("Remove all {} movies from the watchlist?", store.count());
                if !prompts::prompt_yes_no(&prompt, Some(false))? {
                    output.info("Watchlist left unchanged");
                    return Ok(());
                }
            }
            match store.clear() {
                Ok(()) => output.success("Watchlist cleared"),
                Err(e) => output.warn(format!("Cleared for now, but the change was not saved: {}", e)),
            }
            Ok(())
        }
    }
}

async fn add(context: &AppContext, store: &mut WatchlistStore, movie_id: u64, output: &Output) -> Result<()> {
    if let Some(entry) = store.find_by_id(movie_id) {
        output.info(format!("\"{}\" is already in the watchlist", entry.title));
        return Ok(());
    }

    let service = context.movie_service()?;
    let spinner = Spinner::start(format!("Fetching movie {}...", movie_id), output.is_human());
    let movie = service.detail(movie_id).await;
    spinner.finish();
    let movie = movie
        .map_err(|e| color_eyre::eyre::eyre!("Failed to fetch movie {}: {}", movie_id, describe_api_error(&e)))?;

    match store.add(&movie) {
        Ok(_) => output.success(format!("Added \"{}\" to watchlist", movie.title)),
        Err(e) => output.warn(format!("Added \"{}\" for now, but the change was not saved: {}", movie.title, e)),
    }
    Ok(())
}

fn list(store: &WatchlistStore, sort: WatchlistSortKey, order: SortOrder, output: &Output) {
    let entries = store.sorted(sort, order);

    if !output.is_human() {
        output.json(&json!({
            "count": entries.len(),
            "movies": entries,
        }));
        return;
    }

    if entries.is_empty() {
        output.info("Watchlist is empty. Add a movie with `cinelist watchlist add <id>`.");
        return;
    }

    output.heading(format!("Watchlist ({})", entries.len()));
    let mut table = new_table();
    table.set_header(vec!["Id", "Title", "Released", "Rating", "Added"]);
    for entry in &entries {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(truncate_title(&entry.title, 32)),
            Cell::new(format_release_date(&entry.release_date)),
            Cell::new(format!("{:.1}", entry.vote_average)),
            Cell::new(entry.added_at.format("%Y-%m-%d").to_string()),
        ]);
    }
    output.table(&table);
}
