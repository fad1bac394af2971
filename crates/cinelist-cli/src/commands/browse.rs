use super::progress::Spinner;
use super::{describe_api_error, prompts, AppContext};
use crate::output::{new_table, Output};
use cinelist_api::ApiError;
use cinelist_core::summary::{format_release_date, UserScore};
use cinelist_core::{FeedFetcher, FeedSnapshot, PreferenceStore, WatchlistStore};
use cinelist_models::{Category, SortFilter};
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrowseAction {
    LoadMore,
    Refresh,
    Quit,
}

impl fmt::Display for BrowseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseAction::LoadMore => write!(f, "Load more"),
            BrowseAction::Refresh => write!(f, "Refresh"),
            BrowseAction::Quit => write!(f, "Quit"),
        }
    }
}

pub async fn run_browse(
    context: &AppContext,
    category: Option<Category>,
    sort: Option<SortFilter>,
    pages: u32,
    interactive: bool,
    output: &Output,
) -> Result<()> {
    tracing::debug!("Browse command started");

    let storage = context.storage()?;
    let mut preferences = PreferenceStore::load(Arc::clone(&storage));
    if let Err(e) = preferences.initialize() {
        output.warn(format!("Could not save default preferences: {}", e));
    }
    if let Some(category) = category {
        if let Err(e) = preferences.set_selected_category(category) {
            output.warn(format!("Category will not be remembered: {}", e));
        }
    }
    if let Some(sort) = sort {
        if let Err(e) = preferences.set_selected_sort(sort) {
            output.warn(format!("Sort will not be remembered: {}", e));
        }
    }
    let (category, sort) = preferences.active_selection();

    let watchlist = WatchlistStore::load(storage);
    let fetcher = FeedFetcher::new(Arc::new(context.movie_service()?), context.feed_options());

    let spinner = Spinner::start(format!("Loading {} sorted by {}...", category, sort), output.is_human());
    let mut snapshot = match load_pages(&fetcher, category, sort, pages, &spinner).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            spinner.finish();
            return Err(color_eyre::eyre::eyre!("Failed to load {}: {}", category, describe_api_error(&e)));
        }
    };
    spinner.finish();
    render(&snapshot, category, sort, &watchlist, output);

    if !(interactive && output.is_human()) {
        return Ok(());
    }

    loop {
        let mut actions = Vec::new();
        if snapshot.can_load_more {
            actions.push(BrowseAction::LoadMore);
        }
        actions.push(BrowseAction::Refresh);
        actions.push(BrowseAction::Quit);

        let choice = prompts::prompt_select("Next", &actions, 0)?;
        // The prompt can sit idle for a while
        let evicted = fetcher.collect_garbage();
        if evicted > 0 {
            tracing::debug!("Evicted {} idle pages", evicted);
        }
        let result = match actions[choice] {
            BrowseAction::LoadMore => fetcher.load_more().await,
            BrowseAction::Refresh => fetcher.refresh().await,
            BrowseAction::Quit => break,
        };
        match result {
            Ok(next) => snapshot = next,
            Err(e) => {
                output.error(describe_api_error(&e));
                snapshot = fetcher.snapshot();
            }
        }
        render(&snapshot, category, sort, &watchlist, output);
    }

    Ok(())
}

async fn load_pages(
    fetcher: &FeedFetcher,
    category: Category,
    sort: SortFilter,
    pages: u32,
    spinner: &Spinner,
) -> Result<FeedSnapshot, ApiError> {
    let mut snapshot = fetcher.load(category, sort).await?;
    while snapshot.pages_loaded < pages as usize && snapshot.can_load_more {
        spinner.set_message(format!("Loading page {}...", snapshot.current_page + 1));
        snapshot = fetcher.load_more().await?;
    }
    Ok(snapshot)
}

fn render(snapshot: &FeedSnapshot, category: Category, sort: SortFilter, watchlist: &WatchlistStore, output: &Output) {
    if !output.is_human() {
        let movies: Vec<serde_json::Value> = snapshot
            .movies
            .iter()
            .map(|movie| {
                json!({
                    "id": movie.id,
                    "title": movie.title,
                    "release_date": movie.release_date,
                    "vote_average": movie.vote_average,
                    "in_watchlist": watchlist.contains(movie.id),
                })
            })
            .collect();
        output.json(&json!({
            "category": category.value(),
            "sort": sort.value(),
            "current_page": snapshot.current_page,
            "total_pages": snapshot.total_pages,
            "total_results": snapshot.total_results,
            "can_load_more": snapshot.can_load_more,
            "movies": movies,
        }));
        return;
    }

    output.heading(format!("{} · {}", category.label(), sort.label()));

    let mut table = new_table();
    table.set_header(vec!["#", "Id", "Title", "Released", "Score", ""]);
    for (index, movie) in snapshot.movies.iter().enumerate() {
        let score = UserScore::from_vote_average(movie.vote_average);
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(movie.id),
            Cell::new(&movie.title),
            Cell::new(format_release_date(&movie.release_date)),
            Cell::new(format!("{}%", score.percent)),
            Cell::new(if watchlist.contains(movie.id) { "★" } else { "" }),
        ]);
    }
    output.table(&table);

    let footer = format!(
        "Page {} of {} ({} movies)",
        snapshot.current_page, snapshot.total_pages, snapshot.total_results
    );
    output.info(footer.bright_black().to_string());
}
