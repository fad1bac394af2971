use super::progress::Spinner;
use super::{describe_api_error, AppContext};
use crate::output::{new_table, Output};
use cinelist_core::{MovieSummary, ScoreBand, WatchlistStore};
use cinelist_models::Movie;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color};
use owo_colors::OwoColorize;
use serde_json::json;

const RECOMMENDATION_LIMIT: usize = 10;

pub async fn run_detail(context: &AppContext, movie_id: u64, output: &Output) -> Result<()> {
    let service = context.movie_service()?;

    let spinner = Spinner::start(format!("Fetching movie {}...", movie_id), output.is_human());
    let (movie, credits, recommendations) = tokio::join!(
        service.detail(movie_id),
        service.credits(movie_id),
        service.recommendations(movie_id)
    );
    spinner.finish();

    let movie = movie
        .map_err(|e| color_eyre::eyre::eyre!("Failed to fetch movie {}: {}", movie_id, describe_api_error(&e)))?;
    let credits = match credits {
        Ok(credits) => Some(credits),
        Err(e) => {
            output.warn(format!("Credits unavailable: {}", describe_api_error(&e)));
            None
        }
    };
    let recommendations: Vec<Movie> = match recommendations {
        Ok(page) => page.results.into_iter().take(RECOMMENDATION_LIMIT).collect(),
        Err(e) => {
            tracing::warn!("Recommendations unavailable for {}: {}", movie_id, e);
            Vec::new()
        }
    };

    let summary = MovieSummary::new(&movie, credits.as_ref(), &context.config.api.image_base_url);
    let in_watchlist = WatchlistStore::load(context.storage()?).contains(movie_id);

    if !output.is_human() {
        let recommendations: Vec<serde_json::Value> = recommendations
            .iter()
            .map(|m| json!({"id": m.id, "title": m.title, "release_date": m.release_date, "vote_average": m.vote_average}))
            .collect();
        output.json(&json!({
            "movie": summary,
            "in_watchlist": in_watchlist,
            "recommendations": recommendations,
        }));
        return Ok(());
    }

    render_summary(&summary, in_watchlist, output);

    if !recommendations.is_empty() {
        output.heading("Recommended");
        for movie in &recommendations {
            output.info(format!("  {} {}", movie.id.to_string().bright_black(), movie.title));
        }
    }

    Ok(())
}

fn render_summary(summary: &MovieSummary, in_watchlist: bool, output: &Output) {
    let marker = if in_watchlist { " ★" } else { "" };
    output.heading(format!("{}{}", summary.title, marker));

    let score_color = match summary.score.band {
        ScoreBand::High => Color::Green,
        ScoreBand::Medium => Color::Yellow,
        ScoreBand::Low => Color::Red,
    };

    let mut table = new_table();
    table.add_row(vec![
        Cell::new("User score").add_attribute(Attribute::Bold),
        Cell::new(format!("{}% ({} votes)", summary.score.percent, summary.vote_count)).fg(score_color),
    ]);
    let rows = [
        ("Released", Some(summary.release_date.clone())),
        ("Genres", Some(summary.genres.clone())),
        ("Language", Some(summary.language.clone())),
        ("Director", summary.director.clone()),
        ("Writer", summary.writer.clone()),
        ("Collection", summary.collection.clone()),
        ("Poster", summary.poster_url.clone()),
    ];
    for (label, value) in rows {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
        }
    }
    output.table(&table);

    if !summary.overview.is_empty() {
        output.info(format!("\n{}", summary.overview));
    }

    if !summary.cast.is_empty() {
        output.heading("Cast");
        let mut cast_table = new_table();
        cast_table.set_header(vec!["Name", "Character"]);
        for member in &summary.cast {
            cast_table.add_row(vec![member.name.as_str(), member.character.as_str()]);
        }
        output.table(&cast_table);
    }
}
