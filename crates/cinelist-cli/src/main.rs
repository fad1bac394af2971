use clap::{ArgAction, Parser, Subcommand};
use cinelist_core::{SortOrder, WatchlistSortKey};
use cinelist_models::{Category, SortFilter};
use commands::{browse, config, detail, prefs, profile, watchlist, AppContext};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinelist")]
#[command(about = "cinelist - Browse movie feeds and keep a local watchlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse a movie feed
    #[command(long_about = "Load the selected category feed page by page. --category and --sort update the saved selection before loading; --interactive keeps the feed open for further pages or a refresh.")]
    Browse {
        /// now_playing, upcoming or popular
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        /// alphabetical, rating or release_date
        #[arg(long, value_parser = parse_sort_filter)]
        sort: Option<SortFilter>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Keep the feed open and offer load more / refresh / quit after each page
        #[arg(long, short = 'i', action = ArgAction::SetTrue)]
        interactive: bool,
    },
    /// Show details, credits and recommendations for a movie
    Detail {
        /// Movie id
        id: u64,
    },
    /// Manage the local watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: WatchlistCommands,
    },
    /// Show or change the saved category and sort selection
    Prefs {
        #[command(subcommand)]
        cmd: Option<PrefsCommands>,
    },
    /// Show the account profile
    Profile {
        /// Account id (defaults to the stored account id)
        account_id: Option<String>,
    },
    /// Show configuration or store the API access token
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum WatchlistCommands {
    /// List saved movies
    List {
        /// title, rating or release-date
        #[arg(long, default_value = "rating", value_parser = parse_watchlist_sort)]
        sort: WatchlistSortKey,

        /// asc or desc
        #[arg(long, default_value = "desc", value_parser = parse_sort_order)]
        order: SortOrder,
    },
    /// Fetch a movie and save it
    Add {
        /// Movie id
        id: u64,
    },
    /// Remove a saved movie
    Remove {
        /// Movie id
        id: u64,
    },
    /// Remove every saved movie
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Show the saved selection
    Show,
    /// Change the saved selection (interactive picker when no flag is given)
    Set {
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        #[arg(long, value_parser = parse_sort_filter)]
        sort: Option<SortFilter>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the access token)
    Show {
        /// Show the access token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Store the API access token (prompts when not given)
    Token {
        #[arg(long)]
        token: Option<String>,

        /// Account id used by `cinelist profile`
        #[arg(long)]
        account_id: Option<String>,
    },
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::from_value(value).ok_or_else(|| {
        format!(
            "Invalid category: {}. Use one of: {}",
            value,
            Category::ALL.iter().map(|c| c.value()).collect::<Vec<_>>().join(", ")
        )
    })
}

fn parse_sort_filter(value: &str) -> Result<SortFilter, String> {
    SortFilter::from_name(value)
        .ok_or_else(|| format!("Invalid sort: {}. Use alphabetical, rating or release_date", value))
}

fn parse_watchlist_sort(value: &str) -> Result<WatchlistSortKey, String> {
    WatchlistSortKey::from_name(value)
        .ok_or_else(|| format!("Invalid sort: {}. Use title, rating or release-date", value))
}

fn parse_sort_order(value: &str) -> Result<SortOrder, String> {
    match value.to_lowercase().as_str() {
        "asc" | "ascending" => Ok(SortOrder::Ascending),
        "desc" | "descending" => Ok(SortOrder::Descending),
        _ => Err(format!("Invalid order: {}. Use asc or desc", value)),
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let context = AppContext::load()?;
    logging::init_logging(cli.verbose, cli.quiet, &context.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Browse {
            category,
            sort,
            pages,
            interactive,
        } => browse::run_browse(&context, category, sort, pages, interactive, &output).await,
        Commands::Detail { id } => detail::run_detail(&context, id, &output).await,
        Commands::Watchlist { cmd } => watchlist::run_watchlist(&context, cmd, &output).await,
        Commands::Prefs { cmd } => {
            let cmd = cmd.unwrap_or(PrefsCommands::Show);
            prefs::run_prefs(&context, cmd, &output)
        }
        Commands::Profile { account_id } => profile::run_profile(&context, account_id, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(context, cmd, &output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_browse_flags() {
        let cli = Cli::try_parse_from(["cinelist", "browse", "--category", "popular", "--sort", "rating", "--pages", "3"])
            .unwrap();
        match cli.command {
            Commands::Browse {
                category,
                sort,
                pages,
                interactive,
            } => {
                assert_eq!(category, Some(Category::Popular));
                assert_eq!(sort, Some(SortFilter::Rating));
                assert_eq!(pages, 3);
                assert!(!interactive);
            }
            _ => panic!("expected browse"),
        }
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["cinelist", "browse", "--category", "classics"]).is_err());
        assert!(Cli::try_parse_from(["cinelist", "browse", "--pages", "0"]).is_err());
    }

    #[test]
    fn test_watchlist_list_defaults() {
        let cli = Cli::try_parse_from(["cinelist", "watchlist", "list"]).unwrap();
        match cli.command {
            Commands::Watchlist {
                cmd: WatchlistCommands::List { sort, order },
            } => {
                assert_eq!(sort, WatchlistSortKey::Rating);
                assert_eq!(order, SortOrder::Descending);
            }
            _ => panic!("expected watchlist list"),
        }
    }

    #[test]
    fn test_sort_order_names() {
        assert_eq!(parse_sort_order("ASC"), Ok(SortOrder::Ascending));
        assert!(parse_sort_order("sideways").is_err());
    }
}
