pub mod category;
pub mod credits;
pub mod movie;
pub mod page;
pub mod profile;
pub mod watchlist;

pub use category::{Category, SortFilter};
pub use credits::{CastMember, CrewMember, MovieCredits};
pub use movie::{Genre, Movie, MovieCollection};
pub use page::{MoviePage, Page};
pub use profile::Profile;
pub use watchlist::WatchlistEntry;
