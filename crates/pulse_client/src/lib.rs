pub mod bookmarks;
pub mod kv;
pub mod newsletter;
pub mod pager;
pub mod recent;
pub mod search;
pub mod votes;

pub use bookmarks::Bookmarks;
pub use kv::MemoryKeyValue;
pub use newsletter::NewsletterSignup;
pub use pager::{reading_progress, Pager};
pub use recent::RecentSearches;
pub use search::{
    fuzzy_match, run_search, SearchCache, SearchPhase, SearchRequest, SearchSession,
    TrendingCache,
};
pub use votes::VoteLedger;

pub mod prelude {
    pub use super::{Bookmarks, MemoryKeyValue, NewsletterSignup, SearchSession, VoteLedger};
    pub use pulse_core::{Article, KeyValueStore};
}
