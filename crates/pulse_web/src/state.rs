use pulse_feed::ContentFeed;

pub struct AppState {
    pub feed: ContentFeed,
}
