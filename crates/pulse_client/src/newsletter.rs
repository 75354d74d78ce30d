use std::sync::Arc;

use pulse_core::{KeyValueStore, SubscribeError};
use pulse_feed::ContentFeed;

const SUBSCRIBED_KEY: &str = "pulse.subscribed";

/// Newsletter signup flow. Validation happens before any store call and
/// failures come back as a field-level reason, never a crash.
pub struct NewsletterSignup {
    kv: Arc<dyn KeyValueStore>,
}

impl NewsletterSignup {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn is_subscribed(&self) -> bool {
        self.kv.get(SUBSCRIBED_KEY).as_deref() == Some("true")
    }

    /// The completed flag is set on success only; a rejected address can
    /// be retried by re-submitting.
    pub async fn submit(
        &self,
        feed: &ContentFeed,
        email: &str,
    ) -> std::result::Result<(), SubscribeError> {
        feed.subscribe(email).await?;
        self.kv.set(SUBSCRIBED_KEY, "true");
        Ok(())
    }
}
