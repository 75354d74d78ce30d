use std::sync::Arc;

use pulse_core::KeyValueStore;
use pulse_feed::ContentFeed;

/// Per-model vote flags owned by the client.
///
/// At-most-once is enforced here, not server-side: the flag is checked
/// before the call and set right after issuing it. A failed increment is
/// not rolled back, so a dropped RPC leaves the flag set while the server
/// count stays put. Known gap, kept until a reconciliation policy exists.
pub struct VoteLedger {
    kv: Arc<dyn KeyValueStore>,
}

impl VoteLedger {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn key(model_id: i64) -> String {
        format!("pulse.voted.{}", model_id)
    }

    pub fn has_voted(&self, model_id: i64) -> bool {
        self.kv.get(&Self::key(model_id)).is_some()
    }

    pub fn mark_voted(&self, model_id: i64) {
        self.kv.set(&Self::key(model_id), "true");
    }

    /// Returns false when the vote was suppressed by the local flag.
    pub async fn cast_vote(&self, feed: &ContentFeed, model_id: i64) -> bool {
        if self.has_voted(model_id) {
            return false;
        }
        feed.cast_vote(model_id).await;
        self.mark_voted(model_id);
        true
    }
}
