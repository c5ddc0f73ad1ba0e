use tracing::warn;

use crate::models::post::{Post, PostId};

/// Narrows a fetched page to the posts the sheet does not have yet, newest first.
///
/// The API already applies `since_id` exclusively and returns newest first;
/// this re-checks both so a misbehaving page can never break row order or
/// duplicate the watermark row.
pub fn reconcile(mut fetched: Vec<Post>, watermark: Option<PostId>) -> Vec<Post> {
    let before = fetched.len();
    if let Some(watermark) = watermark {
        fetched.retain(|p| p.id > watermark);
    }
    fetched.sort_by(|a, b| b.id.cmp(&a.id));
    fetched.dedup_by_key(|p| p.id);

    if fetched.len() != before {
        warn!(
            "Dropped {} already-synced or duplicate tweets from fetched page",
            before - fetched.len()
        );
    }
    fetched
}
