//! API hit counter and the admin page that reports it.

use axum::{
    Router,
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of requests that reached the API since startup.
#[derive(Clone, Default)]
pub struct HitCounter(Arc<AtomicU64>);

impl HitCounter {
    pub fn hits(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Middleware that counts every request passing through it.
pub async fn count_hits(
    State(counter): State<HitCounter>,
    request: Request,
    next: Next,
) -> Response {
    counter.increment();
    next.run(request).await
}

pub fn router(counter: HitCounter) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(counter)
}

async fn metrics(State(counter): State<HitCounter>) -> impl IntoResponse {
    Html(format!(
        "<html>\n<body>\n\t<h1>Welcome, Chirpgate Admin</h1>\n\t<p>The API has been visited {} times!</p>\n</body>\n</html>",
        counter.hits()
    ))
}
