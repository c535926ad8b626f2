use std::{sync::Arc, time::Instant};

use answerline_auto_reply::Pipeline;

/// Shared state behind every gateway route.
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub version: &'static str,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(pipeline: Arc<Pipeline>) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION"),
            started_at: Instant::now(),
        })
    }
}
