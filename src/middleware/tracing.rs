use std::time::Instant;

use tracing::{field, info, info_span, warn};

use super::{Next, Plugin};
use crate::context::{Request, Response};

/// Opens a `request` span around the rest of the chain.
///
/// Everything logged by later plugins and the handler nests under the span,
/// which records the final status and latency once the chain unwinds.
pub struct TracingPlugin;

impl Plugin for TracingPlugin {
    fn call(&self, req: &mut Request, resp: &mut Response, next: Next<'_>) {
        let span = info_span!(
            "request",
            method = %req.method,
            path = %req.path,
            status = field::Empty,
            latency_us = field::Empty,
        );
        let _entered = span.enter();
        let started = Instant::now();

        next.run(req, resp);

        let latency = started.elapsed();
        span.record("status", resp.status.as_u16());
        span.record("latency_us", latency.as_micros() as u64);
        if resp.status.is_server_error() {
            warn!(status = resp.status.as_u16(), "Request failed");
        } else {
            info!(status = resp.status.as_u16(), "Request completed");
        }
    }
}
