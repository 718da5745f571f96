//! Request logging stage.
//!
//! Scopes every request to a [`TraceId`], logs the request line and echoes the
//! identifier in a `trace-id` response header. An identifier already placed
//! in the request extensions by an outer stage is adopted so failures logged
//! outside the task-local scope correlate with it.

use actix_service::Service as _;
use actix_web::HttpMessage as _;
use actix_web::dev::ServiceRequest;
use actix_web::http::header::{HeaderName, HeaderValue};
use tracing::{error, info};

use super::stage::{Next, Stage, StageFuture};
use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Logs `remote_addr - proto method uri` for every request.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use snippetbox::middleware::{LogRequest, Staged};
///
/// let _app = App::new().wrap(Staged::new(LogRequest));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequest;

impl Stage for LogRequest {
    fn handle(&self, req: ServiceRequest, next: Next) -> StageFuture {
        let adopted = req.extensions().get::<TraceId>().copied();
        let trace_id = adopted.unwrap_or_else(|| {
            let generated = TraceId::generate();
            req.extensions_mut().insert(generated);
            generated
        });
        let remote_addr = req
            .connection_info()
            .peer_addr()
            .unwrap_or("-")
            .to_owned();
        info!(
            %trace_id,
            %remote_addr,
            proto = ?req.version(),
            method = %req.method(),
            uri = %req.uri(),
            "request received"
        );

        Box::pin(TraceId::scope(trace_id, async move {
            let mut res = next.call(req).await?;
            match HeaderValue::from_str(&trace_id.to_string()) {
                Ok(value) => {
                    res.headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(error) => error!(%error, %trace_id, "failed to encode trace identifier header"),
            }
            Ok(res)
        }))
    }
}
