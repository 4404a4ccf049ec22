use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

/// Emits one `request_completed` event per request, levelled by status class.
///
/// `route` is the matched pattern (`/api/rooms/{code}/moves`), so events for
/// different rooms group together.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

struct Completed {
    method: String,
    route: String,
    trace_id: String,
    status: StatusCode,
    duration_us: u64,
}

impl Completed {
    fn emit(&self) {
        let status = self.status.as_u16();
        if self.status.is_server_error() {
            error!(http.method = %self.method, http.route = %self.route, http.status_code = status, duration_us = self.duration_us, trace_id = %self.trace_id, "request_completed");
        } else if self.status.is_client_error() {
            warn!(http.method = %self.method, http.route = %self.route, http.status_code = status, duration_us = self.duration_us, trace_id = %self.trace_id, "request_completed");
        } else {
            info!(http.method = %self.method, http.route = %self.route, http.status_code = status, duration_us = self.duration_us, trace_id = %self.trace_id, "request_completed");
        }
    }
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let trace_id = req
            .extensions()
            .get::<String>()
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            // Routing happens below this middleware, so the pattern is only known now.
            let (status, route) = match &result {
                Ok(res) => (res.status(), res.request().match_pattern().unwrap_or(path)),
                Err(err) => (err.as_response_error().status_code(), path),
            };

            Completed {
                method,
                route,
                trace_id,
                status,
                duration_us: start.elapsed().as_micros() as u64,
            }
            .emit();

            result
        })
    }
}
