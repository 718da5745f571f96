//! Liveness endpoint for load balancers.
//!
//! Served outside the session chain so health checks never mint cookies.

use actix_web::http::header;
use actix_web::{HttpResponse, get};

/// Plain-text `OK` while the process is serving requests.
#[get("/ping")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body("OK\n")
}
