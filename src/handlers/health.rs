use actix_web::{HttpResponse, Result};

use crate::models::HealthResponse;

pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Passrs passkey service is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
