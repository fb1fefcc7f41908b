//! 路由

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{docs, handlers};
use crate::config::Config;
use crate::infrastructure::PrintEngine;
use crate::workflow::GenerateFlow;

/// 路由共享状态
pub struct AppState<E: PrintEngine> {
    pub flow: Arc<GenerateFlow<E>>,
    pub service_name: Arc<str>,
    /// 请求体上限（字节）
    pub body_limit: usize,
}

impl<E: PrintEngine> AppState<E> {
    pub fn new(flow: Arc<GenerateFlow<E>>, config: &Config) -> Self {
        Self {
            flow,
            service_name: config.service_name.as_str().into(),
            body_limit: config.max_body_bytes,
        }
    }
}

// E 本身不需要 Clone
impl<E: PrintEngine> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            flow: Arc::clone(&self.flow),
            service_name: Arc::clone(&self.service_name),
            body_limit: self.body_limit,
        }
    }
}

pub fn create_router<E: PrintEngine>(state: AppState<E>) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/", get(handlers::health::<E>))
        .route("/generate", post(handlers::generate::<E>))
        .route("/api/v1/generate", post(handlers::generate::<E>))
        .route(docs::OPENAPI_PATH, get(docs::openapi_json))
        .route(docs::DOCS_PATH, get(docs::docs_page))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
