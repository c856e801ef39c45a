//! HTTP server rendering pages on request.
//!
//! Answers on the same URLs the static build writes, from one immutable
//! catalog loaded at startup.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{asset, DiagramGenerator, TemplateEngine};
use crate::routing;
use crate::views::Pages;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
pub struct AppState {
    pub catalog: Catalog,
    pub engine: TemplateEngine,
    pub config: Config,
}

impl AppState {
    pub fn new(catalog: Catalog, config: Config) -> Result<Self> {
        Ok(Self {
            catalog,
            engine: TemplateEngine::new()?,
            config,
        })
    }

    fn pages(&self) -> Pages<'_> {
        Pages::new(&self.catalog, &self.config)
    }

    fn render(
        &self,
        build: impl FnOnce(&Pages<'_>, &TemplateEngine) -> Result<String>,
    ) -> std::result::Result<Html<String>, AppError> {
        build(&self.pages(), &self.engine)
            .map(Html)
            .map_err(|e| self.error_page(e))
    }

    /// Rendered 404 for missing entities, plain 500 for everything else
    fn error_page(&self, err: Error) -> AppError {
        if let Error::NotFound(what) = &err {
            let message = format!("No {} here.", what);
            let body = self
                .engine
                .render_not_found(&message)
                .unwrap_or_else(|_| message.clone());
            return AppError {
                status: StatusCode::NOT_FOUND,
                body,
            };
        }

        error!("request failed: {}", err);
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "Internal server error".to_string(),
        }
    }
}

/// A failed request, already rendered
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    body: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}

type Page = std::result::Result<Html<String>, AppError>;

/// Create the site router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route(routing::SEARCH_INDEX, get(search_handler))
        .route("/static/{asset}", get(asset_handler))
        .route("/projects/{project}/{version}/", get(version_handler))
        .route("/projects/{project}/{version}/{module}/", get(module_handler))
        .route(
            "/projects/{project}/{version}/{module}/{klass}/",
            get(klass_handler),
        )
        .route(
            "/projects/{project}/{version}/{module}/{klass}/diagram.mmd",
            get(diagram_handler),
        )
        .route("/{klass}/", get(shortcut_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home_handler(State(state): State<Arc<AppState>>) -> Page {
    state.render(|pages, engine| engine.render_home(&pages.home()?))
}

async fn version_handler(
    State(state): State<Arc<AppState>>,
    Path((project, version)): Path<(String, String)>,
) -> Page {
    state.render(|pages, engine| engine.render_version(&pages.version(&project, &version)?))
}

async fn module_handler(
    State(state): State<Arc<AppState>>,
    Path((project, version, module)): Path<(String, String, String)>,
) -> Page {
    state.render(|pages, engine| {
        engine.render_module(&pages.module(&project, &version, &module)?)
    })
}

async fn klass_handler(
    State(state): State<Arc<AppState>>,
    Path((project, version, module, klass)): Path<(String, String, String, String)>,
) -> Page {
    state.render(|pages, engine| {
        engine.render_klass(&pages.klass(&project, &version, &module, &klass)?)
    })
}

async fn diagram_handler(
    State(state): State<Arc<AppState>>,
    Path((project, version, module, klass)): Path<(String, String, String, String)>,
) -> std::result::Result<Response, AppError> {
    if !state.config.diagrams.enabled {
        return Err(state.error_page(Error::not_found("diagram")));
    }

    let diagram = state
        .catalog
        .find_klass(&project, &version, &module, &klass)
        .and_then(|k| {
            DiagramGenerator::new()
                .with_direction(state.config.diagrams.direction)
                .generate_klass_hierarchy(&state.catalog, k)
        })
        .map_err(|e| state.error_page(e))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], diagram).into_response())
}

/// Jump to the newest version of a class by bare name
async fn shortcut_handler(
    State(state): State<Arc<AppState>>,
    Path(klass): Path<String>,
) -> std::result::Result<Redirect, AppError> {
    state
        .pages()
        .shortcut_target(&klass)
        .map(|url| Redirect::temporary(&url))
        .map_err(|e| state.error_page(e))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Response, AppError> {
    let entries = state.pages().search_index().map_err(|e| state.error_page(e))?;
    Ok(Json(entries).into_response())
}

async fn asset_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> std::result::Result<Response, AppError> {
    let content = asset(&name)
        .ok_or_else(|| state.error_page(Error::not_found(format!("asset {}", name))))?;
    Ok(([(header::CONTENT_TYPE, content_type(&name))], content).into_response())
}

async fn fallback_handler(State(state): State<Arc<AppState>>) -> AppError {
    state.error_page(Error::not_found("page"))
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Start the server and run until Ctrl+C
pub async fn serve(config: Config, catalog: Catalog) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(catalog, config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Classy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutting down");
}
