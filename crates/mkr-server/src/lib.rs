//! REST gateway for the MKR timetable service.
//!
//! This crate exposes the scraping client as a plain JSON HTTP API: the
//! selectable catalog (structures, chairs, faculties, courses, groups,
//! teachers) and the group/teacher schedules behind it. Handlers stay thin;
//! session handling, caching, and backend quirks all live in the client.
//!
//! # Example
//!
//! ```ignore
//! use mkr_api::MkrApi;
//! use mkr_server::{Server, ServerConfig};
//!
//! let api = MkrApi::builder()
//!     .base_url("https://vnz.mkr.org.ua")
//!     .build()?;
//! let config = ServerConfig::default()
//!     .with_bind_address("127.0.0.1:3000".parse()?);
//!
//! let server = Server::new(api, config);
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use routes::ScheduleWindow;
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use mkr_api::MkrApi;

/// The MKR gateway HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over a timetable client.
    pub fn new(api: MkrApi, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(api, config),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::get;

        Router::new()
            .merge(routes::health_routes())
            .route("/structures", get(routes::list_structures_handler))
            .route(
                "/structures/{structureId}/chairs",
                get(routes::list_chairs_handler),
            )
            .route(
                "/structures/{structureId}/chairs/{chairId}/teachers",
                get(routes::list_teachers_handler),
            )
            .route(
                "/structures/{structureId}/chairs/{chairId}/teachers/{teacherId}/schedule",
                get(routes::teacher_schedule_handler),
            )
            .route(
                "/structures/{structureId}/faculties",
                get(routes::list_faculties_handler),
            )
            .route(
                "/structures/{structureId}/faculties/{facultyId}/courses",
                get(routes::list_courses_handler),
            )
            .route(
                "/structures/{structureId}/faculties/{facultyId}/groups",
                get(routes::list_faculty_groups_handler),
            )
            .route(
                "/structures/{structureId}/faculties/{facultyId}/courses/{course}/groups",
                get(routes::list_groups_handler),
            )
            .route(
                "/structures/{structureId}/faculties/{facultyId}/courses/{course}/groups/{groupId}/schedule",
                get(routes::group_schedule_handler),
            )
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
