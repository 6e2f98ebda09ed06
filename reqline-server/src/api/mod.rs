//! HTTP API handlers for reqline-server

pub mod auth;
pub mod bookings;
pub mod health;
pub mod requests;
pub mod search;
pub mod sse;
pub mod tips;

pub use auth::{auth_middleware, login, logout};
pub use bookings::submit_booking;
pub use health::health_routes;
pub use requests::{archive_request, list_requests, submit_request};
pub use search::search_catalog;
pub use sse::event_stream;
pub use tips::{create_tip_session, payment_return};
