//! Capability declarations.
//!
//! The core's only side-effect channels: HTTP requests executed by the shell
//! and render notifications. Render is Crux's built-in capability; HTTP is
//! our own, shaped around the opaque request/response pair the shells already
//! speak.

mod http;

pub use self::http::{
    Http, HttpError, HttpMethod, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    RequestBuilder, DEFAULT_TIMEOUT_MS, MAX_REQUEST_BODY_BYTES,
};
pub use crux_core::render::Render;

use crate::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
