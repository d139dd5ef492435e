//! Per-request detection for request/response handlers.

use super::controller::detect_duplicate_queries;
use super::options::DetectOptions;
use crate::db::{Backend, Connection};
use crate::utils::error::SessionError;
use anyhow::Result;
use std::rc::Rc;

/// Something that turns a request into a response
pub trait Handler<Req> {
    type Response;

    fn handle(&self, request: Req) -> Result<Self::Response>;
}

impl<Req, Resp, F> Handler<Req> for F
where
    F: Fn(Req) -> Result<Resp>,
{
    type Response = Resp;

    fn handle(&self, request: Req) -> Result<Resp> {
        self(request)
    }
}

/// Runs every request through its own detection session
pub struct DetectDuplicateQueriesMiddleware<B, H> {
    connection: Rc<Connection<B>>,
    handler: H,
    options: Box<dyn Fn() -> DetectOptions>,
}

impl<B: Backend, H> DetectDuplicateQueriesMiddleware<B, H> {
    pub fn new(connection: Rc<Connection<B>>, handler: H) -> Self {
        Self {
            connection,
            handler,
            options: Box::new(DetectOptions::default),
        }
    }

    /// Build per-request options with `factory` (outputs are not shareable)
    pub fn with_options(mut self, factory: impl Fn() -> DetectOptions + 'static) -> Self {
        self.options = Box::new(factory);
        self
    }

    /// Handle one request
    ///
    /// # Errors
    /// * The handler's own error
    /// * `DetectionError::DuplicatesDetected` - crash mode and duplicates were found
    pub fn call<Req>(&self, request: Req) -> Result<H::Response>
    where
        H: Handler<Req>,
    {
        detect_duplicate_queries(self.connection.as_ref(), (self.options)(), |_| {
            self.handler.handle(request)
        })
        .map_err(|err| match err {
            SessionError::Body(e) => e,
            SessionError::Detection(e) => e.into(),
        })
    }
}
