//! Scoped detection sessions.
//!
//! A session:
//! 1. Installs a fresh detector on a connection
//! 2. Lets the unit of work run
//! 3. Uninstalls the detector, even on early return or panic
//! 4. Prints the report
//! 5. Escalates in crash mode if anything was duplicated

use super::options::DetectOptions;
use crate::capture::{NativeStackSource, StackSource};
use crate::db::{Backend, Connection, ExecuteWrapper, WrapperHandle};
use crate::detector::DuplicateDetector;
use crate::render::StackRenderer;
use crate::utils::error::{DetectionError, SessionError};
use log::{debug, info, warn};
use std::io::{self, Write};
use std::rc::Rc;

/// An installed detector; reports when finished or dropped
///
/// Dropping without `finish` (early return, panic) still uninstalls and
/// prints the report, but never escalates.
pub struct DuplicateQueryGuard<'c> {
    handle: Option<WrapperHandle<'c>>,
    detector: Rc<DuplicateDetector>,
    crash: bool,
    color: bool,
    output: Option<Box<dyn Write>>,
}

impl<'c> DuplicateQueryGuard<'c> {
    /// Install a new detector on `connection`
    ///
    /// **Public** - main entry point for guard-style sessions
    pub fn install<B: Backend>(connection: &'c Connection<B>, options: DetectOptions) -> Self {
        let DetectOptions {
            crash,
            color,
            render,
            output,
            source,
        } = options;

        let source: Box<dyn StackSource> = source.unwrap_or_else(|| Box::new(NativeStackSource::new()));
        let detector = Rc::new(
            DuplicateDetector::with_boxed_source(source).with_renderer(StackRenderer::new(render)),
        );

        let wrapper: Rc<dyn ExecuteWrapper> = detector.clone();
        let handle = connection.execute_wrapper(wrapper);
        debug!("Duplicate query detection started on '{}'", connection.alias());

        Self {
            handle: Some(handle),
            detector,
            crash,
            color,
            output,
        }
    }

    /// The live detector, for inspection during the session
    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    /// End the session: uninstall, report, escalate if configured
    ///
    /// # Errors
    /// * `DetectionError::DuplicatesDetected` - crash mode and duplicates were found
    pub fn finish(mut self) -> Result<(), DetectionError> {
        self.close();

        if !self.crash {
            return Ok(());
        }
        match self.detector.escalation() {
            Some(error) => {
                warn!("{}", error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Uninstall and report, once
    fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        drop(handle);

        let color = self.color;
        let result = match self.output.as_mut() {
            Some(output) => self.detector.print_duplicates(output.as_mut(), color),
            None => self.detector.print_duplicates(&mut io::stdout().lock(), color),
        };
        if let Err(e) = result {
            warn!("Failed to print duplicate query report: {}", e);
        }

        if self.detector.has_duplicates() {
            info!(
                "Duplicate query detection finished: {} duplicated queries ({} executions)",
                self.detector.duplicate_count(),
                self.detector.total_executions()
            );
        } else {
            debug!("Duplicate query detection finished: no duplicates");
        }
    }
}

impl Drop for DuplicateQueryGuard<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Run `body` as one unit of work under duplicate detection
///
/// **Public** - closure-style entry point
///
/// # Arguments
/// * `connection` - Connection whose queries are observed
/// * `options` - Session options (crash mode, output, rendering)
/// * `body` - The unit of work; receives the live detector
///
/// # Returns
/// The body's value, unless the body failed or crash mode escalated
///
/// # Errors
/// * `SessionError::Body` - the body's own error (the report is still printed)
/// * `SessionError::Detection` - crash mode and duplicates were found
///
/// # Example
/// ```ignore
/// let rows = detect_duplicate_queries(&connection, DetectOptions::new().with_crash(true), |_| {
///     load_orders(&connection)
/// })?;
/// ```
pub fn detect_duplicate_queries<B, T, E, F>(
    connection: &Connection<B>,
    options: DetectOptions,
    body: F,
) -> Result<T, SessionError<E>>
where
    B: Backend,
    F: FnOnce(&DuplicateDetector) -> Result<T, E>,
{
    let guard = DuplicateQueryGuard::install(connection, options);
    let outcome = body(guard.detector());
    let escalation = guard.finish();

    let value = outcome.map_err(SessionError::Body)?;
    escalation?;
    Ok(value)
}
