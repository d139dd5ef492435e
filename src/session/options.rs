use crate::capture::StackSource;
use crate::render::RenderOptions;
use std::fmt;
use std::io::Write;

/// Options for one detection session
pub struct DetectOptions {
    /// Fail the session when duplicates were found
    pub crash: bool,

    /// Wrap banner lines in ANSI colour codes
    pub color: bool,

    pub render: RenderOptions,

    /// Report destination; stdout when `None`
    pub(crate) output: Option<Box<dyn Write>>,

    /// Stack source; the native stack when `None`
    pub(crate) source: Option<Box<dyn StackSource>>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            crash: false,
            color: true,
            render: RenderOptions::default(),
            output: None,
            source: None,
        }
    }
}

impl fmt::Debug for DetectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectOptions")
            .field("crash", &self.crash)
            .field("color", &self.color)
            .field("render", &self.render)
            .field("output", &self.output.as_ref().map(|_| "<custom>"))
            .field("source", &self.source.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl DetectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crash(mut self, crash: bool) -> Self {
        self.crash = crash;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.render.compress = compress;
        self
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn with_stack_source(mut self, source: impl StackSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}
