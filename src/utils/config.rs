//! Configuration and constants for detection and reporting.

/// Current structured report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Printed once per compressed frame
pub const COMPRESSION_MARK: char = '.';

/// Leading indentation of a frame line
pub const FRAME_INDENT: &str = "  ";

/// Leading indentation of a template source line
pub const SOURCE_INDENT: &str = "    ";

/// Source used for frames whose symbols could not be resolved
pub const UNKNOWN_SOURCE: &str = "<unknown>";

// ANSI escape sequences used for banner lines
pub const ANSI_YELLOW: &str = "\x1b[33m";
pub const ANSI_RESET: &str = "\x1b[0m";

/// Path prefix of this crate's own functions, which sit between user code and
/// every capture
pub const OWN_FUNCTION_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

// Path fragments that mark a frame as third-party code
// (crates.io and git checkouts, the toolchain's std sources, vendored trees)
pub const DEFAULT_THIRD_PARTY_MARKERS: &[&str] = &[
    "/.cargo/registry/",
    "/.cargo/git/",
    "/rustc/",
    "/vendor/",
];
