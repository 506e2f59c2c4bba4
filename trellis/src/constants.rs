/// XML Schema datatype namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Page size for sending bindings to a service when no `slice` hook overrides it.
pub const SLICE_DEFAULT: usize = 20;

/// Maximum nodes visited from one origin during path repetition.
pub const DEFAULT_MAX_PATH_VISITED: usize = 10_000;

/// Maximum depth of queries started from inside hook handlers.
pub const DEFAULT_MAX_NESTING: usize = 32;
