//! Instrumentation hooks bracketing each request.

/// Structured context handed to the profiler on both sides of a request.
#[derive(Debug, Clone, Default)]
pub struct ProfileContext {
    /// Name of the calling method, e.g. `Connection::get`.
    pub method: &'static str,
    /// The causing error, populated on the `end` side of a failed request.
    pub error: Option<String>,
}

/// Receiver for `begin`/`end` events around every request.
///
/// The token is stable across a begin/end pair so spans can be matched
/// up. The connection never interprets profiler output; implementations
/// are free to forward to any APM or timing facility.
pub trait Profiler: Send + Sync {
    /// A request is about to be executed.
    fn begin(&self, token: &str, ctx: &ProfileContext);
    /// The request finished (successfully or not).
    fn end(&self, token: &str, ctx: &ProfileContext);
}

/// Profiler that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    fn begin(&self, _token: &str, _ctx: &ProfileContext) {}
    fn end(&self, _token: &str, _ctx: &ProfileContext) {}
}
