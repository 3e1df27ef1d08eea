//! Request-scoped context passed to every provider call
//!
//! The context carries the tracing span of the operation so logs emitted by
//! resources, data sources and API clients are attributed to the resource
//! type and the lifecycle step that produced them.

use tracing::Span;

/// Context carries request-scoped values across async boundaries
/// Pass this as first parameter to ALL async trait methods
#[derive(Clone, Debug)]
pub struct Context {
    span: Span,
}

impl Context {
    pub fn new() -> Self {
        Self { span: Span::none() }
    }

    /// Context for one lifecycle step of one resource or data source type
    pub fn for_operation(type_name: &str, operation: &'static str) -> Self {
        Self {
            span: tracing::info_span!("tfplug", type_name = %type_name, operation),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
