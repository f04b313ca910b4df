//! Request context propagation for correlation IDs.

use std::cell::RefCell;
use uuid::Uuid;

/// Per-request context with correlation ID.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: String,
}

impl RequestContext {
    /// Creates a new request context with a generated ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Creates a new request context with an existing request ID.
    #[must_use]
    pub fn from_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static THREAD_CONTEXT: RefCell<Option<RequestContext>> = const { RefCell::new(None) };
}

/// Guard that restores the previous thread-local context on drop.
pub struct RequestContextGuard {
    previous: Option<RequestContext>,
}

impl Drop for RequestContextGuard {
    fn drop(&mut self) {
        THREAD_CONTEXT.with(|slot| {
            *slot.borrow_mut() = self.previous.take();
        });
    }
}

/// Enters a request context for the current thread.
///
/// Analyses run synchronously on one thread (a blocking-pool thread in the
/// HTTP shell), so a thread-local is enough to reach nested spans.
#[must_use]
pub fn enter_request_context(context: RequestContext) -> RequestContextGuard {
    let previous = THREAD_CONTEXT.with(|slot| slot.borrow_mut().replace(context));
    RequestContextGuard { previous }
}

/// Returns the current request ID, if set.
#[must_use]
pub fn current_request_id() -> Option<String> {
    THREAD_CONTEXT.with(|slot| slot.borrow().as_ref().map(|ctx| ctx.request_id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_context_guard_propagates_request_id() {
        let context = RequestContext::from_id("thread-test");
        let _guard = enter_request_context(context);
        assert_eq!(current_request_id().as_deref(), Some("thread-test"));
    }

    #[test]
    fn test_guard_restores_previous_context() {
        let _outer = enter_request_context(RequestContext::from_id("outer"));
        {
            let _inner = enter_request_context(RequestContext::from_id("inner"));
            assert_eq!(current_request_id().as_deref(), Some("inner"));
        }
        assert_eq!(current_request_id().as_deref(), Some("outer"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(
            RequestContext::new().request_id(),
            RequestContext::new().request_id()
        );
    }

    #[test]
    fn test_no_context_outside_guard() {
        std::thread::spawn(|| assert!(current_request_id().is_none()))
            .join()
            .unwrap();
    }
}
