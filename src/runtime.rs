// Runtime capability detection
// The original web client guards storage and navigation behind environment
// checks; here those capabilities are declared up front by the embedder.

/// Capabilities of the environment hosting the session pipeline.
///
/// The interceptor and the session controller consult this instead of
/// probing the environment themselves, so both can run against a fake
/// runtime in tests.
pub trait RuntimeContext: Send + Sync {
    /// Whether credentials can be persisted across process restarts.
    /// When false the whole auth interceptor is a pass-through.
    fn has_persistent_storage(&self) -> bool;

    /// Whether the host can move the user to the login entry point
    fn has_navigation(&self) -> bool;

    /// Send the user back to the login entry point after an
    /// unrecoverable refresh failure. Only called when
    /// `has_navigation()` is true.
    fn redirect_to_login(&self);
}

/// Default runtime: durable storage, no navigation surface
pub struct NativeRuntime;

impl RuntimeContext for NativeRuntime {
    fn has_persistent_storage(&self) -> bool {
        true
    }

    fn has_navigation(&self) -> bool {
        false
    }

    fn redirect_to_login(&self) {}
}

/// Server-rendered execution: no storage, no navigation.
/// Requests go out unmodified and 401s are never recovered.
pub struct ServerRuntime;

impl RuntimeContext for ServerRuntime {
    fn has_persistent_storage(&self) -> bool {
        false
    }

    fn has_navigation(&self) -> bool {
        false
    }

    fn redirect_to_login(&self) {}
}
