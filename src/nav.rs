//! Navigation seam between the session engine and the app shell.
//!
//! The engine never owns routing; it hands a [`Route`] to whatever
//! [`Navigator`] the shell registered (screen router, web view, or a plain
//! log in the console shell) and moves on.

use std::fmt;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Destinations the engine can ask the shell to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Post-session results screen for one finished session.
    SessionResults { session_id: String },
    /// Subscription / upgrade screen.
    Subscribe,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::SessionResults { session_id } => {
                write!(f, "/session-result?session={session_id}")
            }
            Route::Subscribe => write!(f, "/subscribe"),
        }
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Fire-and-forget navigation callback implemented by the app shell.
///
/// Implementors must be `Send + Sync`; the engine calls `go` from spawned
/// tasks (deferred completion redirects) as well as inline.
pub trait Navigator: Send + Sync {
    fn go(&self, route: Route);
}

/// Shell stand-in that only logs the requested route.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go(&self, route: Route) {
        log::info!("navigate: {route}");
    }
}

// ---------------------------------------------------------------------------
// RecordingNavigator  (test double)
// ---------------------------------------------------------------------------

/// Records every requested route so tests can assert exactly one (or zero)
/// navigations happened.
#[cfg(test)]
pub struct RecordingNavigator {
    routes: std::sync::Mutex<Vec<Route>>,
}

#[cfg(test)]
impl RecordingNavigator {
    pub fn new() -> Self {
        Self {
            routes: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Navigator for RecordingNavigator {
    fn go(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_render_as_paths() {
        let results = Route::SessionResults {
            session_id: "sess-3".into(),
        };
        assert_eq!(results.to_string(), "/session-result?session=sess-3");
        assert_eq!(Route::Subscribe.to_string(), "/subscribe");
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let nav = RecordingNavigator::new();
        nav.go(Route::Subscribe);
        nav.go(Route::SessionResults {
            session_id: "sess-1".into(),
        });

        let routes = nav.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0], Route::Subscribe);
    }
}
