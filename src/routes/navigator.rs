//! In-memory navigation history
//!
//! Stands in for the browser router: guards and the authenticated client
//! navigate through it, and views observe the current location.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    /// Where the user was headed before being redirected here
    pub from: Option<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Replace the current entry instead of pushing a new one
    pub replace: bool,
    pub from: Option<String>,
}

impl NavigateOptions {
    pub fn redirect_from(path: impl Into<String>) -> Self {
        Self {
            replace: true,
            from: Some(path.into()),
        }
    }
}

struct History {
    entries: Vec<Location>,
    navigations: usize,
}

#[derive(Clone)]
pub struct Navigator {
    history: Arc<Mutex<History>>,
    current: Arc<watch::Sender<Location>>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::starting_at(HOME_ROUTE)
    }

    pub fn starting_at(path: &str) -> Self {
        let start = Location::new(path);
        let (tx, _) = watch::channel(start.clone());
        Self {
            history: Arc::new(Mutex::new(History {
                entries: vec![start],
                navigations: 0,
            })),
            current: Arc::new(tx),
        }
    }

    pub fn navigate(&self, path: &str, options: NavigateOptions) {
        let location = Location {
            path: path.to_string(),
            from: options.from,
        };

        {
            let mut history = self.history.lock();
            if options.replace {
                history.entries.pop();
            }
            history.entries.push(location.clone());
            history.navigations += 1;
        }

        debug!(replace = options.replace, "Navigate to {}", path);
        self.current.send_replace(location);
    }

    /// Go back one entry; returns false at the start of history
    pub fn back(&self) -> bool {
        let previous = {
            let mut history = self.history.lock();
            if history.entries.len() < 2 {
                return false;
            }
            history.entries.pop();
            history.navigations += 1;
            history.entries.last().cloned()
        };
        if let Some(location) = previous {
            self.current.send_replace(location);
        }
        true
    }

    pub fn location(&self) -> Location {
        self.current.borrow().clone()
    }

    pub fn history(&self) -> Vec<Location> {
        self.history.lock().entries.clone()
    }

    /// Total navigations performed, including replacements
    pub fn navigation_count(&self) -> usize {
        self.history.lock().navigations
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.current.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
