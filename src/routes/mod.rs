//! Application routes, their guards and the dashboard menu

pub mod guard;
pub mod navigator;

use serde::Serialize;

use crate::auth::models::Role;
pub use guard::{evaluate, Denial, GuardKind, GuardOutcome, GuardState, RoleSnapshot, RouteGuard};
pub use navigator::{Location, NavigateOptions, Navigator, HOME_ROUTE, LOGIN_ROUTE};

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    /// Path pattern; `:name` segments match any single segment
    pub pattern: &'static str,
    pub title: &'static str,
    pub guard: GuardKind,
}

impl Route {
    fn new(pattern: &'static str, title: &'static str, guard: GuardKind) -> Self {
        Self { pattern, title, guard }
    }

    pub fn matches(&self, path: &str) -> bool {
        let pattern = split_segments(self.pattern);
        let path = split_segments(path);
        pattern.len() == path.len()
            && pattern
                .iter()
                .zip(&path)
                .all(|(p, s)| p.starts_with(':') || p == s)
    }
}

/// Path without query string or fragment, split on `/`
fn split_segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn standard() -> Self {
        use GuardKind::*;

        Self {
            routes: vec![
                Route::new("/", "Home", Public),
                Route::new("/login", "Login", Public),
                Route::new("/register", "Register", Public),
                Route::new("/search", "Search Donors", Public),
                Route::new("/blogs", "Blogs", Public),
                Route::new("/donation-requests", "Donation Requests", Public),
                Route::new("/donation-requests/:id", "Donation Request Details", Authenticated),
                Route::new("/funding", "Funding", Authenticated),
                Route::new("/dashboard", "Dashboard", Authenticated),
                Route::new("/dashboard/profile", "Profile", Authenticated),
                Route::new("/dashboard/my-donation-requests", "My Donation Requests", Authenticated),
                Route::new("/dashboard/create-donation-request", "Create Donation Request", Authenticated),
                Route::new("/dashboard/all-users", "All Users", Admin),
                Route::new("/dashboard/all-blood-donation-request", "All Blood Donation Requests", Admin),
                Route::new("/dashboard/content-management", "Content Management", Admin),
                Route::new("/dashboard/volunteer/requests", "Volunteer Requests", Volunteer),
                Route::new("/dashboard/volunteer/content", "Volunteer Content", Volunteer),
            ],
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// First route matching `path`
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
}

/// Dashboard links shown to a user with `role`
pub fn dashboard_menu(role: Option<Role>) -> Vec<MenuItem> {
    let item = |label, path| MenuItem { label, path };

    let mut menu = vec![item("Dashboard", "/dashboard"), item("Profile", "/dashboard/profile")];
    match role {
        Some(Role::Admin) => menu.extend([
            item("All Users", "/dashboard/all-users"),
            item("All Blood Donation Requests", "/dashboard/all-blood-donation-request"),
            item("Content Management", "/dashboard/content-management"),
        ]),
        Some(Role::Volunteer) => menu.extend([
            item("All Blood Donation Requests", "/dashboard/volunteer/requests"),
            item("Content Management", "/dashboard/volunteer/content"),
        ]),
        Some(Role::Donor) => menu.extend([
            item("My Donation Requests", "/dashboard/my-donation-requests"),
            item("Create Donation Request", "/dashboard/create-donation-request"),
        ]),
        None => {}
    }
    menu
}
