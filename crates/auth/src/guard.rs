//! Screen access policy.
//!
//! Pure decision function over the session state; navigation itself is the
//! caller's job.

use serde::Serialize;

use crate::Session;

/// Screens of the terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Root,
    Dashboard,
    Pos,
    Transactions,
    Products,
    Unknown,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "" => Route::Root,
            "/login" => Route::Login,
            "/dashboard" => Route::Dashboard,
            "/pos" => Route::Pos,
            "/transactions" => Route::Transactions,
            "/products" => Route::Products,
            _ => Route::Unknown,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Root => "/",
            Route::Dashboard => "/dashboard",
            Route::Pos => "/pos",
            Route::Transactions => "/transactions",
            Route::Products => "/products",
            Route::Unknown => "*",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Pos | Route::Transactions | Route::Products
        )
    }

    pub fn admin_only(&self) -> bool {
        matches!(self, Route::Products)
    }

    /// Screens offered in the navigation for this role.
    pub fn navigation(is_admin: bool) -> Vec<Route> {
        let mut routes = vec![Route::Dashboard, Route::Pos, Route::Transactions];
        if is_admin {
            routes.push(Route::Products);
        }
        routes
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    /// The initial session check is still running.
    Loading,
    RedirectToLogin,
    RedirectToDashboard,
}

pub fn guard(route: Route, session: &Session) -> RouteDecision {
    match route {
        Route::Login => RouteDecision::Allow,
        Route::Root | Route::Unknown => RouteDecision::RedirectToDashboard,
        _ if session.is_loading() => RouteDecision::Loading,
        _ if !session.is_authenticated() => RouteDecision::RedirectToLogin,
        r if r.admin_only() && !session.is_admin() => RouteDecision::RedirectToDashboard,
        _ => RouteDecision::Allow,
    }
}
