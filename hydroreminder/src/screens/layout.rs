//! Root layout: picks the screen group from the session state

use crate::services::auth::{AuthState, IdentityProvider};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Provider still loading, show a spinner
    Loading,
    Authenticated,
    Public,
}

pub fn route_for(state: AuthState) -> Route {
    if !state.is_loaded {
        Route::Loading
    } else if state.is_signed_in {
        Route::Authenticated
    } else {
        Route::Public
    }
}

/// Follows the identity provider and reports route changes
pub struct Layout {
    state: watch::Receiver<AuthState>,
    /// Route last handed out by `new` or `next_route`
    reported: Route,
}

impl Layout {
    pub fn new(identity: &dyn IdentityProvider) -> Self {
        let mut state = identity.state();
        let reported = route_for(*state.borrow_and_update());
        Self { state, reported }
    }

    pub fn current(&self) -> Route {
        route_for(*self.state.borrow())
    }

    /// Wait until the route differs from the last one reported.
    ///
    /// A change published before the call is returned right away.
    /// Returns `None` once the provider is gone.
    pub async fn next_route(&mut self) -> Option<Route> {
        loop {
            let route = route_for(*self.state.borrow_and_update());
            if route != self.reported {
                tracing::debug!("Routing to {:?}", route);
                self.reported = route;
                return Some(route);
            }
            self.state.changed().await.ok()?;
        }
    }
}
