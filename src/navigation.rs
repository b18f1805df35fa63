//! Route table and active-link highlighting.

use serde::Serialize;
use tracing::instrument;

/// A link in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Visible text.
    pub label: &'static str,
    /// Target path.
    pub href: &'static str,
}

/// Every page route the application serves.
pub const ROUTES: [&str; 8] = [
    "/",
    "/auth",
    "/auth/callback",
    "/profile",
    "/profile/edit",
    "/ranking",
    "/audio-test",
    "/ui-demo",
];

/// Links shown in the navigation bar, in order.
pub static NAV_ITEMS: [NavItem; 6] = [
    NavItem {
        label: "Play",
        href: "/",
    },
    NavItem {
        label: "Ranking",
        href: "/ranking",
    },
    NavItem {
        label: "Profile",
        href: "/profile",
    },
    NavItem {
        label: "Audio Test",
        href: "/audio-test",
    },
    NavItem {
        label: "UI Demo",
        href: "/ui-demo",
    },
    NavItem {
        label: "Sign In",
        href: "/auth",
    },
];

/// Whether `item` is highlighted on `path`. Only an exact match counts, so
/// `/profile` is not active on `/profile/edit`.
#[instrument]
pub fn is_active(item: &NavItem, path: &str) -> bool {
    item.href == path
}

/// The navigation entry highlighted on `path`, if any.
#[instrument]
pub fn active_item(path: &str) -> Option<&'static NavItem> {
    NAV_ITEMS.iter().find(|item| is_active(item, path))
}

/// Whether `path` is a known page route.
pub fn is_known_route(path: &str) -> bool {
    ROUTES.contains(&path)
}
