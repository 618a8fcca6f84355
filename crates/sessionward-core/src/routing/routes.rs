//! Route table of the game front end.

use super::table::{RouteDescriptor, RouteTable, RouteTableError};

/// Landing page, and the destination of every denied navigation
pub const INTRODUCTION: &str = "/introduction";

pub fn application_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/").public().redirect_to(INTRODUCTION),
        RouteDescriptor::new(INTRODUCTION).public(),
        RouteDescriptor::new("/boardAI"),
        RouteDescriptor::new("/boardFriend"),
        RouteDescriptor::new("/main").with_children(vec![
            RouteDescriptor::new("").redirect_to("/main/game"),
            RouteDescriptor::new("game"),
        ]),
        // Not-found page
        RouteDescriptor::catch_all().public(),
    ]
}

/// The application table with `fallback` as the denial destination
pub fn application_table(fallback: &str) -> Result<RouteTable, RouteTableError> {
    RouteTable::new(application_routes(), fallback)
}
