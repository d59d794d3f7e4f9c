/// Request handlers, organized by concern
///
/// - `auth`: register / login / logout flows
/// - `pages`: static page delivery
/// - `health`: health check endpoint

pub mod auth;
pub mod health;
pub mod pages;
