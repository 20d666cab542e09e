// Life of a request:
// 1. Request comes in
// 2. Public routes (/, /login) are served directly
// 3. Protected routes go through the authorization gate:
//     - Read the session cookie
//     - Decode it against the active secret
//     - Attach the identity, or redirect to /login
// 4. Handler renders the page for that identity
//
// Login:
//  - Verify credentials (debug bypass, then host identity)
//  - Mint a session token and set it as the session cookie
//
// System components:
//  - Secret store
//  - Credential verifier
//  - Session codec
//  - Authorization gate

pub mod app;
pub mod auth;
pub mod config;
pub mod pages;

#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod testing;

pub use app::{AppState, router};
