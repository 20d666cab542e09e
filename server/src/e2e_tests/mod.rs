//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router
//! (gate, handlers, cookies) with in-memory requests.

#![cfg(test)]

mod helpers;

mod test_protected_routes;
mod test_restart;
