//! One method per endpoint of the server
//!
//! Mutations return a receiver for the result. Queries are read through the
//! cache and return the current [`crate::QueryState`].

mod auth;
mod cars;
