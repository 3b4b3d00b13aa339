//! Code shared between the clients and the test backend

#![warn(unused_crate_dependencies)]

pub mod car;
pub mod const_config;
pub mod errors;
pub mod id;
pub mod list_query;
mod macros;
pub mod paginated;
pub mod req_args;
pub mod user;

#[cfg(not(target_arch = "wasm32"))]
pub mod telemetry;
