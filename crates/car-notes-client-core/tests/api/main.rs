#![cfg(not(target_arch = "wasm32"))]

mod auth;
mod cars;
mod helpers;
mod session_guard;
