//! Stores the functionality to talk to the car notes server that is shared
//! between different clients
//! NB: The assumption is made that the async runtime has already been started
//! before any functions from this library are called

#![warn(unused_crate_dependencies)]

#[cfg(target_arch = "wasm32")]
mod suppress_wasm_warnings {
    // Needed because we need to enable js feature on this crate
    use getrandom as _;
}


mod cache;
mod client;
mod csrf;
mod session;
mod session_guard;

pub use cache::{CacheTag, QueryKey, QueryState, TagId, TagType};
pub use client::{Client, UiCallBack, NO_ARGS};
pub use session_guard::{GuardStatus, SessionGuard};
