//! Native only. `reqwest-cross` spawns every request onto the tokio runtime
//! entered by `main`, this keeps that runtime driven for the life of the
//! process.

#[cfg(not(target_arch = "wasm32"))]
pub fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .thread_name("car-notes-io")
        .enable_all()
        .build()
        .expect("Unable to create Runtime")
}

#[cfg(not(target_arch = "wasm32"))]
pub fn start_background_worker(rt: tokio::runtime::Runtime) {
    std::thread::Builder::new()
        .name("car-notes-requests".to_string())
        .spawn(move || {
            tracing::info!("Request runtime started");
            rt.block_on(std::future::pending::<()>());
        })
        .expect("Unable to start background worker");
}
