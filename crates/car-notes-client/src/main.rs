#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    use clap::Parser;
    let args = car_notes_client::cli::Cli::parse();

    if let Err(e) = car_notes_client::tracing::init(&args) {
        eprintln!("Failed to start tracing: {e}");
    }

    let settings = car_notes_client::settings::ClientSettings::load(&args);

    let rt = car_notes_client::background_worker::create_runtime();
    let _enter = rt.enter(); // This Guard must be held to call `tokio::spawn` anywhere in the program
    car_notes_client::background_worker::start_background_worker(rt); // This is also needed to prevent the runtime from stopping

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Car Notes",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(car_notes_client::CarNotesApp::new(
                cc,
                settings.server_url,
                None,
            )))
        }),
    )
}

// When compiling to web using trunk
#[cfg(target_arch = "wasm32")]
fn main() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(car_notes_client::wasm_log_level()).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let window = web_sys::window().expect("No window found");
        let document = window.document().expect("No document found (No DOM)");
        let location = window.location();

        // The API is served from the same origin as the app
        let origin = location.origin().expect("failed to read origin");
        let server_url = format!("{origin}/api");
        let path = format!(
            "{}{}",
            location.pathname().unwrap_or_default(),
            location.search().unwrap_or_default()
        );
        let initial_route = car_notes_client::Route::from_path_or_not_found(&path);

        let canvas = document
            .get_element_by_id("the_canvas_id")
            .expect("Failed to find the_canvas_id")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("the_canvas_id was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(move |cc| {
                    Ok(Box::new(car_notes_client::CarNotesApp::new(
                        cc,
                        server_url,
                        Some(initial_route),
                    )))
                }),
            )
            .await;

        // Remove the loading text and spinner:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p> The app has crashed. See the developer console for details. </p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}
