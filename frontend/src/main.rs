use leptos::prelude::*;
use sensordash_frontend::App;
use sensordash_frontend::config::AppConfig;

// Use lol_alloc as the global allocator for smaller WASM size
#[cfg(target_arch = "wasm32")]
use lol_alloc::{AssumeSingleThreaded, FreeListAllocator};

#[cfg(target_arch = "wasm32")]
#[global_allocator]
static ALLOCATOR: AssumeSingleThreaded<FreeListAllocator> =
    unsafe { AssumeSingleThreaded::new(FreeListAllocator::new()) };

pub fn main() {
    console_error_panic_hook::set_once();

    let config = AppConfig::from_env();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace));
    log::set_max_level(config.log_level);
    log::info!("[App] starting, api base url: {}", config.api_base_url);

    mount_to_body(move || {
        provide_context(config);
        view! { <App /> }
    });
}
