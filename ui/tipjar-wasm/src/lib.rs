//! Tip jar page: Rust + WASM front-end for the BuyMeACoffee contract.
//!
//! Wallet, ledger and feed logic live in `tj-core`; this crate binds it to
//! the DOM and to the injected browser wallet.

pub mod config;
pub mod dom;
pub mod logging;
pub mod render;

#[cfg(target_arch = "wasm32")]
pub mod events;
#[cfg(target_arch = "wasm32")]
pub mod provider;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// WASM entry point, run when the module is instantiated.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init();

    init().await
}

#[cfg(target_arch = "wasm32")]
async fn init() -> Result<(), JsValue> {
    use std::rc::Rc;
    use std::sync::Arc;
    use tj_core::TipJar;

    let els = dom::Elements::bind()?;
    let config = config::load();
    render::static_text(&els, &config);

    let wallet = provider::InjectedProvider::detect().map(Arc::new);
    if wallet.is_none() {
        tracing::warn!("no injected wallet found");
    }
    let app: events::App = Rc::new(
        TipJar::new(wallet, config, Arc::new(provider::GlooSleeper))
            .map_err(|err| JsValue::from_str(&err.to_string()))?,
    );

    events::bind_events(&els, &app)?;
    render::render(&els, &app.state());

    let listener_els = els.clone();
    let (_report, driver) = app
        .mount(Box::new(move |state: &tj_core::TipJarState| {
            render::render(&listener_els, state)
        }))
        .await;
    render::render(&els, &app.state());

    if let Some(driver) = driver {
        wasm_bindgen_futures::spawn_local(driver.run());
    }
    Ok(())
}
