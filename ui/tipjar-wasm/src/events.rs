//! Event binding.
//!
//! Async handlers run on the page's event loop via `spawn_local`; the
//! controller logs their failures, so handlers only re-render.

use std::rc::Rc;
use tj_core::TipJar;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::EventTarget;

use crate::dom::Elements;
use crate::provider::InjectedProvider;
use crate::render;

pub type App = Rc<TipJar<InjectedProvider>>;

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

/// Attach an async click handler taking `(&Elements, &App)`.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $app:expr, $handler:path) => {{
        let els = $els.clone();
        let app = $app.clone();
        listen(&$el, "click", move |_| {
            let els = els.clone();
            let app = app.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els, &app).await;
            });
        })?;
    }};
}

pub fn bind_events(els: &Elements, app: &App) -> Result<(), JsValue> {
    // ── Wallet ──
    on_click_async!(els.connect_btn, els, app, on_connect);

    // ── Form ──
    {
        let els2 = els.clone();
        let app2 = app.clone();
        listen(&els.name_input, "input", move |_| {
            app2.on_name_changed(els2.name_input.value());
        })?;
    }
    {
        let els2 = els.clone();
        let app2 = app.clone();
        listen(&els.message_input, "input", move |_| {
            app2.on_message_changed(els2.message_input.value());
        })?;
    }
    on_click_async!(els.submit_btn, els, app, on_submit);

    // ── Lifecycle ──
    {
        let app2 = app.clone();
        listen(&crate::dom::window()?, "pagehide", move |_| {
            app2.unmount();
        })?;
    }
    Ok(())
}

async fn on_connect(els: &Elements, app: &App) {
    if app.connect().await.is_ok() {
        render::render(els, &app.state());
    }
}

async fn on_submit(els: &Elements, app: &App) {
    if app.submit().await.is_ok() {
        els.clear_inputs();
        render::render(els, &app.state());
    }
}
