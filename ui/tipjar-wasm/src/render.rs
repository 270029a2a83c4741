//! Rendering state into the page.
//!
//! User-supplied text only ever goes through `textContent`.

use tj_core::{DisplayMode, TipJarConfig, TipJarState};
use tj_types::{EtherAmount, Memo};
use wasm_bindgen::prelude::*;

use crate::dom::{self, Elements};

pub fn title_text(recipient: &str) -> String {
    format!("Buy {recipient} a Coffee!")
}

pub fn button_label(amount: EtherAmount) -> String {
    format!("Send 1 coffee for {amount} ETH")
}

pub fn byline(memo: &Memo) -> String {
    let when = memo
        .sent_at()
        .map(|at| at.format("%a %b %d %Y %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| memo.timestamp.to_string());
    format!("From: {} at {}", memo.name, when)
}

/// Text that depends only on configuration.
pub fn static_text(els: &Elements, config: &TipJarConfig) {
    let title = title_text(&config.recipient);
    dom::set_text(&els.title, &title);
    if let Ok(document) = dom::document() {
        document.set_title(&title);
    }
    dom::set_text(&els.message_label, &format!("Send {} a message", config.recipient));
    dom::set_text(&els.submit_btn, &button_label(config.tip_amount));
}

pub fn render(els: &Elements, state: &TipJarState) {
    if let Err(err) = try_render(els, state) {
        tracing::error!(error = ?err, "could not render memos");
    }
}

fn try_render(els: &Elements, state: &TipJarState) -> Result<(), JsValue> {
    let connected = state.mode() == DisplayMode::Connected;
    els.connect_btn.set_hidden(connected);
    els.tip_form.set_hidden(!connected);
    els.memos_heading.set_hidden(!connected);

    dom::clear(&els.memo_list);
    if !connected {
        return Ok(());
    }
    for memo in state.memos() {
        let card = memo_card(memo)?;
        els.memo_list.append_child(&card)?;
    }
    Ok(())
}

fn memo_card(memo: &Memo) -> Result<web_sys::Element, JsValue> {
    let card = dom::create_element("div")?;
    dom::add_class(&card, "memo");

    let message = dom::create_element("p")?;
    let bold = dom::create_element("b")?;
    dom::set_text(&bold, &memo.message);
    message.append_child(&bold)?;

    let from = dom::create_element("p")?;
    dom::set_text(&from, &byline(memo));

    card.append_child(&message)?;
    card.append_child(&from)?;
    Ok(card)
}
