//! DOM element bindings.
//!
//! All fields are resolved once at startup by `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

// ── Helpers ──

pub fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))
}

pub fn by_id(id: &str) -> Option<Element> {
    document().ok()?.get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document()?.create_element(tag)
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

/// Remove every child node.
pub fn clear(el: &Element) {
    el.set_text_content(None);
}

// ── Elements struct ──

/// Every element the page touches. Clone-friendly; the handles are JS references.
#[derive(Clone)]
pub struct Elements {
    pub title: Element,
    pub connect_btn: HtmlElement,

    // Tip form
    pub tip_form: HtmlElement,
    pub message_label: Element,
    pub name_input: HtmlInputElement,
    pub message_input: HtmlTextAreaElement,
    pub submit_btn: HtmlElement,

    // Memos
    pub memos_heading: HtmlElement,
    pub memo_list: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_typed {
    ($ty:ty, $id:expr) => {
        by_id_typed::<$ty>($id).ok_or_else(|| {
            JsValue::from_str(&format!("missing {} #{}", stringify!($ty), $id))
        })?
    };
}

impl Elements {
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            title: get_el!("title"),
            connect_btn: get_typed!(HtmlElement, "connectBtn"),

            tip_form: get_typed!(HtmlElement, "tipForm"),
            message_label: get_el!("messageLabel"),
            name_input: get_typed!(HtmlInputElement, "name"),
            message_input: get_typed!(HtmlTextAreaElement, "message"),
            submit_btn: get_typed!(HtmlElement, "submitBtn"),

            memos_heading: get_typed!(HtmlElement, "memosHeading"),
            memo_list: get_el!("memoList"),
        })
    }

    pub fn clear_inputs(&self) {
        self.name_input.set_value("");
        self.message_input.set_value("");
    }
}
