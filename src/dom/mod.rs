use futures::future::LocalBoxFuture;
use leptos::task::spawn_local;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

pub(crate) const RESULTS_CONTAINER_ID: &str = "search-results";
pub(crate) const SEARCH_ERROR_ID: &str = "search-err-area";

/// Work started by a click. The surface decides how the future is driven.
pub(crate) type ClickHandler = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// The parts of the page the controllers touch.
///
/// Elements are addressed by id. Operations on ids that are not in the page
/// are ignored.
pub(crate) trait DomSurface {
    fn clear_results(&self);
    fn append_result(&self, html: &str);

    fn set_visible(&self, element_id: &str, visible: bool);
    fn is_visible(&self, element_id: &str) -> bool;

    /// Attaches `handler` to clicks on `element_id`, removing whatever
    /// handler this surface bound to that id before.
    fn bind_click(&self, element_id: &str, handler: ClickHandler);

    fn show_search_error(&self, message: &str);
    fn clear_search_error(&self);
}

type ClickListener = Closure<dyn FnMut(web_sys::Event)>;

/// `DomSurface` over the live document.
#[derive(Default)]
pub(crate) struct BrowserDom {
    // Keeps listener closures alive and lets a rebind remove the old one.
    listeners: RefCell<HashMap<String, ClickListener>>,
}

impl BrowserDom {
    pub fn new() -> Self {
        Self::default()
    }

    fn document() -> Option<web_sys::Document> {
        web_sys::window().and_then(|w| w.document())
    }

    fn element(id: &str) -> Option<web_sys::HtmlElement> {
        Self::document()?
            .get_element_by_id(id)?
            .dyn_into::<web_sys::HtmlElement>()
            .ok()
    }

    /// Drops listeners whose element has left the document.
    fn prune_listeners(&self) {
        let Some(doc) = Self::document() else {
            return;
        };
        self.listeners
            .borrow_mut()
            .retain(|id, _| doc.get_element_by_id(id).is_some());
    }
}

impl DomSurface for BrowserDom {
    fn clear_results(&self) {
        if let Some(container) = Self::element(RESULTS_CONTAINER_ID) {
            container.set_inner_html("");
        }
        self.prune_listeners();
    }

    fn append_result(&self, html: &str) {
        let Some(container) = Self::element(RESULTS_CONTAINER_ID) else {
            log::warn!("results container #{RESULTS_CONTAINER_ID} not found");
            return;
        };
        if let Err(e) = container.insert_adjacent_html("beforeend", html) {
            log::error!("failed to insert result: {e:?}");
        }
    }

    fn set_visible(&self, element_id: &str, visible: bool) {
        let Some(el) = Self::element(element_id) else {
            return;
        };
        let style = el.style();
        let res = if visible {
            style.remove_property("display").map(|_| ())
        } else {
            style.set_property("display", "none")
        };
        if let Err(e) = res {
            log::error!("failed to toggle #{element_id}: {e:?}");
        }
    }

    fn is_visible(&self, element_id: &str) -> bool {
        Self::element(element_id)
            .and_then(|el| el.style().get_property_value("display").ok())
            .is_some_and(|display| display != "none")
    }

    fn bind_click(&self, element_id: &str, handler: ClickHandler) {
        let Some(el) = Self::element(element_id) else {
            log::debug!("no #{element_id} to bind");
            return;
        };

        let mut listeners = self.listeners.borrow_mut();
        if let Some(old) = listeners.remove(element_id) {
            let _ = el.remove_event_listener_with_callback("click", old.as_ref().unchecked_ref());
        }

        let listener = ClickListener::new(move |ev: web_sys::Event| {
            ev.prevent_default();
            spawn_local(handler());
        });

        match el.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref()) {
            Ok(()) => {
                listeners.insert(element_id.to_string(), listener);
            }
            Err(e) => log::error!("failed to bind #{element_id}: {e:?}"),
        }
    }

    fn show_search_error(&self, message: &str) {
        if let Some(el) = Self::element(SEARCH_ERROR_ID) {
            el.set_text_content(Some(message));
        }
    }

    fn clear_search_error(&self) {
        if let Some(el) = Self::element(SEARCH_ERROR_ID) {
            el.set_text_content(None);
        }
    }
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use futures::FutureExt;
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount_fixture(html: &str) -> web_sys::HtmlElement {
        let doc = BrowserDom::document().expect("document");
        let body = doc.body().expect("body");
        body.set_inner_html(html);
        body
    }

    #[wasm_bindgen_test]
    fn test_visibility_toggles_inline_display() {
        mount_fixture(r#"<button id="like-7" style="display: none">Like</button>"#);
        let dom = BrowserDom::new();

        assert!(!dom.is_visible("like-7"));
        dom.set_visible("like-7", true);
        assert!(dom.is_visible("like-7"));
        dom.set_visible("like-7", false);
        assert!(!dom.is_visible("like-7"));

        // Unknown ids are ignored.
        dom.set_visible("missing", true);
        assert!(!dom.is_visible("missing"));
    }

    #[wasm_bindgen_test]
    fn test_rebinding_replaces_click_listener() {
        let _ = leptos::task::Executor::init_wasm_bindgen();
        mount_fixture(r#"<button id="like-7">Like</button>"#);
        let dom = BrowserDom::new();
        let fired = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let fired = fired.clone();
            dom.bind_click(
                "like-7",
                Rc::new(move || {
                    fired.set(fired.get() + 1);
                    async {}.boxed_local()
                }),
            );
        }

        BrowserDom::element("like-7").expect("button").click();
        assert_eq!(fired.get(), 1);
    }

    #[wasm_bindgen_test]
    fn test_results_container_append_and_clear() {
        mount_fixture(r#"<div id="search-results"></div><div id="search-err-area"></div>"#);
        let dom = BrowserDom::new();

        dom.append_result(r#"<div class="card" id="card-1"></div>"#);
        dom.append_result(r#"<div class="card" id="card-2"></div>"#);
        let container = BrowserDom::element(RESULTS_CONTAINER_ID).expect("container");
        assert_eq!(container.child_element_count(), 2);

        dom.clear_results();
        assert_eq!(container.child_element_count(), 0);

        dom.show_search_error("term: This field is required.");
        let err = BrowserDom::element(SEARCH_ERROR_ID).expect("error area");
        assert_eq!(
            err.text_content().as_deref(),
            Some("term: This field is required.")
        );
        dom.clear_search_error();
        assert_eq!(err.text_content().as_deref(), Some(""));
    }
}
