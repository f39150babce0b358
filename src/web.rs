//! Browser host (WASM only).
//!
//! Binds a [`ViewportLoader`] to the live page through `web_sys` and exports
//! it to JavaScript as `LazyLoader`:
//!
//! ```js
//! import init, { LazyLoader } from "./lazyload.js";
//! await init();
//! window.addEventListener("load", () => {
//!     const loader = new LazyLoader(JSON.stringify({ throttleDelayMs: 200 }));
//!     // after inserting images: loader.updateImageList();
//! });
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlAnchorElement, HtmlElement, HtmlImageElement, Window};

use crate::candidate::{CandidateId, LoadState};
use crate::config::LoaderConfig;
use crate::constants::SOURCE_URL_ATTRIBUTE;
use crate::document::{css_background_url, Document};
use crate::error::LoaderError;
use crate::fetch::ImageFetcher;
use crate::loader::ViewportLoader;
use crate::position::Position;
use crate::scheduler::{CheckScheduler, TimerHandle};
use crate::viewport::{scroll_offset, ScrollMetrics};

type WebLoader = ViewportLoader<WebDocument, WebScheduler, WebImageFetcher>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Level is narrowed per loader with log::set_max_level
    if console_log::init_with_level(log::Level::Trace).is_err() {
        web_sys::console::log_1(&"lazyload: logger already initialized".into());
    }
}

fn js_error(context: &'static str, error: JsValue) -> LoaderError {
    LoaderError::js(context, format!("{:?}", error))
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// The live DOM.
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    /// Kept alive for as long as the interceptors are installed
    click_blockers: Vec<Closure<dyn FnMut(Event)>>,
}

impl WebDocument {
    pub fn from_window(window: Window) -> Result<Self, LoaderError> {
        let document = window.document().ok_or(LoaderError::NoDocument)?;
        Ok(Self {
            window,
            document,
            click_blockers: Vec::new(),
        })
    }

    /// The link (or other element) wrapping a placeholder.
    fn container(node: &HtmlElement) -> Option<HtmlElement> {
        node.parent_element()?.dyn_into::<HtmlElement>().ok()
    }

    fn container_or_err(
        node: &HtmlElement,
        context: &'static str,
    ) -> Result<HtmlElement, LoaderError> {
        Self::container(node)
            .ok_or_else(|| LoaderError::js(context, "placeholder has no container"))
    }
}

impl ScrollMetrics for WebDocument {
    fn document_scroll_offset(&self) -> Option<f64> {
        self.document.body().map(|body| f64::from(body.scroll_top()))
    }

    fn root_scroll_offset(&self) -> Option<f64> {
        self.document
            .document_element()
            .map(|root| f64::from(root.scroll_top()))
    }

    fn viewport_length(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|height| height.as_f64())
            .unwrap_or(0.0)
    }
}

impl Document for WebDocument {
    type Node = HtmlElement;

    fn low_res_nodes(&self, class: &str) -> Vec<HtmlElement> {
        // The collection is live; snapshot it
        let collection = self.document.get_elements_by_class_name(class);
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .filter_map(|element| element.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn source_url(&self, node: &HtmlElement) -> Option<String> {
        let container = node.parent_element()?;
        if let Some(anchor) = container.dyn_ref::<HtmlAnchorElement>() {
            let href = anchor.href();
            if !href.is_empty() {
                return Some(href);
            }
        }
        container
            .get_attribute(SOURCE_URL_ATTRIBUTE)
            .filter(|url| !url.is_empty())
    }

    fn layout_rect(&self, node: &HtmlElement) -> Position {
        // Client rects are viewport-relative; shift into document coordinates
        let rect = node.get_bounding_client_rect();
        let offset = scroll_offset(self);
        Position {
            top: rect.top() + offset,
            bottom: rect.bottom() + offset,
        }
    }

    fn supports_pointer_events(&self) -> bool {
        self.document
            .document_element()
            .and_then(|root| root.dyn_into::<HtmlElement>().ok())
            .and_then(|root| {
                Reflect::has(&root.style(), &JsValue::from_str("pointer-events")).ok()
            })
            .unwrap_or(false)
    }

    fn show_high_res(
        &mut self,
        node: &HtmlElement,
        url: &str,
        hidden_class: &str,
    ) -> Result<(), LoaderError> {
        let container = Self::container_or_err(node, "show high-res image")?;
        container
            .style()
            .set_property("background-image", &css_background_url(url))
            .map_err(|e| js_error("set background-image", e))?;
        node.set_class_name(hidden_class);
        Ok(())
    }

    fn block_clicks(&mut self, node: &HtmlElement) -> Result<(), LoaderError> {
        let container = Self::container_or_err(node, "block clicks")?;
        let blocker = Closure::wrap(Box::new(|event: Event| {
            event.prevent_default();
        }) as Box<dyn FnMut(Event)>);
        container.set_onclick(Some(blocker.as_ref().unchecked_ref()));
        self.click_blockers.push(blocker);
        Ok(())
    }
}

/// `setTimeout` followed by `requestAnimationFrame`.
///
/// Handles are a local sequence; browser timer ids are never inspected.
pub struct WebScheduler {
    window: Window,
    loader: Weak<RefCell<WebLoader>>,
    frames: bool,
    next_handle: u32,
}

impl WebScheduler {
    fn new(window: Window, loader: Weak<RefCell<WebLoader>>) -> Self {
        let frames = Reflect::get(&window, &JsValue::from_str("requestAnimationFrame"))
            .map(|f| f.is_function())
            .unwrap_or(false);
        Self {
            window,
            loader,
            frames,
            next_handle: 0,
        }
    }

    fn next_handle(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        handle
    }

    /// One-shot JS callback that forwards to the loader if it still exists.
    fn callback(&self, fire: fn(&mut WebLoader, TimerHandle), handle: TimerHandle) -> JsValue {
        let loader = self.loader.clone();
        Closure::once_into_js(move || {
            if let Some(loader) = loader.upgrade() {
                fire(&mut loader.borrow_mut(), handle);
            }
        })
    }
}

impl CheckScheduler for WebScheduler {
    fn supports_frames(&self) -> bool {
        self.frames
    }

    fn set_timeout(&mut self, delay: Duration) -> Result<TimerHandle, LoaderError> {
        let handle = self.next_handle();
        let callback = self.callback(WebLoader::timer_elapsed, handle);
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                millis,
            )
            .map_err(|e| LoaderError::TimerUnavailable(format!("{:?}", e)))?;
        Ok(handle)
    }

    fn request_frame(&mut self) -> Result<TimerHandle, LoaderError> {
        let handle = self.next_handle();
        let callback = self.callback(WebLoader::frame_ready, handle);
        self.window
            .request_animation_frame(callback.unchecked_ref())
            .map_err(|e| LoaderError::TimerUnavailable(format!("{:?}", e)))?;
        Ok(handle)
    }
}

/// Loads through a detached `Image`, used only for its load/error events.
pub struct WebImageFetcher {
    loader: Weak<RefCell<WebLoader>>,
}

/// Promise settled by the image's load or error event.
fn image_settled(image: &HtmlImageElement) -> Promise {
    Promise::new(&mut |resolve: Function, reject: Function| {
        image.set_onload(Some(&resolve));
        image.set_onerror(Some(&reject));
    })
}

impl ImageFetcher for WebImageFetcher {
    fn fetch(&mut self, candidate: CandidateId, url: &str) -> Result<(), LoaderError> {
        let image = HtmlImageElement::new().map_err(|e| js_error("create image", e))?;
        let settled = image_settled(&image);
        image.set_src(url);

        let loader = self.loader.clone();
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = JsFuture::from(settled)
                .await
                .map(|_| ())
                .map_err(|e| LoaderError::fetch_failed(&url, format!("{:?}", e)));
            drop(image);
            if let Some(loader) = loader.upgrade() {
                loader.borrow_mut().complete_load(candidate, outcome);
            }
        });
        Ok(())
    }
}

/// Progressive image loader for the current page.
///
/// Construct once the document has loaded. Dropping (`free()`) the object
/// removes its scroll and resize listeners.
#[wasm_bindgen]
pub struct LazyLoader {
    inner: Rc<RefCell<WebLoader>>,
    window: Window,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

#[wasm_bindgen]
impl LazyLoader {
    /// Create a loader from an optional JSON config and run the first check.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<LazyLoader, JsValue> {
        let config = match config_json {
            Some(json) => LoaderConfig::from_json(&json).map_err(to_js)?,
            None => LoaderConfig::default(),
        };
        log::set_max_level(config.log_level.to_level_filter());

        let window = web_sys::window().ok_or_else(|| to_js(LoaderError::NoWindow))?;
        let document = WebDocument::from_window(window.clone()).map_err(to_js)?;

        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<WebLoader>>| {
            RefCell::new(ViewportLoader::new(
                document,
                WebScheduler::new(window.clone(), weak.clone()),
                WebImageFetcher {
                    loader: weak.clone(),
                },
                &config,
            ))
        });
        inner.borrow_mut().init();

        let mut loader = LazyLoader {
            inner,
            window,
            listeners: Vec::new(),
        };
        loader.listen("scroll")?;
        if config.check_on_resize {
            loader.listen("resize")?;
        }
        Ok(loader)
    }

    /// Re-query placeholders after the page's image list changed.
    #[wasm_bindgen(js_name = updateImageList)]
    pub fn update_image_list(&self) -> usize {
        self.inner.borrow_mut().rediscover()
    }

    /// Recapture positions after images moved.
    #[wasm_bindgen(js_name = updateImagePositions)]
    pub fn update_image_positions(&self) {
        self.inner.borrow_mut().refresh_positions();
    }

    /// Run a visibility pass now, bypassing the throttle.
    #[wasm_bindgen(js_name = checkNow)]
    pub fn check_now(&self) -> usize {
        self.inner.borrow_mut().run_check()
    }

    #[wasm_bindgen(js_name = loadingCount)]
    pub fn loading_count(&self) -> usize {
        self.inner.borrow().candidates().count_in(LoadState::Loading)
    }

    #[wasm_bindgen(js_name = idleCount)]
    pub fn idle_count(&self) -> usize {
        self.inner.borrow().candidates().count_in(LoadState::Idle)
    }
}

impl LazyLoader {
    fn listen(&mut self, event: &'static str) -> Result<(), JsValue> {
        let loader = Rc::downgrade(&self.inner);
        let closure = Closure::wrap(Box::new(move |_: Event| {
            if let Some(loader) = loader.upgrade() {
                loader.borrow_mut().request_check();
            }
        }) as Box<dyn FnMut(Event)>);
        self.window
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push((event, closure));
        Ok(())
    }
}

impl Drop for LazyLoader {
    fn drop(&mut self) {
        for (event, closure) in &self.listeners {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                log::warn!("Failed to remove {} listener: {:?}", event, e);
            }
        }
    }
}
