//! In-memory page.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOW_RES_CLASS;
use crate::document::{css_background_url, Document};
use crate::error::LoaderError;
use crate::position::Position;
use crate::viewport::ScrollMetrics;

/// Which accessor reports the real scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollOffsetSource {
    /// Body carries the offset, root reports 0 (quirks mode)
    Document,
    /// Root carries the offset, body reports 0 (standards mode)
    #[default]
    Root,
    /// Neither accessor exists
    Neither,
}

fn default_class() -> String {
    DEFAULT_LOW_RES_CLASS.to_string()
}

/// A placeholder image laid out on the simulated page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimImage {
    /// Container URL; `None` models a container without a link
    #[serde(default)]
    pub url: Option<String>,
    pub top: f64,
    pub height: f64,
    #[serde(default = "default_class")]
    pub class: String,
    /// Background applied to the container by a swap
    #[serde(default, skip_deserializing)]
    pub background: Option<String>,
    /// Container swallows clicks
    #[serde(default, skip_deserializing)]
    pub click_blocked: bool,
}

impl SimImage {
    pub fn new(url: &str, top: f64, height: f64) -> Self {
        Self {
            url: Some(url.to_string()),
            top,
            height,
            class: default_class(),
            background: None,
            click_blocked: false,
        }
    }

    /// A placeholder whose container exposes no URL.
    pub fn without_url(top: f64, height: f64) -> Self {
        Self {
            url: None,
            ..Self::new("", top, height)
        }
    }
}

/// Result of clicking an image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickOutcome {
    /// Default navigation was cancelled by an interceptor
    pub default_prevented: bool,
}

/// A scrollable page of placeholder images. Nodes are image indices.
#[derive(Debug, Clone)]
pub struct SimulatedPage {
    images: Vec<SimImage>,
    scroll_offset: f64,
    viewport_height: f64,
    offset_source: ScrollOffsetSource,
    pointer_events: bool,
    layout_queries: Cell<usize>,
}

impl SimulatedPage {
    /// Empty page scrolled to the top, with pointer-event support.
    pub fn new(viewport_height: f64) -> Self {
        Self {
            images: Vec::new(),
            scroll_offset: 0.0,
            viewport_height,
            offset_source: ScrollOffsetSource::default(),
            pointer_events: true,
            layout_queries: Cell::new(0),
        }
    }

    pub fn with_images(viewport_height: f64, images: Vec<SimImage>) -> Self {
        Self {
            images,
            ..Self::new(viewport_height)
        }
    }

    pub fn with_pointer_events(mut self, supported: bool) -> Self {
        self.pointer_events = supported;
        self
    }

    pub fn with_offset_source(mut self, source: ScrollOffsetSource) -> Self {
        self.offset_source = source;
        self
    }

    /// Append an image, returning its node index.
    pub fn push(&mut self, image: SimImage) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn image(&self, index: usize) -> Option<&SimImage> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[SimImage] {
        &self.images
    }

    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll_offset = offset;
    }

    pub fn resize(&mut self, viewport_height: f64) {
        self.viewport_height = viewport_height;
    }

    /// Move an image without telling anyone, as a reflow would.
    pub fn move_image(&mut self, index: usize, top: f64) {
        if let Some(image) = self.images.get_mut(index) {
            image.top = top;
        }
    }

    /// Replace the class of image `index`, e.g. to take it out of discovery.
    pub fn set_class(&mut self, index: usize, class: &str) {
        if let Some(image) = self.images.get_mut(index) {
            image.class = class.to_string();
        }
    }

    /// Click the container of image `index`.
    pub fn click(&self, index: usize) -> ClickOutcome {
        ClickOutcome {
            default_prevented: self.images.get(index).is_some_and(|i| i.click_blocked),
        }
    }

    /// Number of layout queries answered so far.
    pub fn layout_queries(&self) -> usize {
        self.layout_queries.get()
    }
}

impl ScrollMetrics for SimulatedPage {
    fn document_scroll_offset(&self) -> Option<f64> {
        match self.offset_source {
            ScrollOffsetSource::Document => Some(self.scroll_offset),
            ScrollOffsetSource::Root => Some(0.0),
            ScrollOffsetSource::Neither => None,
        }
    }

    fn root_scroll_offset(&self) -> Option<f64> {
        match self.offset_source {
            ScrollOffsetSource::Document => Some(0.0),
            ScrollOffsetSource::Root => Some(self.scroll_offset),
            ScrollOffsetSource::Neither => None,
        }
    }

    fn viewport_length(&self) -> f64 {
        self.viewport_height
    }
}

impl Document for SimulatedPage {
    type Node = usize;

    fn low_res_nodes(&self, class: &str) -> Vec<usize> {
        self.images
            .iter()
            .enumerate()
            .filter(|(_, image)| image.class == class)
            .map(|(i, _)| i)
            .collect()
    }

    fn source_url(&self, node: &usize) -> Option<String> {
        self.images.get(*node).and_then(|i| i.url.clone())
    }

    fn layout_rect(&self, node: &usize) -> Position {
        self.layout_queries.set(self.layout_queries.get() + 1);
        self.images
            .get(*node)
            .map(|i| Position::from_top_and_height(i.top, i.height))
            .unwrap_or_default()
    }

    fn supports_pointer_events(&self) -> bool {
        self.pointer_events
    }

    fn show_high_res(
        &mut self,
        node: &usize,
        url: &str,
        hidden_class: &str,
    ) -> Result<(), LoaderError> {
        let image = self
            .images
            .get_mut(*node)
            .ok_or_else(|| LoaderError::js("show_high_res", format!("no image {node}")))?;
        image.background = Some(css_background_url(url));
        image.class = hidden_class.to_string();
        Ok(())
    }

    fn block_clicks(&mut self, node: &usize) -> Result<(), LoaderError> {
        let image = self
            .images
            .get_mut(*node)
            .ok_or_else(|| LoaderError::js("block_clicks", format!("no image {node}")))?;
        image.click_blocked = true;
        Ok(())
    }
}
