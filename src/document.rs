//! Host document seam.
//!
//! The loader never owns elements. It holds [`Document::Node`] handles and
//! asks the document for everything it needs to read or change.

use crate::error::LoaderError;
use crate::position::Position;

/// Access to the host document for discovery, layout and swap side effects.
pub trait Document {
    /// Handle to a placeholder element. Equality must mean "same element".
    type Node: Clone + PartialEq;

    /// All placeholder elements carrying `class`, in document order.
    fn low_res_nodes(&self, class: &str) -> Vec<Self::Node>;

    /// High-resolution URL exposed by the placeholder's container.
    fn source_url(&self, node: &Self::Node) -> Option<String>;

    /// Current layout bounds of `node` in document coordinates.
    ///
    /// May force a synchronous layout; only called from the position cache.
    fn layout_rect(&self, node: &Self::Node) -> Position;

    /// Whether the host can disable placeholder clicks through CSS.
    fn supports_pointer_events(&self) -> bool;

    /// Show `url` as the container background and mark the placeholder
    /// superseded by giving it `hidden_class`.
    fn show_high_res(
        &mut self,
        node: &Self::Node,
        url: &str,
        hidden_class: &str,
    ) -> Result<(), LoaderError>;

    /// Cancel default navigation for clicks on the container.
    fn block_clicks(&mut self, node: &Self::Node) -> Result<(), LoaderError>;
}

/// CSS `url('...')` value for `url`, with backslashes and single quotes escaped.
pub fn css_background_url(url: &str) -> String {
    let mut value = String::with_capacity(url.len() + 7);
    value.push_str("url('");
    for c in url.chars() {
        if matches!(c, '\\' | '\'') {
            value.push('\\');
        }
        value.push(c);
    }
    value.push_str("')");
    value
}
