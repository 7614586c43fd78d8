//! Incremental diff-tree engine.
//!
//! A [`DiffSession`] polls the structure of a diff until it is ready,
//! allocates a [`NodeIndex`] from it, then pages node records into that
//! index. A [`TreeRenderer`] turns the structure into a sorted, laid out
//! tree whose labels fill in as records land, and a [`DetailInspector`]
//! shows the property diff of one clicked node.

pub mod config;
mod hierarchy;
mod inspector;
mod labels;
mod layout;
mod node_index;
mod poller;
mod render;
mod session;
mod state;
mod text_backend;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::ConfigError;
pub use config::ConfigLoader;
pub use config::DiffConfig;
pub use hierarchy::Hierarchy;
pub use hierarchy::NodeClass;
pub use hierarchy::NodeId;
pub use hierarchy::TreeNode;
pub use inspector::Cell;
pub use inspector::DetailInspector;
pub use inspector::Emphasis;
pub use inspector::PropertyRow;
pub use inspector::RowValues;
pub use labels::LabelRules;
pub use layout::Extent;
pub use layout::LayoutConfig;
pub use layout::Margins;
pub use layout::Placed;
pub use layout::Size;
pub use layout::TreeLayout;
pub use node_index::FillOutcome;
pub use node_index::IndexError;
pub use node_index::NodeIndex;
pub use poller::PollEvent;
pub use render::DiagramBackend;
pub use render::LABEL_OFFSET;
pub use render::NodeSelection;
pub use render::TreeRenderer;
pub use session::Applied;
pub use session::DiffSession;
pub use session::SessionOptions;
pub use state::SessionState;
pub use text_backend::TextBackend;
