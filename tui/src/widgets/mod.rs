mod detail;
mod status;
mod tree;

pub(crate) use detail::render_detail;
pub(crate) use status::STATUS_HEIGHT;
pub(crate) use status::StatusProps;
pub(crate) use status::render_status;
pub(crate) use tree::BufferDiagram;
