//! Client side of the object-diff API.
//!
//! The server computes a diff of one object between two points in time and
//! exposes it in two parts: a structural skeleton of the tree and a paged
//! stream of per-node property diffs. This crate owns the wire types for
//! both, the [`DiffApi`] seam the diff engine polls through, and the
//! reqwest-backed [`HttpDiffApi`].

mod api;
mod error;
mod http;
pub mod time;
mod types;

pub use api::DiffApi;
pub use api::NodePoll;
pub use api::StructurePoll;
pub use error::ApiError;
pub use error::ApiResult;
pub use http::HttpDiffApi;
pub use http::HttpDiffApiConfig;
pub use types::DiffTarget;
pub use types::NodeIndexMap;
pub use types::NodePageResponse;
pub use types::NodeRecord;
pub use types::NodeResponse;
pub use types::PropertyMap;
pub use types::Side;
pub use types::SkeletonNode;
pub use types::StructureReady;
pub use types::StructureResponse;
pub use types::display_value;
