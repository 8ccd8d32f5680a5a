mod client;
mod model;

pub use client::{UpstreamClient, UpstreamError};
pub use model::{DatasetPage, PageRequest};
