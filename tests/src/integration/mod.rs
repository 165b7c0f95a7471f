//! Cross-crate integration scenarios.

mod federation;
mod pipeline_flows;
