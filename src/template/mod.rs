//! Template processing module

mod processor;
mod service_artifact;

pub use processor::TemplateProcessor;
pub use service_artifact::render_service_artifact;
