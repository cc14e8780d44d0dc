//! Application layer: projection, layout and the update pass that ties them
//! to the outside world.

pub mod layout;
pub mod pipeline;
pub mod projection;

pub use layout::{LayoutOptions, anchor_line, layout, visual_column};
pub use pipeline::{
    ArtifactResolver, DecorationSink, DecorationUpdate, DocumentReader, MemorySink, PassReport,
    PipelineOptions, ProjectionPipeline, ResultSource, VisibleEditor, same_artifact,
};
pub use projection::{project, project_point, project_region};
