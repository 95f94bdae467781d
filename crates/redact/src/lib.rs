//! # Screenshot Redaction Core
//!
//! Finds text-like regions in a screenshot, turns them into a deduplicated set
//! of redaction rectangles, applies destructive pixel transforms and checks
//! that those transforms really destroyed the original content.
//!
//! ## Core Features
//!
//! - **Geometry Kernel**: polygon to rectangle reduction, padding, IoU, edge
//!   distance and union-find merging
//! - **Pluggable Detectors**: anything implementing [`Detector`]; the built-in
//!   [`EdgeDetector`] needs no model
//! - **Coordinate Pipeline**: downscale for detection, upscale before padding
//!   and merging, optionally across an async worker boundary
//! - **Verification**: statistical irreversibility checks for blackout, blur
//!   and pixelate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redact::{RegionPipeline, Sensitivity};
//!
//! let pipeline = RegionPipeline::builder()
//!     .with_sensitivity(Sensitivity::High)
//!     .with_padding(6.0)
//!     .build();
//!
//! let image = image::open("screenshot.png")?.to_rgba8();
//! let result = pipeline.process(&image);
//! for rect in &result.regions {
//!     println!("{rect:?}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod geometry;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod verify;
pub mod redaction;
pub mod export;
pub mod io;
pub mod manager;

pub use error::{RedactError, Result};
pub use types::*;
pub use traits::Detector;
pub use geometry::{
    edge_distance, inflate_rect, iou, nms_merge_rects, poly_to_rect, rect_to_polygon, union_rect,
};
pub use algorithms::{EdgeDetector, EdgeDetectorConfig, ThresholdPolicy};
pub use pipeline::{
    builder::PipelineBuilder,
    finalize_polygons,
    worker::{AsyncRegionPipeline, DetectionClient},
    PipelineSettings, RegionPipeline,
};
pub use verify::{assert_filled, assert_irreversible, is_uniform_region, region_stats, verify_redaction, RegionStats};
pub use redaction::{apply_redaction, apply_redactions, RedactionParams};
pub use export::{ExportFormat, ExportOptions};
pub use manager::{RedactCommand, RedactManager};
pub use redact_common::{DetectionCandidate, ImageDimensions, Polygon, Rect};
