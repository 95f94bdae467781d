use std::{path::Path, sync::Arc};

use image::RgbaImage;
use redact_common::Rect;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};
use tracing::info;

use crate::{
    error::{RedactError, Result},
    export::{self, ExportOptions},
    geometry::nms_merge_rects,
    pipeline::{builder::PipelineBuilder, RegionPipeline},
    redaction::{apply_redactions, RedactionParams},
    types::{DetectOptions, DetectedRegions, MergeOptions, RedactionTool, Sensitivity},
};

#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RedactCommand {
    /// Run automatic detection and add the suggested regions
    Detect {
        /// Overrides the pipeline's sensitivity for this run
        #[serde(default)]
        sensitivity: Option<Sensitivity>,
    },

    /// Collapse overlapping or nearby regions
    Merge {
        #[schemars(range(min = 0.0, max = 1.0))]
        iou_thresh: f64,
        #[schemars(range(min = 0.0))]
        distance_px: f64,
    },

    /// Add a manually drawn region
    AddRegion {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// Forget every region
    ClearRegions,

    /// Destructively redact every region with one tool
    Apply { tool: RedactionTool },
}

impl RedactCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RedactCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::Detect { .. } => "Detect text regions automatically and add them as suggestions",
            Self::Merge { .. } => "Merge regions that overlap or sit within a pixel distance of each other",
            Self::AddRegion { .. } => "Add a rectangular region drawn by hand",
            Self::ClearRegions => "Remove all regions",
            Self::Apply { .. } => "Apply blackout, blur or pixelate to every region",
        }
    }

    /// Get parameter requirements for the command
    pub fn parameters_info(&self) -> Vec<(&'static str, &'static str, bool)> {
        match self {
            Self::Detect { .. } => vec![("sensitivity", "low, med or high", false)],
            Self::Merge { .. } => vec![
                ("iou_thresh", "Overlap ratio at which regions merge (0-1)", true),
                ("distance_px", "Gap in pixels under which regions merge", true),
            ],
            Self::AddRegion { .. } => vec![
                ("x", "Left edge in pixels", true),
                ("y", "Top edge in pixels", true),
                ("width", "Width in pixels", true),
                ("height", "Height in pixels", true),
            ],
            Self::ClearRegions => vec![],
            Self::Apply { .. } => vec![("tool", "blackout, blur or pixelate", true)],
        }
    }
}

/// Holds one screenshot and its working set of regions
#[derive(Clone)]
pub struct RedactManager {
    image: Option<RgbaImage>,
    pipeline: Arc<RegionPipeline>,
    regions: Vec<Rect>,
    advisory: Option<String>,
    params: RedactionParams,
}

impl RedactManager {
    pub fn new() -> Self {
        Self::with_pipeline(PipelineBuilder::new().build())
    }

    /// Create a new RedactManager with a custom pipeline
    pub fn with_pipeline(pipeline: RegionPipeline) -> Self {
        Self {
            image: None,
            pipeline: Arc::new(pipeline),
            regions: Vec::new(),
            advisory: None,
            params: RedactionParams::default(),
        }
    }

    pub fn with_params(mut self, params: RedactionParams) -> Self {
        self.params = params;
        self
    }

    /// Load a screenshot from file
    pub fn load_image<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let img = image::open(path)?;
        self.set_image(img.to_rgba8());
        Ok(())
    }

    /// Load a screenshot from memory
    pub fn load_image_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let img = image::load_from_memory(bytes)?;
        self.set_image(img.to_rgba8());
        Ok(())
    }

    /// Set the image directly, discarding regions from any previous image
    pub fn set_image(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.regions.clear();
        self.advisory = None;
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn regions(&self) -> &[Rect] {
        &self.regions
    }

    fn snapshot(&self, image: &RgbaImage) -> DetectedRegions {
        DetectedRegions {
            regions: self.regions.clone(),
            image_width: image.width(),
            image_height: image.height(),
            scale: 1.0,
            advisory: self.advisory.clone(),
        }
    }

    /// Run `command` and return the resulting working set of regions
    pub fn execute(&mut self, command: RedactCommand) -> Result<DetectedRegions> {
        let image = self.image.as_mut().ok_or(RedactError::NoImageLoaded)?;

        match command {
            RedactCommand::Detect { sensitivity } => {
                let detected = match sensitivity {
                    Some(sensitivity) => {
                        let options = DetectOptions {
                            sensitivity,
                            ..self.pipeline.settings().detect
                        };
                        self.pipeline.process_with(image, &options)
                    }
                    None => self.pipeline.process(image),
                };
                self.advisory = detected.advisory;
                self.regions.extend(detected.regions);
            }
            RedactCommand::Merge {
                iou_thresh,
                distance_px,
            } => {
                self.regions = nms_merge_rects(&self.regions, &MergeOptions::new(iou_thresh, distance_px));
            }
            RedactCommand::AddRegion {
                x,
                y,
                width,
                height,
            } => {
                let rect = Rect::new(x, y, width, height);
                if !rect.is_finite() {
                    return Err(RedactError::InvalidInput(format!("non-finite region {rect:?}")));
                }
                self.regions.push(rect);
            }
            RedactCommand::ClearRegions => {
                self.regions.clear();
                self.advisory = None;
            }
            RedactCommand::Apply { tool } => {
                let applied = apply_redactions(image, &self.regions, tool, &self.params);
                info!(%tool, applied, total = self.regions.len(), "applied redaction");
            }
        }

        let image = self.image.as_ref().ok_or(RedactError::NoImageLoaded)?;
        Ok(self.snapshot(image))
    }

    /// Flatten and encode the current image
    pub fn export(&self, options: &ExportOptions) -> Result<Vec<u8>> {
        let image = self.image.as_ref().ok_or(RedactError::NoImageLoaded)?;
        export::encode(image, options)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, options: &ExportOptions) -> Result<()> {
        let image = self.image.as_ref().ok_or(RedactError::NoImageLoaded)?;
        export::save(image, path.as_ref(), options)
    }
}

impl Default for RedactManager {
    fn default() -> Self {
        Self::new()
    }
}
