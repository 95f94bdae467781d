use redact::{ExportFormat, ExportOptions, PipelineSettings, RedactionParams, RedactionTool};
use redact_common::{Rect, utils::is_image_file};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Missing 'input_path' field")]
    MissingInput,
    #[error("Missing 'output_path' field")]
    MissingOutput,
    #[error("Unsupported image file: {0}")]
    UnsupportedImage(String),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

fn default_true() -> bool {
    true
}

/// One screenshot redaction run, loaded from TOML or JSON
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RedactJob {
    pub input_path: String,
    pub output_path: String,
    /// Run automatic detection before applying
    #[serde(default = "default_true")]
    pub auto_detect: bool,
    /// Regions drawn by hand, in image pixels
    #[serde(default)]
    pub regions: Vec<Rect>,
    #[serde(default)]
    pub tool: RedactionTool,
    #[serde(default)]
    pub params: RedactionParams,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// Encoder settings; the format follows `output_path` when it has a known extension
    #[serde(default)]
    pub export: ExportOptions,
    /// Where to write the final regions as GeoJSON
    #[serde(default)]
    pub geojson_path: Option<String>,
}

impl RedactJob {
    pub fn new(input_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            auto_detect: true,
            regions: Vec::new(),
            tool: RedactionTool::default(),
            params: RedactionParams::default(),
            pipeline: PipelineSettings::default(),
            export: ExportOptions::default(),
            geojson_path: None,
        }
    }

    /// Get the JSON schema for job files
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RedactJob)
    }

    /// Check paths before any work is done
    pub fn validate(&self) -> Result<(), JobError> {
        if self.input_path.trim().is_empty() {
            return Err(JobError::MissingInput);
        }
        if self.output_path.trim().is_empty() {
            return Err(JobError::MissingOutput);
        }
        if !is_image_file(&self.input_path) {
            return Err(JobError::UnsupportedImage(self.input_path.clone()));
        }
        Ok(())
    }

    /// Export options with the format taken from the output extension when possible
    pub fn export_options(&self) -> ExportOptions {
        let format = ExportFormat::from_path(Path::new(&self.output_path)).unwrap_or(self.export.format);
        ExportOptions {
            format,
            ..self.export
        }
    }

    /// Load RedactJob configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load RedactJob configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, JobError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RedactJob configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load RedactJob configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(JobError::UnsupportedFileFormat),
        }
    }

    /// Save RedactJob configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), JobError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Convert RedactJob to TOML string
    pub fn to_toml(&self) -> Result<String, JobError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save RedactJob configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), JobError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Convert RedactJob to JSON string
    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact::Sensitivity;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let job = RedactJob::from_toml(
            r#"
            input_path = "shot.png"
            output_path = "shot.redacted.jpg"
            "#,
        )
        .unwrap();
        assert!(job.auto_detect);
        assert_eq!(job.tool, RedactionTool::Blackout);
        assert_eq!(job.pipeline, PipelineSettings::default());
        assert_eq!(job.export_options().format, ExportFormat::Jpeg);
        job.validate().unwrap();
    }

    #[test]
    fn test_full_toml() {
        let job = RedactJob::from_toml(
            r#"
            input_path = "shot.png"
            output_path = "out.png"
            auto_detect = false
            tool = "pixelate"

            [[regions]]
            x = 10.0
            y = 20.0
            width = 100.0
            height = 30.0

            [params]
            pixel_block = 16

            [pipeline]
            padding_px = 6.0

            [pipeline.detect]
            sensitivity = "high"
            "#,
        )
        .unwrap();
        assert!(!job.auto_detect);
        assert_eq!(job.tool, RedactionTool::Pixelate);
        assert_eq!(job.regions, vec![Rect::new(10.0, 20.0, 100.0, 30.0)]);
        assert_eq!(job.params.pixel_block, 16);
        assert_eq!(job.pipeline.padding_px, 6.0);
        assert_eq!(job.pipeline.detect.sensitivity, Sensitivity::High);
        assert_eq!(job.pipeline.detect.target_long_edge, 1280);
    }

    #[test]
    fn test_toml_and_json_round_trip() {
        let mut job = RedactJob::new("a.png", "b.png");
        job.regions.push(Rect::new(1.0, 2.0, 3.0, 4.0));
        job.geojson_path = Some("regions.geojson".to_string());

        assert_eq!(RedactJob::from_toml(&job.to_toml().unwrap()).unwrap(), job);
        assert_eq!(RedactJob::from_json(&job.to_json().unwrap()).unwrap(), job);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(RedactJob::new("", "b.png").validate(), Err(JobError::MissingInput)));
        assert!(matches!(RedactJob::new("a.png", " ").validate(), Err(JobError::MissingOutput)));
        assert!(matches!(
            RedactJob::new("notes.txt", "b.png").validate(),
            Err(JobError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(matches!(RedactJob::from_file("job.yaml"), Err(JobError::UnsupportedFileFormat)));
    }

    #[test]
    fn test_schema_lists_fields() {
        let schema = serde_json::to_string(&RedactJob::schema()).unwrap();
        assert!(schema.contains("input_path"));
        assert!(schema.contains("padding_px"));
    }
}
