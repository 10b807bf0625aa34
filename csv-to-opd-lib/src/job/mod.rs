mod template;

pub use template::JOB_TEMPLATE;

use json_comments::StripComments;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::converter::Converter;
use crate::error::ConverterError;
use crate::types::Delimiter;

/// Row error policy named in a job file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnRowError {
    #[default]
    Prompt,
    Continue,
    Abort,
}

/// A single conversion described as JSON with comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: Delimiter,
    #[serde(default, rename = "onRowError")]
    pub on_row_error: OnRowError,
}

fn default_delimiter() -> Delimiter {
    Delimiter::Tab
}

impl ConversionJob {
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, ConverterError> {
        let path = path.into();
        tracing::info!("Loading job from {:?}", path);
        let file = std::fs::File::open(&path).map_err(|e| ConverterError::SourceUnreadable {
            path: path.clone(),
            source: e,
        })?;
        let mut job: ConversionJob = serde_json::from_reader(StripComments::new(file))?;

        let base_path = path.parent().unwrap_or_else(|| Path::new(""));
        job.resolve_paths(base_path);
        tracing::info!("Successfully loaded job: {}", path.display());
        Ok(job)
    }

    pub fn from_jsonc(content: &str) -> Result<Self, ConverterError> {
        Ok(serde_json::from_reader(StripComments::new(
            content.as_bytes(),
        ))?)
    }

    /// Relative `source` and `output` are taken relative to `base_path`.
    /// Empty paths are left empty so that [`validate`](Self::validate) still
    /// rejects them.
    pub fn resolve_paths(&mut self, base_path: &Path) {
        for path in [&mut self.source, &mut self.output] {
            if !path.as_os_str().is_empty() && path.is_relative() {
                *path = base_path.join(&*path);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConverterError> {
        tracing::info!("Validating job...");

        if self.source.as_os_str().is_empty() {
            tracing::error!("Job has an empty source path");
            return Err(ConverterError::InvalidJob(
                "'source' must name the CSV file to convert".into(),
            ));
        }

        if self.output.as_os_str().is_empty() {
            tracing::error!("Job has an empty output path");
            return Err(ConverterError::InvalidJob(
                "'output' must name the directory for OPD files".into(),
            ));
        }

        tracing::info!("Job validation successful");
        Ok(())
    }

    pub fn converter(&self) -> Converter {
        Converter::new(&self.source, &self.output, self.delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_template_parses_with_defaults() {
        let job = ConversionJob::from_jsonc(JOB_TEMPLATE).unwrap();
        assert_eq!(job.source, PathBuf::from("input.csv"));
        assert_eq!(job.output, PathBuf::from("out"));
        assert_eq!(job.delimiter, Delimiter::Tab);
        assert_eq!(job.on_row_error, OnRowError::Prompt);
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_optional_fields_default() {
        let job = ConversionJob::from_jsonc(r#"{ "source": "a.csv", "output": "out" }"#).unwrap();
        assert_eq!(job.delimiter, Delimiter::Tab);
        assert_eq!(job.on_row_error, OnRowError::Prompt);
    }

    #[test]
    fn test_literal_delimiter_and_policy() {
        let job = ConversionJob::from_jsonc(
            r#"{
                // inline comment
                "source": "a.csv",
                "output": "out", /* block */
                "delimiter": ";",
                "onRowError": "abort"
            }"#,
        )
        .unwrap();
        assert_eq!(job.delimiter, Delimiter::Semicolon);
        assert_eq!(job.on_row_error, OnRowError::Abort);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result =
            ConversionJob::from_jsonc(r#"{ "source": "a.csv", "output": "out", "extra": 1 }"#);
        assert!(matches!(result, Err(ConverterError::Json(_))));
    }

    #[test]
    fn test_empty_paths_fail_validation() {
        let job = ConversionJob::from_jsonc(r#"{ "source": "", "output": "out" }"#).unwrap();
        assert!(matches!(job.validate(), Err(ConverterError::InvalidJob(_))));
        let job = ConversionJob::from_jsonc(r#"{ "source": "a.csv", "output": "" }"#).unwrap();
        assert!(matches!(job.validate(), Err(ConverterError::InvalidJob(_))));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = dir.path().join("job.jsonc");
        fs::write(
            &job_path,
            r#"{ "source": "data/input.csv", "output": "out", "delimiter": "comma" }"#,
        )
        .unwrap();

        let job = ConversionJob::from_file(&job_path).unwrap();
        assert_eq!(job.source, dir.path().join("data/input.csv"));
        assert_eq!(job.output, dir.path().join("out"));
        assert_eq!(job.converter().delimiter(), Delimiter::Comma);
    }
}
