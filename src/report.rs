use serde::Serialize;

use crate::{
    aggregate::{AnalysisReport, Confidence},
    error::Result,
    metadata::exif::MetadataSummary,
};

/// The wire-level envelope handed to external tooling. Exactly one of
/// `analysis` and `error` is present, keyed off `success`.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSection {
    pub ela: f64,
    pub copy_move: f64,
    pub noise: f64,
    pub jpeg_artifacts: f64,
    pub edge_consistency: f64,
    pub overall_score: f64,
    pub is_likely_forged: bool,
    pub confidence: Confidence,
}

#[derive(Debug, Serialize)]
pub struct MetadataSection {
    pub camera: Option<String>,
    pub software: Option<String>,
    pub indicators: Vec<String>,
}

impl From<&AnalysisReport> for AnalysisSection {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            ela: report.scores.ela,
            copy_move: report.scores.copy_move,
            noise: report.scores.noise,
            jpeg_artifacts: report.scores.jpeg_artifacts,
            edge_consistency: report.scores.edge_consistency,
            overall_score: report.overall_score,
            is_likely_forged: report.is_likely_forged,
            confidence: report.confidence,
        }
    }
}

impl JsonReport {
    pub fn success(report: &AnalysisReport) -> Self {
        Self {
            success: true,
            analysis: Some(AnalysisSection::from(report)),
            metadata: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            metadata: None,
            error: Some(message.into()),
        }
    }

    /// Attaches the optional non-scoring metadata section.
    pub fn with_metadata(mut self, summary: &MetadataSummary) -> Self {
        self.metadata = Some(MetadataSection {
            camera: summary
                .camera_model
                .clone()
                .or_else(|| summary.camera_make.clone()),
            software: summary.software.clone(),
            indicators: summary.indicators.clone(),
        });
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
