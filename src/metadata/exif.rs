use std::{fs::File, io::BufReader, path::Path};

use exif::{In, Reader, Tag};

use crate::error::Result;

/// Non-scoring EXIF summary. Indicators feed the optional metadata
/// section of the report; they never touch the suspicion scores.
#[derive(Debug, Clone, Default)]
pub struct MetadataSummary {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub software: Option<String>,
    pub captured_at: Option<String>,
    pub indicators: Vec<String>,
}

pub struct ExifInspector;

impl ExifInspector {
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<MetadataSummary> {
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);

        match Reader::new().read_from_container(&mut reader) {
            Ok(data) => Ok(Self::summarize(&data)),
            // Absent or unparsable EXIF is worth noting, not an error.
            Err(_) => Ok(MetadataSummary {
                indicators: vec!["no EXIF data present".into()],
                ..MetadataSummary::default()
            }),
        }
    }

    fn summarize(data: &exif::Exif) -> MetadataSummary {
        let field = |tag: Tag| {
            data.get_field(tag, In::PRIMARY)
                .map(|f| f.display_value().to_string())
        };

        let software = field(Tag::Software);
        let captured_at = field(Tag::DateTime);
        let datetime_original = field(Tag::DateTimeOriginal);
        let datetime_digitized = field(Tag::DateTimeDigitized);

        let mut indicators = Vec::new();

        if let Some(ref name) = software {
            let lowered = name.to_lowercase();
            if lowered.contains("photoshop")
                || lowered.contains("gimp")
                || lowered.contains("paint")
            {
                indicators.push(format!("edited with: {name}"));
            }
        }

        if datetime_original.is_none() && captured_at.is_some() {
            indicators.push("original capture time missing (may be stripped)".into());
        }

        if let (Some(original), Some(digitized)) = (&datetime_original, &datetime_digitized) {
            if original != digitized {
                indicators.push("capture and digitization times disagree".into());
            }
        }

        MetadataSummary {
            camera_make: field(Tag::Make),
            camera_model: field(Tag::Model),
            software,
            captured_at,
            indicators,
        }
    }
}
