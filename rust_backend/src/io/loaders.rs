use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::core::FixtureRecord;
use crate::models::PhotometricFile;
use crate::parsing::parse_ies;

/// File-based entry points for hosts that hand the crate paths instead of text.
pub struct PhotometryLoader;

impl PhotometryLoader {
    /// Load and parse an IES LM-63 file.
    ///
    /// Manufacturer files are not always UTF-8 (Latin-1 degree signs and
    /// trademarks in header keywords are common), so invalid bytes are
    /// replaced rather than rejected.
    pub fn load_ies_file(path: &Path) -> Result<PhotometricFile> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read IES file {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);

        let file = parse_ies(&text)
            .with_context(|| format!("Failed to parse IES file {}", path.display()))?;
        log::debug!(
            "loaded {} ({} x {} candela table, peak {} cd)",
            path.display(),
            file.horizontal_angles().len(),
            file.vertical_angles().len(),
            file.max_candela()
        );
        Ok(file)
    }

    /// Load an IES file ready to be shared between fixtures.
    pub fn load_shared_ies_file(path: &Path) -> Result<Arc<PhotometricFile>> {
        Self::load_ies_file(path).map(Arc::new)
    }

    /// Load a JSON array of fixture catalog records.
    pub fn load_fixture_catalog(path: &Path) -> Result<Vec<FixtureRecord>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture catalog {}", path.display()))?;
        Self::load_fixture_catalog_str(&content).context("Failed to parse fixture catalog")
    }

    /// Parse a JSON array of fixture catalog records.
    pub fn load_fixture_catalog_str(json_str: &str) -> Result<Vec<FixtureRecord>> {
        let deserializer = &mut serde_json::Deserializer::from_str(json_str);
        let records: Vec<FixtureRecord> = serde_path_to_error::deserialize(deserializer)
            .map_err(|e| {
                anyhow::anyhow!("Invalid fixture record at '{}': {}", e.path(), e.inner())
            })?;

        for record in &records {
            if !(record.ppf > 0.0) {
                anyhow::bail!("Fixture '{}' has non-positive PPF {}", record.name, record.ppf);
            }
        }
        Ok(records)
    }
}
