//! File snapshot sinks
//!
//! Each flush writes a complete snapshot to `<dir>/<label>_<run-stamp>.<ext>`.
//! A later flush with the same label overwrites the earlier file.

use crate::output::traits::{Sink, SinkResult};
use crate::record::PropertyRecord;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Separator between image links in a CSV cell
pub const IMAGE_LINK_SEPARATOR: &str = " | ";

/// Local-time stamp identifying one harvest run in file names
pub fn run_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn snapshot_path(directory: &Path, label: &str, stamp: &str, extension: &str) -> PathBuf {
    directory.join(format!("{}_{}.{}", label, stamp, extension))
}

/// Flat CSV row; image links are joined into one cell
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    source: &'a str,
    listing_type: &'a str,
    listing_url: &'a str,
    title: &'a str,
    price: &'a str,
    description: &'a str,
    location: &'a str,
    size_sqm: &'a str,
    bedrooms: &'a str,
    bathrooms: &'a str,
    furnishing_status: &'a str,
    agent_name: &'a str,
    contact: &'a str,
    image_links: String,
    property_description: &'a str,
    property_type: &'static str,
    listing_date: &'a str,
    price_per_sqm: &'a str,
}

impl<'a> From<&'a PropertyRecord> for CsvRow<'a> {
    fn from(record: &'a PropertyRecord) -> Self {
        Self {
            source: &record.source,
            listing_type: &record.listing_type,
            listing_url: &record.listing_url,
            title: &record.title,
            price: &record.price,
            description: &record.description,
            location: &record.location,
            size_sqm: &record.size_sqm,
            bedrooms: &record.bedrooms,
            bathrooms: &record.bathrooms,
            furnishing_status: &record.furnishing_status,
            agent_name: &record.agent_name,
            contact: &record.contact,
            image_links: record.image_links.join(IMAGE_LINK_SEPARATOR),
            property_description: &record.property_description,
            property_type: record.property_type.label(),
            listing_date: &record.listing_date,
            price_per_sqm: &record.price_per_sqm,
        }
    }
}

/// Writes CSV snapshots
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
    stamp: String,
}

impl CsvSink {
    /// Creates the output directory if needed and captures the run stamp
    pub fn new(directory: impl Into<PathBuf>) -> SinkResult<Self> {
        Self::with_stamp(directory, run_stamp())
    }

    pub fn with_stamp(directory: impl Into<PathBuf>, stamp: impl Into<String>) -> SinkResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            stamp: stamp.into(),
        })
    }

    /// Path a flush under `label` writes to
    pub fn path_for(&self, label: &str) -> PathBuf {
        snapshot_path(&self.directory, label, &self.stamp, "csv")
    }
}

impl Sink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn flush(&self, records: &[PropertyRecord], label: &str) -> SinkResult<()> {
        let path = self.path_for(label);
        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(CsvRow::from(record))?;
        }
        writer.flush()?;

        tracing::info!(path = %path.display(), records = records.len(), "Wrote CSV snapshot");
        Ok(())
    }
}

/// Writes pretty-printed JSON snapshots
#[derive(Debug, Clone)]
pub struct JsonSink {
    directory: PathBuf,
    stamp: String,
}

impl JsonSink {
    pub fn new(directory: impl Into<PathBuf>) -> SinkResult<Self> {
        Self::with_stamp(directory, run_stamp())
    }

    pub fn with_stamp(directory: impl Into<PathBuf>, stamp: impl Into<String>) -> SinkResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            stamp: stamp.into(),
        })
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        snapshot_path(&self.directory, label, &self.stamp, "json")
    }
}

impl Sink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    fn flush(&self, records: &[PropertyRecord], label: &str) -> SinkResult<()> {
        let path = self.path_for(label);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;

        tracing::info!(path = %path.display(), records = records.len(), "Wrote JSON snapshot");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_records {
    use crate::record::{PropertyRecord, PropertyType};

    pub fn record(url: &str, listing_type: &str) -> PropertyRecord {
        PropertyRecord {
            source: "Jiji".to_string(),
            listing_type: listing_type.to_string(),
            listing_url: url.to_string(),
            title: "4 Bedroom Duplex".to_string(),
            price: "₦85000000".to_string(),
            description: "Newly built, Lekki".to_string(),
            location: "Lekki Phase 1".to_string(),
            size_sqm: "500".to_string(),
            bedrooms: "4".to_string(),
            bathrooms: "5".to_string(),
            furnishing_status: "Furnished".to_string(),
            agent_name: "Chidi Okafor".to_string(),
            contact: "+2348031234567".to_string(),
            image_links: vec![
                "https://pictures.jijistatic.net/1.jpg".to_string(),
                "https://pictures.jijistatic.net/2.jpg".to_string(),
            ],
            property_description: "Brand new duplex in Ọ̀gbà estate".to_string(),
            property_type: PropertyType::Duplex,
            listing_date: "3 days ago".to_string(),
            price_per_sqm: "170000.0".to_string(),
        }
    }
}
