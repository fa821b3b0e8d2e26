//! Statistics generation from the listing database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the SQLite sink's tables.

use crate::output::traits::SinkResult;
use crate::record::UNKNOWN;
use rusqlite::{params, Connection, OptionalExtension};

/// Harvest statistics summary
#[derive(Debug, Clone, Default)]
pub struct ListingStatistics {
    /// Total number of distinct listings stored
    pub total_listings: u64,

    /// Listing count per listing type, largest first
    pub by_listing_type: Vec<(String, u64)>,

    /// Listing count per property type, largest first
    pub by_property_type: Vec<(String, u64)>,

    /// Average numeric price per listing type (listings with a figure only)
    pub average_price: Vec<(String, f64)>,

    /// Listings stored without a contact number
    pub without_contact: u64,

    /// Number of recorded runs
    pub total_runs: u64,

    /// Start time and status of the latest run
    pub latest_run: Option<(String, String)>,
}

fn grouped_counts(conn: &Connection, column: &str) -> rusqlite::Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {col}, COUNT(*) FROM listings GROUP BY {col} ORDER BY COUNT(*) DESC, {col}",
        col = column
    ))?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?;
    rows.collect()
}

/// Loads statistics from the listing database
///
/// # Arguments
///
/// * `conn` - An open connection with the listing schema
///
/// # Returns
///
/// * `Ok(ListingStatistics)` - Successfully loaded statistics
/// * `Err(SinkError)` - Failed to query statistics
pub fn load_statistics(conn: &Connection) -> SinkResult<ListingStatistics> {
    let total_listings: i64 = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;

    let by_listing_type = grouped_counts(conn, "listing_type")?;
    let by_property_type = grouped_counts(conn, "property_type")?;

    let average_price = {
        let mut stmt = conn.prepare(
            "SELECT listing_type, AVG(price_value) FROM listings
             WHERE price_value IS NOT NULL GROUP BY listing_type ORDER BY listing_type",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<(String, f64)>>>()?
    };

    let without_contact: i64 = conn.query_row(
        "SELECT COUNT(*) FROM listings WHERE contact = ?1 OR contact = ''",
        params![UNKNOWN],
        |row| row.get(0),
    )?;

    let total_runs: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
    let latest_run = conn
        .query_row(
            "SELECT started_at, status FROM runs ORDER BY id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(ListingStatistics {
        total_listings: total_listings as u64,
        by_listing_type,
        by_property_type,
        average_price,
        without_contact: without_contact as u64,
        total_runs: total_runs as u64,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ListingStatistics) {
    println!("=== Listing Statistics ===\n");

    println!("Overview:");
    println!("  Total listings: {}", stats.total_listings);
    println!("  Runs recorded: {}", stats.total_runs);
    if let Some((started_at, status)) = &stats.latest_run {
        println!("  Latest run: {} ({})", started_at, status);
    }
    println!();

    println!("Listings by Type:");
    for (listing_type, count) in &stats.by_listing_type {
        println!("  {}: {}", listing_type, count);
    }
    println!();

    println!("Listings by Property Type:");
    for (property_type, count) in &stats.by_property_type {
        let percentage = if stats.total_listings > 0 {
            (*count as f64 / stats.total_listings as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", property_type, count, percentage);
    }
    println!();

    if !stats.average_price.is_empty() {
        println!("Average Price:");
        for (listing_type, average) in &stats.average_price {
            println!("  {}: {:.0}", listing_type, average);
        }
        println!();
    }

    println!(
        "Missing Contact: {} / {} listings",
        stats.without_contact, stats.total_listings
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::files::test_records::record;
    use crate::output::{Sink, SqliteSink};
    use crate::record::PropertyType;

    #[test]
    fn test_statistics_from_flushed_records() {
        let sink = SqliteSink::open_in_memory("hash").unwrap();

        let mut land = record("https://jiji.ng/land.html", "sale");
        land.property_type = PropertyType::Land;
        land.price = "Negotiable".to_string();
        land.contact = UNKNOWN.to_string();

        let records = vec![
            record("https://jiji.ng/a.html", "sale"),
            record("https://jiji.ng/b.html", "rent"),
            land,
        ];
        sink.flush(&records, "mixed_final").unwrap();

        let stats = sink.with_connection(load_statistics).unwrap();

        assert_eq!(stats.total_listings, 3);
        assert_eq!(
            stats.by_listing_type,
            vec![("sale".to_string(), 2), ("rent".to_string(), 1)]
        );
        assert_eq!(stats.by_property_type[0], ("Duplex".to_string(), 2));
        assert_eq!(stats.without_contact, 1);
        assert_eq!(stats.total_runs, 1);
        assert_eq!(
            stats.average_price,
            vec![
                ("rent".to_string(), 85_000_000.0),
                ("sale".to_string(), 85_000_000.0)
            ]
        );
        assert_eq!(stats.latest_run.map(|(_, status)| status).as_deref(), Some("running"));
    }

    #[test]
    fn test_statistics_empty_database() {
        let sink = SqliteSink::open_in_memory("hash").unwrap();
        let stats = sink.with_connection(load_statistics).unwrap();
        assert_eq!(stats.total_listings, 0);
        assert!(stats.by_listing_type.is_empty());
        assert!(stats.average_price.is_empty());
    }
}
