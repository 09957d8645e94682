//! Reading export in text, JSON and CSV
//!
//! Text is meant for a terminal, JSON for re-import and CSV for
//! spreadsheets.

use crate::algorithms::quality::SignalBand;
use crate::api::types::{ApiResult, OutputFormat};
use crate::core::{ConnectionType, Reading, ReadingOrigin};

/// Renders a list of readings
pub trait ReadingFormatter {
    fn format_readings(&self, readings: &[Reading]) -> ApiResult<String>;
}

/// Export `readings` in the requested format
pub fn export_readings(readings: &[Reading], format: OutputFormat) -> ApiResult<String> {
    match format {
        OutputFormat::Text => TextFormatter::new().format_readings(readings),
        OutputFormat::Json => JsonFormatter::pretty().format_readings(readings),
        OutputFormat::Csv => CsvFormatter::new().format_readings(readings),
    }
}

fn connection_label(connection: ConnectionType) -> &'static str {
    match connection {
        ConnectionType::Wifi => "wifi",
        ConnectionType::Cellular => "cellular",
        ConnectionType::Ethernet => "ethernet",
        ConnectionType::Unknown => "unknown",
    }
}

fn origin_label(origin: ReadingOrigin) -> &'static str {
    match origin {
        ReadingOrigin::Local => "local",
        ReadingOrigin::Cloud => "cloud",
    }
}

/// Human-readable text formatter
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// One line per reading instead of a block
    pub compact: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    fn write_reading(&self, output: &mut String, reading: &Reading) {
        let band = SignalBand::from_dbm(reading.signal_dbm);
        if self.compact {
            output.push_str(&format!(
                "{} {:.6},{:.6} {} dBm ({}) {} ms {:.1} Mbps {} [{}]\n",
                reading.captured_at.format("%Y-%m-%d %H:%M:%S"),
                reading.latitude,
                reading.longitude,
                reading.signal_dbm,
                band.label(),
                reading.latency_ms,
                reading.bandwidth_mbps,
                reading.provider_name,
                origin_label(reading.origin),
            ));
            return;
        }

        output.push_str(&format!("Reading {}\n", reading.id));
        output.push_str(&format!("  Captured:  {}\n", reading.captured_at.format("%Y-%m-%d %H:%M:%S UTC")));
        output.push_str(&format!("  Location:  {:.6}°, {:.6}°\n", reading.latitude, reading.longitude));
        output.push_str(&format!(
            "  Signal:    {} dBm ({}, {})\n",
            reading.signal_dbm,
            band.label(),
            band.color().to_hex()
        ));
        output.push_str(&format!("  Quality:   {}%\n", reading.quality_percent));
        output.push_str(&format!("  Latency:   {} ms\n", reading.latency_ms));
        output.push_str(&format!("  Bandwidth: {:.1} Mbps\n", reading.bandwidth_mbps));
        output.push_str(&format!(
            "  Network:   {} ({})\n",
            reading.provider_name,
            connection_label(reading.connection_type)
        ));
        output.push_str(&format!("  Origin:    {}\n", origin_label(reading.origin)));
    }
}

impl ReadingFormatter for TextFormatter {
    fn format_readings(&self, readings: &[Reading]) -> ApiResult<String> {
        let mut output = format!("{} readings\n", readings.len());
        for reading in readings {
            self.write_reading(&mut output, reading);
        }
        Ok(output)
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ReadingFormatter for JsonFormatter {
    fn format_readings(&self, readings: &[Reading]) -> ApiResult<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(readings)?
        } else {
            serde_json::to_string(readings)?
        };
        Ok(json)
    }
}

/// CSV formatter for data logging
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> &'static str {
        "id,captured_at,latitude,longitude,signal_dbm,quality_percent,latency_ms,bandwidth_mbps,connection_type,provider,origin"
    }

    /// Format one reading as a CSV row
    pub fn format_row(&self, reading: &Reading) -> String {
        format!(
            "{},{},{:.6},{:.6},{},{},{},{:.1},{},{},{}",
            reading.id,
            reading.captured_at.to_rfc3339(),
            reading.latitude,
            reading.longitude,
            reading.signal_dbm,
            reading.quality_percent,
            reading.latency_ms,
            reading.bandwidth_mbps,
            connection_label(reading.connection_type),
            escape_field(&reading.provider_name),
            origin_label(reading.origin),
        )
    }
}

impl ReadingFormatter for CsvFormatter {
    fn format_readings(&self, readings: &[Reading]) -> ApiResult<String> {
        let mut lines = Vec::with_capacity(readings.len() + 1);
        if self.include_header {
            lines.push(self.header().to_string());
        }
        lines.extend(readings.iter().map(|r| self.format_row(r)));
        let mut output = lines.join("\n");
        output.push('\n');
        Ok(output)
    }
}

/// Quote a field containing separators or quotes
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn reading(provider: &str) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            latitude: 51.5007,
            longitude: -0.1246,
            signal_dbm: -58,
            latency_ms: 31,
            bandwidth_mbps: 120.25,
            quality_percent: 63,
            connection_type: ConnectionType::Wifi,
            provider_name: provider.to_string(),
            captured_at: Utc.with_ymd_and_hms(2024, 3, 9, 8, 15, 0).unwrap(),
            origin: ReadingOrigin::Local,
        }
    }

    #[test]
    fn test_text_format() {
        let text = TextFormatter::new().format_readings(&[reading("home")]).unwrap();
        assert!(text.starts_with("1 readings"));
        assert!(text.contains("-58 dBm (good, #ffff00)"));
        assert!(text.contains("home (wifi)"));

        assert_eq!(text.lines().count(), 10);

        let compact = TextFormatter::compact().format_readings(&[reading("home"), reading("cafe")]).unwrap();
        assert_eq!(compact.lines().count(), 3);
    }

    #[test]
    fn test_json_format_reloads() {
        let readings = vec![reading("home"), reading("cafe")];
        let json = export_readings(&readings, OutputFormat::Json).unwrap();
        let reloaded: Vec<Reading> = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, readings);
    }

    #[test]
    fn test_csv_format() {
        let one = reading("Cafe, \"Central\"");
        let csv = export_readings(&[one.clone()], OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), 11);
        assert!(lines[1].starts_with(&one.id.to_string()));
        assert!(lines[1].contains("\"Cafe, \"\"Central\"\"\""));
        assert!(lines[1].ends_with(",local"));
    }

    #[test]
    fn test_csv_without_header() {
        let formatter = CsvFormatter { include_header: false };
        let csv = formatter.format_readings(&[]).unwrap();
        assert_eq!(csv, "\n");
    }
}
