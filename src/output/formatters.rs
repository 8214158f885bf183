use chrono::Utc;

use crate::config::OutputFormat;
use crate::services::RegisterReading;

pub trait DataFormatter: Send + Sync {
    fn format_reading(&self, reading: &RegisterReading) -> String;
    fn format_header(&self) -> String;

    fn format(&self, reading: &RegisterReading) -> String {
        let mut output = self.format_header();
        output.push_str(&self.format_reading(reading));
        output
    }
}

pub fn formatter_for(format: OutputFormat) -> Box<dyn DataFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
        OutputFormat::Hex => Box::new(HexFormatter),
    }
}

pub struct ConsoleFormatter;

impl DataFormatter for ConsoleFormatter {
    fn format_reading(&self, reading: &RegisterReading) -> String {
        let mut output = format!(
            "🔹 {}:{} unit {} ({} registers):\n",
            reading.host,
            reading.port,
            reading.unit_id,
            reading.values.len()
        );

        for (address, value) in reading.addressed_values() {
            output.push_str(&format!("{:>5}: {}\n", address, value));
        }
        output
    }

    fn format_header(&self) -> String {
        format!("🚀 Holding Registers - {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

pub struct JsonFormatter;

impl DataFormatter for JsonFormatter {
    fn format_reading(&self, reading: &RegisterReading) -> String {
        let registers: Vec<serde_json::Value> = reading
            .addressed_values()
            .map(|(address, value)| serde_json::json!({ "address": address, "value": value }))
            .collect();

        let json_data = serde_json::json!({
            "host": reading.host,
            "port": reading.port,
            "unit_id": reading.unit_id,
            "start_address": reading.start_address,
            "timestamp": reading.timestamp.to_rfc3339(),
            "values": reading.values,
            "registers": registers,
        });

        serde_json::to_string_pretty(&json_data).unwrap_or_default()
    }

    fn format_header(&self) -> String {
        String::new() // JSON doesn't need headers
    }
}

pub struct CsvFormatter;

impl DataFormatter for CsvFormatter {
    fn format_reading(&self, reading: &RegisterReading) -> String {
        let mut csv = String::new();
        let timestamp = reading.timestamp.to_rfc3339();

        for (address, value) in reading.addressed_values() {
            csv.push_str(&format!("{},{},{},{}\n", reading.unit_id, address, value, timestamp));
        }

        csv
    }

    fn format_header(&self) -> String {
        "Unit,Address,Value,Timestamp\n".to_string()
    }
}

pub struct HexFormatter;

impl DataFormatter for HexFormatter {
    fn format_reading(&self, reading: &RegisterReading) -> String {
        let mut output = format!("🔍 Unit {} Hex Data:\n", reading.unit_id);

        for (address, value) in reading.addressed_values() {
            output.push_str(&format!("{:>5}: 0x{:04X} ({})\n", address, value, value));
        }
        output.push_str(&format!(
            "Timestamp: {}\n",
            reading.timestamp.format("%Y-%m-%d %H:%M:%S%.3f")
        ));
        output
    }

    fn format_header(&self) -> String {
        format!("🔍 Hex Data Output - {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RegisterReading {
        RegisterReading {
            host: "10.0.0.5".to_string(),
            port: 502,
            unit_id: 1,
            start_address: 100,
            timestamp: Utc::now(),
            values: vec![0x0001, 0xBEEF],
        }
    }

    #[test]
    fn test_json_output() {
        let output = JsonFormatter.format(&sample());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["values"], serde_json::json!([1, 48879]));
        assert_eq!(parsed["registers"][1]["address"], 101);
    }

    #[test]
    fn test_csv_output() {
        let output = CsvFormatter.format(&sample());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Unit,Address,Value,Timestamp");
        assert!(lines[1].starts_with("1,100,1,"));
        assert!(lines[2].starts_with("1,101,48879,"));
    }

    #[test]
    fn test_hex_output() {
        let output = HexFormatter.format_reading(&sample());
        assert!(output.contains("  101: 0xBEEF (48879)"));
    }

    #[test]
    fn test_formatter_for_console() {
        let output = formatter_for(OutputFormat::Console).format_reading(&sample());
        assert!(output.contains("10.0.0.5:502"));
        assert!(output.contains("  100: 1"));
    }
}
