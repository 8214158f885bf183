use clap::{Arg, ArgMatches, Command};
use log::{debug, error, info};

use crate::config::ReaderConfig;
use crate::output::formatter_for;
use crate::services;
use crate::utils::error::ModbusError;

pub fn build_cli() -> Command {
    Command::new("modbus-read")
        .version(crate::VERSION)
        .about("Read a block of holding registers from a Modbus TCP device once")
        .arg(
            Arg::new("host")
                .long("host")
                .short('H')
                .value_name("HOST")
                .required(true)
                .help("Modbus TCP server address (IP or hostname)"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .value_name("PORT")
                .default_value("502")
                .help("Modbus TCP server port"),
        )
        .arg(
            Arg::new("unit-id")
                .long("unit-id")
                .short('u')
                .value_name("ID")
                .default_value("1")
                .help("Unit identifier placed in the MBAP header"),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .short('a')
                .value_name("ADDR")
                .default_value("0")
                .help("First holding register to read (0-65535)"),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .short('c')
                .value_name("N")
                .default_value("10")
                .help("Number of registers to read (1-125)"),
        )
        .arg(
            Arg::new("connect-timeout-ms")
                .long("connect-timeout-ms")
                .value_name("MS")
                .default_value("3000")
                .help("Connect timeout in milliseconds"),
        )
        .arg(
            Arg::new("read-timeout-ms")
                .long("read-timeout-ms")
                .value_name("MS")
                .default_value("3000")
                .help("Response timeout in milliseconds"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("FORMAT")
                .default_value("console")
                .value_parser(["console", "json", "csv", "hex"])
                .help("Output format for the register values"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .help("Log level when RUST_LOG is not set"),
        )
}

/// Run the read cycle described by `matches` and return the process exit code.
pub async fn handle_command(matches: &ArgMatches) -> i32 {
    let config = match ReaderConfig::from_matches(matches) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            return e.exit_code();
        }
    };

    match execute(&config).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            // already reported where it happened
            debug!("Read from {}:{} failed ({:?}): {}", config.host, config.port, e.kind(), e);
            e.exit_code()
        }
    }
}

/// One read cycle rendered in the configured output format.
pub async fn execute(config: &ReaderConfig) -> Result<String, ModbusError> {
    info!(
        "🔍 Reading {} holding registers at {} from {}:{}",
        config.count, config.start_address, config.host, config.port
    );

    let reading = services::run(config).await?;
    Ok(formatter_for(config.format).format(&reading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_log;

    #[test]
    fn test_cli_requires_host() {
        assert!(build_cli().try_get_matches_from(["modbus-read"]).is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["modbus-read", "--host", "plc.local"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("port").unwrap(), "502");
        assert_eq!(matches.get_one::<String>("address").unwrap(), "0");
        assert_eq!(matches.get_one::<String>("count").unwrap(), "10");
        assert_eq!(matches.get_one::<String>("format").unwrap(), "console");
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let result = build_cli().try_get_matches_from(["modbus-read", "--host", "plc", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_refused_connect_logs_one_error_line() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        drop(listener);

        let matches = build_cli()
            .try_get_matches_from(["modbus-read", "--host", "127.0.0.1", "--port", port.as_str()])
            .unwrap();
        let captured = test_log::capture(handle_command(&matches)).await;

        assert_eq!(captured.value, 3);
        assert_eq!(captured.error_lines(), 1);
    }

    #[tokio::test]
    async fn test_handle_command_invalid_count_is_usage_error() {
        let matches = build_cli()
            .try_get_matches_from(["modbus-read", "--host", "plc", "--count", "0"])
            .unwrap();
        assert_eq!(handle_command(&matches).await, 2);
    }
}
