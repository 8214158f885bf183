use anyhow::Result;
use env_logger::Env;

use modbus_holding_reader::cli::{build_cli, handle_command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let default_level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).try_init()?;

    let code = handle_command(&matches).await;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
