use anyhow::{anyhow, Result};

use hass_bridge::command;
use hass_bridge::config::Config;
use hass_bridge::helpers::{init_logging, load_dotenv};

const CMD_START: &str = "start";
const CMD_READ_ZEVERSOLAR: &str = "read-zeversolar";
const CMD_READ_HUAWEI: &str = "read-huawei";

fn main() -> Result<()> {
    load_dotenv();
    init_logging();

    let mut args = pico_args::Arguments::from_env();
    let subcommand = args.subcommand()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match subcommand.as_deref() {
        None | Some(CMD_START) => {
            let config = Config::from_env()?;
            runtime.block_on(command::start(config))
        }
        Some(CMD_READ_ZEVERSOLAR) => runtime.block_on(command::read_zeversolar()),
        Some(CMD_READ_HUAWEI) => runtime.block_on(command::read_huawei()),
        Some(other) => Err(anyhow!(
            "Unknown subcommand '{other}'; must be one of \
             '{CMD_START}', '{CMD_READ_ZEVERSOLAR}', '{CMD_READ_HUAWEI}'"
        )),
    }
}
