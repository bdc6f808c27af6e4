/*! Smoke-test driver exercising a representative operation sequence
over the UDP datagram transport: master-alarm toggling, opto pulse
counting, and expected-IO configuration for all four outputs.
*/
use anyhow::Result;
use clap::Parser;
use log::info;

use ioboard::command::IoType;
use ioboard::config::Settings;
use ioboard::operations::Session;
use ioboard::transport::DatagramTransport;

#[derive(Parser, Debug)]
#[command(about = "Exercise the I/O board protocol over UDP")]
struct Opt {
    /// Path to the JSON settings file.
    #[arg(long, default_value = "settings.json")]
    settings: String,

    /// Enable CRC8 on transmit.
    #[arg(long)]
    tx_crc: bool,

    /// Enable CRC8 on receive.
    #[arg(long)]
    rx_crc: bool,

    /// Verbosity (-v, -vv, -vvv).
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .verbosity(opt.verbose as usize + 1)
        .init()?;

    let settings = Settings::load(&opt.settings)?;
    info!("talking to {} over UDP", settings.peer_addr());
    let transport = DatagramTransport::new(settings.peer_addr(), settings.timeout());
    let mut session = Session::new(transport, opt.tx_crc, opt.rx_crc);

    info!("master alarm was: {}", session.get_master_alarm_enable()?);
    session.config_master_alarm_enable(true)?;
    info!("master alarm now enabled");

    for n in 1..=4u32 {
        session.config_expected_io_state(IoType::Ssr, n)?;
        info!("ssr {n} added to expected-io table, count now {}", session.get_set_expected_io_count()?);
    }

    let before = session.get_opto_pulse_count(1)?;
    let after = session.pulse_opto_output(1, 3)?;
    info!("opto 1 pulse count: {before} -> {after}");

    let eeprom_count = session.clear_eeprom()?;
    info!("eeprom clear count now {eeprom_count}");

    Ok(())
}
