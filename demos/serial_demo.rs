/*! Smoke-test driver exercising a representative operation sequence
over the serial transport: Wi-Fi status, RTC configuration and
read-back, system time, I/O state, and a probe sweep.
*/
use anyhow::Result;
use clap::Parser;
use log::info;

use ioboard::assertion::Timestamp;
use ioboard::command::IoType;
use ioboard::config::Settings;
use ioboard::operations::Session;
use ioboard::transport::SerialTransport;

#[derive(Parser, Debug)]
#[command(about = "Exercise the I/O board protocol over a serial link")]
struct Opt {
    /// Path to the JSON settings file.
    #[arg(long, default_value = "settings.json")]
    settings: String,

    /// Override the configured serial device path.
    #[arg(long)]
    device: Option<String>,

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
    let device = match &opt.device {
        Some(d) => d.clone(),
        None => settings.resolve_serial_path()?.to_string(),
    };
    info!("opening serial device {device} at {} baud", settings.baud_rate);
    let transport = SerialTransport::new(&device, settings.baud_rate, settings.timeout())?;
    let mut session = Session::new(transport, opt.tx_crc, opt.rx_crc);

    info!("wifi status: {}", session.get_wifi_status()?);
    info!("wifi ip: {:?}", session.get_wifi_ip_address()?);
    info!("wifi rssi: {} dBm", session.get_wifi_rssi()?);

    let now = Timestamp {
        year: 1971,
        month: 1,
        day: 1,
        hour: 10,
        minute: 0,
        second: 0,
    };
    let got = session.config_rtc_time(now)?;
    info!("rtc time after set: {got:?}");
    info!("system time: {:?}", session.get_system_time()?);

    for n in 1..=4u32 {
        let state = session.get_io_state(IoType::Ssr, n)?;
        info!("ssr {n} state: {state}");
    }
    for n in 1..=2u32 {
        info!("push-button {n}: {}", session.get_io_state(IoType::PushButton, n)?);
    }

    let probes = session.get_number_probes()?;
    info!("probes: {probes}");
    for n in 1..=probes.min(4) as u32 {
        if session.get_probe_recognition(n)? {
            info!("probe {n} reading: {:.2} C", session.get_probe_reading(n)?);
        }
    }

    Ok(())
}
