/*! Command catalog: pure functions building the ASCII payload for each
defined operation, plus the cycle-timing derivation helpers.

Every builder validates its parameters before returning, so a caller
never transmits an out-of-range command.
*/
use crate::error::{Error, Result};

/// I/O type letter distinguishing the three addressable output/input
/// families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    /// Solid-state relay output (`C`).
    Ssr,
    /// Opto-isolated output (`D`).
    Opto,
    /// Push-button input (`P`).
    PushButton,
}

impl IoType {
    fn letter(self) -> char {
        match self {
            IoType::Ssr => 'C',
            IoType::Opto => 'D',
            IoType::PushButton => 'P',
        }
    }

    fn max_num(self) -> u32 {
        match self {
            IoType::Ssr | IoType::Opto => 4,
            IoType::PushButton => 2,
        }
    }
}

fn validate_io_num(io_type: IoType, n: u32) -> Result<()> {
    if n == 0 || n > io_type.max_num() {
        return Err(Error::UnexpectedIONum(n));
    }
    Ok(())
}

fn validate_alarm_or_probe_num(n: u32) -> Result<()> {
    if n == 0 || n > 4 {
        return Err(Error::UnexpectedIONum(n));
    }
    Ok(())
}

fn validate_input_pulse_num(n: u32) -> Result<()> {
    if n == 0 || n > 2 {
        return Err(Error::UnexpectedIONum(n));
    }
    Ok(())
}

fn bit(b: bool) -> char {
    if b { '1' } else { '0' }
}

/// Render an `HH:MM:SS` time-of-day string.
pub fn time_string(h: u32, m: u32, s: u32) -> String {
    format!("{h:02}:{m:02}:{s:02}")
}

/// Render a `Mon DD YYYY` date string using English three-letter month
/// abbreviations, matching the device's date parser.
pub fn date_string(year: i32, month: u32, day: u32) -> Result<String> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let idx = month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
        .ok_or(Error::UnexpectedIONum(month))?;
    Ok(format!("{idx} {day:02} {year:04}"))
}

/// Cycles-per-day values the device understands, in descending order.
pub const CYCLE_OPTIONS: [u32; 8] = [48, 24, 12, 6, 4, 3, 2, 1];

/// Snap an arbitrary cycles-per-day value to the nearest element of
/// [`CYCLE_OPTIONS`], breaking ties toward the larger candidate.
pub fn nearest_cycle(c: u32) -> u32 {
    CYCLE_OPTIONS
        .iter()
        .copied()
        .min_by_key(|&opt| {
            let dist = (opt as i64 - c as i64).abs();
            // Ties broken toward the larger option: encode distance
            // with a tiny bias against smaller options.
            (dist, std::cmp::Reverse(opt))
        })
        .expect("CYCLE_OPTIONS is non-empty")
}

/// Derive the `HH:MM:SS` interval string encoding `c` cycles per day,
/// after snapping `c` to the nearest supported option.
pub fn generate_cycles_per_day(c: u32) -> String {
    let snapped = nearest_cycle(c);
    if snapped == 1 {
        return "23:59:59".to_string();
    }
    let total_seconds = (24 * 3600) / snapped;
    time_string(total_seconds / 3600, (total_seconds % 3600) / 60, total_seconds % 60)
}

/// Inverse of [`generate_cycles_per_day`]: recover the cycles-per-day
/// value a device-formatted interval string encodes.
pub fn cycles_per_day(time: &str) -> Option<u32> {
    let seconds = parse_hms_seconds(time)?;
    if seconds >= 24 * 3600 - 1 {
        return Some(1);
    }
    if seconds == 0 {
        return None;
    }
    Some(nearest_cycle((24 * 3600) / seconds))
}

/// Split a device-formatted `HH:MM:SS` interval string into its
/// `(hour, minute, second)` components.
pub fn parse_time_components(time: &str) -> Option<(u32, u32, u32)> {
    let mut parts = time.splitn(3, ':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let s: u32 = parts.next()?.parse().ok()?;
    Some((h, m, s))
}

/// Derive the `00:MM:00` interval string encoding a duration of `d`
/// minutes, `d` in `1..=15`.
pub fn generate_cycle_duration(d: u32) -> Result<String> {
    if d == 0 || d > 15 {
        return Err(Error::UnexpectedIONum(d));
    }
    Ok(time_string(0, d, 0))
}

/// Inverse of [`generate_cycle_duration`]: recover `d` from a
/// device-formatted interval string.
pub fn cycle_duration_minutes(time: &str) -> Option<u32> {
    let seconds = parse_hms_seconds(time)?;
    Some((seconds % 3600) / 60)
}

fn parse_hms_seconds(time: &str) -> Option<u32> {
    let (h, m, s) = parse_time_components(time)?;
    Some(h * 3600 + m * 60 + s)
}

// --- Command builders. Each returns the ASCII payload, unframed. ---

/// `TGT`
pub fn get_system_time() -> String {
    "TGT".to_string()
}

/// `TGR`
pub fn get_rtc_time() -> String {
    "TGR".to_string()
}

/// `TS<date>|<time>`
pub fn set_rtc_time(date: &str, time: &str) -> String {
    format!("TS{date}|{time}")
}

/// `TGC`
pub fn get_rtc_config_flag() -> String {
    "TGC".to_string()
}

/// `TGP`
pub fn get_rtc_parse_flag() -> String {
    "TGP".to_string()
}

/// `TGS`
pub fn get_system_time_flag() -> String {
    "TGS".to_string()
}

/// `EGM`
pub fn get_master_alarm_enable() -> String {
    "EGM".to_string()
}

/// `ESM<0|1>`
pub fn set_master_alarm_enable(enable: bool) -> String {
    format!("ESM{}", bit(enable))
}

/// `EGK`
pub fn get_clear_eeprom_count() -> String {
    "EGK".to_string()
}

/// `ESA`
pub fn clear_eeprom() -> String {
    "ESA".to_string()
}

/// `EGX`
pub fn get_set_expected_io_count() -> String {
    "EGX".to_string()
}

/// `ESX<C><n>`
pub fn set_expected_io_state(io_type: IoType, n: u32) -> Result<String> {
    validate_io_num(io_type, n)?;
    Ok(format!("ESX{}{n}", io_type.letter()))
}

/// `KGN`
pub fn get_number_probes() -> String {
    "KGN".to_string()
}

/// `KGR<n>`
pub fn get_probe_recognition(n: u32) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("KGR{n}"))
}

/// `KGC<n>`
pub fn get_probe_reading(n: u32) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("KGC{n}"))
}

/// `AGR<n>`
pub fn get_analog_reading(n: u32) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("AGR{n}"))
}

/// `WGS`
pub fn get_wifi_status() -> String {
    "WGS".to_string()
}

/// `WGI`
pub fn get_wifi_ip_address() -> String {
    "WGI".to_string()
}

/// `WGT`
pub fn get_wifi_rssi() -> String {
    "WGT".to_string()
}

/// `<C|D|P>G<n>`
pub fn get_io_state(io_type: IoType, n: u32) -> Result<String> {
    validate_io_num(io_type, n)?;
    Ok(format!("{}G{n}", io_type.letter()))
}

/// `<C|D>S<n><0|1>`
pub fn set_io_state(io_type: IoType, n: u32, state: bool) -> Result<String> {
    if io_type == IoType::PushButton {
        return Err(Error::UnexpectedIOType('P'));
    }
    validate_io_num(io_type, n)?;
    Ok(format!("{}S{n}{}", io_type.letter(), bit(state)))
}

/// `IG<n>`, `n` in `{1,2}`.
pub fn get_input_pulse_count(n: u32) -> Result<String> {
    validate_input_pulse_num(n)?;
    Ok(format!("IG{n}"))
}

/// `LG<n>`
pub fn get_opto_pulse_count(n: u32) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("LG{n}"))
}

/// `LS<n><k>`, `k` in `1..=9`.
pub fn pulse_opto_output(n: u32, k: u32) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    if k == 0 || k > 9 {
        return Err(Error::InvalidPulseAmount(k));
    }
    Ok(format!("LS{n}{k}"))
}

/// `EGC<n><0|1>`
pub fn get_output_alarm(n: u32, on_off: bool) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("EGC{n}{}", bit(on_off)))
}

/// `ESC<n><on_off><enable>|<time>`
pub fn set_output_alarm(n: u32, on_off: bool, enable: bool, time: &str) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("ESC{n}{}{}|{time}", bit(on_off), bit(enable)))
}

/// `EGO<n>`
pub fn get_output_alarm_mode(n: u32) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("EGO{n}"))
}

/// `ESO<n><0|1>`
pub fn set_output_alarm_mode(n: u32, mode: bool) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("ESO{n}{}", bit(mode)))
}

/// `EST<n><cycle_or_dur><enable>|<time>`
pub fn set_output_timer(n: u32, cycle_or_dur: bool, enable: bool, time: &str) -> Result<String> {
    validate_alarm_or_probe_num(n)?;
    Ok(format!("EST{n}{}{}|{time}", bit(cycle_or_dur), bit(enable)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_io_state_matches_scenario() {
        assert_eq!(get_io_state(IoType::Ssr, 3).unwrap(), "CG3");
    }

    #[test]
    fn set_rtc_time_matches_scenario() {
        let date = date_string(1971, 1, 1).unwrap();
        let time = time_string(10, 0, 0);
        assert_eq!(set_rtc_time(&date, &time), "TSJan 01 1971|10:00:00");
    }

    #[test]
    fn io_num_out_of_range_rejected_before_transmit() {
        assert!(matches!(
            get_io_state(IoType::Ssr, 5),
            Err(Error::UnexpectedIONum(5))
        ));
        assert!(matches!(
            get_input_pulse_count(3),
            Err(Error::UnexpectedIONum(3))
        ));
    }

    #[test]
    fn push_button_cannot_be_set() {
        assert!(matches!(
            set_io_state(IoType::PushButton, 1, true),
            Err(Error::UnexpectedIOType('P'))
        ));
    }

    #[test]
    fn pulse_boundary_behavior() {
        assert_eq!(pulse_opto_output(1, 9).unwrap(), "LS19");
        assert!(matches!(
            pulse_opto_output(1, 0),
            Err(Error::InvalidPulseAmount(0))
        ));
        assert!(matches!(
            pulse_opto_output(1, 10),
            Err(Error::InvalidPulseAmount(10))
        ));
    }

    #[test]
    fn cycles_per_day_roundtrip() {
        for c in [48, 24, 12, 6, 4, 3, 2, 1, 50, 40, 5] {
            let generated = generate_cycles_per_day(c);
            let recovered = cycles_per_day(&generated).unwrap();
            assert_eq!(recovered, nearest_cycle(c), "c={c} generated={generated}");
        }
    }

    #[test]
    fn cycle_one_is_special_cased() {
        assert_eq!(generate_cycles_per_day(1), "23:59:59");
    }

    #[test]
    fn cycle_duration_roundtrip() {
        for d in 1..=15u32 {
            let generated = generate_cycle_duration(d).unwrap();
            assert_eq!(generated, format!("00:{d:02}:00"));
            assert_eq!(cycle_duration_minutes(&generated).unwrap(), d);
        }
    }

    #[test]
    fn cycle_duration_out_of_range() {
        assert!(generate_cycle_duration(0).is_err());
        assert!(generate_cycle_duration(16).is_err());
    }

    #[test]
    fn parse_time_components_splits_hms() {
        assert_eq!(parse_time_components("10:05:03"), Some((10, 5, 3)));
        assert_eq!(parse_time_components("garbage"), None);
    }

    #[test]
    fn cycles_per_day_roundtrip_holds_for_random_inputs() {
        use rand::Rng;
        let mut rng = rand::rng();
        for _ in 0..200 {
            let c = rng.random_range(1..=200u32);
            let generated = generate_cycles_per_day(c);
            let recovered = cycles_per_day(&generated).unwrap();
            assert_eq!(recovered, nearest_cycle(c), "c={c} generated={generated}");
        }
    }
}
