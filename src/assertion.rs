/*! Post-set assertions.

The Set FSM evaluates one of these against the parsed read-back fields
to decide whether the device's state actually matches what was
requested.
*/
use crate::decode::FieldValue;

/// A point in time relative to the alarm/RTC epoch reference
/// (1971-01-01), expressed the way the device reports it: hour,
/// minute, second, with an optional enable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSpec {
    /// Whether the alarm is enabled.
    pub enable: bool,
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
}

impl AlarmSpec {
    fn seconds_since_midnight(self) -> i64 {
        self.hour as i64 * 3600 + self.minute as i64 * 60 + self.second as i64
    }
}

/// A full calendar timestamp, as returned by the RTC/system-time Get
/// operations (year, month, day, hour, minute, second).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Year, e.g. 1971.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
}

impl Timestamp {
    /// Seconds since the Unix epoch, via `chrono`.
    pub fn epoch_seconds(self) -> Option<i64> {
        chrono::NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|d| {
                d.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            })
            .map(|dt| dt.and_utc().timestamp())
    }
}

/// The predicate a Set FSM evaluates against its parsed read-back
/// fields.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Read-back field (index 0) must equal the given bool.
    EqBool(bool),
    /// Read-back field (index 0) must equal the given u16.
    EqU16(u16),
    /// Read-back fields decode to a [`Timestamp`] whose epoch must be
    /// within `tolerance_secs` of the expected timestamp's epoch.
    TimeWithinTolerance(Timestamp, i64),
    /// Read-back fields decode to an [`AlarmSpec`] that must equal the
    /// expected spec's enable flag exactly, and whose time-of-day must
    /// be within `tolerance_secs` seconds.
    AlarmEquals(AlarmSpec, i64),
    /// Read-back field (index 0, a u16 counter) must equal
    /// `prior_value + delta`.
    CounterIncrement { prior_value: u16, delta: u16 },
}

/// Evaluate `assertion` against the ordered list of decoded fields
/// from a Set FSM's verify read-back.
pub fn evaluate(assertion: &Assertion, fields: &[FieldValue]) -> bool {
    match assertion {
        Assertion::EqBool(expected) => fields.first().map(|f| f.as_bool()) == Some(*expected),
        Assertion::EqU16(expected) => fields.first().map(|f| f.as_u16()) == Some(*expected),
        Assertion::TimeWithinTolerance(expected, tolerance) => {
            match (timestamp_epoch_from_fields(fields), expected.epoch_seconds()) {
                (Some(got), Some(want)) => (got - want).abs() <= *tolerance,
                _ => false,
            }
        }
        Assertion::AlarmEquals(expected, tolerance) => match alarm_from_fields(fields) {
            Some(got) => {
                got.enable == expected.enable
                    && (got.seconds_since_midnight() - expected.seconds_since_midnight()).abs()
                        <= *tolerance
            }
            None => false,
        },
        Assertion::CounterIncrement { prior_value, delta } => {
            fields.first().map(|f| f.as_u16()) == Some(prior_value.wrapping_add(*delta))
        }
    }
}

/// Decode the six-field (y,mo,d,h,mi,s) RTC/system-time response into
/// a [`Timestamp`].
pub fn timestamp_from_fields(fields: &[FieldValue]) -> Option<Timestamp> {
    if fields.len() < 6 {
        return None;
    }
    Some(Timestamp {
        year: fields[0].as_u16(),
        month: fields[1].as_byte(),
        day: fields[2].as_byte(),
        hour: fields[3].as_byte(),
        minute: fields[4].as_byte(),
        second: fields[5].as_byte(),
    })
}

/// Decode the four-field (enable,h,mi,s) output-alarm response into an
/// [`AlarmSpec`].
pub fn alarm_from_fields(fields: &[FieldValue]) -> Option<AlarmSpec> {
    if fields.len() < 4 {
        return None;
    }
    Some(AlarmSpec {
        enable: fields[0].as_bool(),
        hour: fields[1].as_byte(),
        minute: fields[2].as_byte(),
        second: fields[3].as_byte(),
    })
}

fn timestamp_epoch_from_fields(fields: &[FieldValue]) -> Option<i64> {
    timestamp_from_fields(fields).and_then(|ts| ts.epoch_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_bool_matches_first_field() {
        assert!(evaluate(&Assertion::EqBool(true), &[FieldValue::Bool(true)]));
        assert!(!evaluate(
            &Assertion::EqBool(true),
            &[FieldValue::Bool(false)]
        ));
    }

    #[test]
    fn counter_increment_by_one() {
        let a = Assertion::CounterIncrement {
            prior_value: 4,
            delta: 1,
        };
        assert!(evaluate(&a, &[FieldValue::U16(5)]));
        assert!(!evaluate(&a, &[FieldValue::U16(6)]));
    }

    #[test]
    fn counter_increment_by_k_pulses() {
        let a = Assertion::CounterIncrement {
            prior_value: 10,
            delta: 9,
        };
        assert!(evaluate(&a, &[FieldValue::U16(19)]));
    }

    #[test]
    fn rtc_time_within_tolerance_exact_match() {
        let want = Timestamp {
            year: 1971,
            month: 1,
            day: 1,
            hour: 10,
            minute: 0,
            second: 0,
        };
        let fields = [
            FieldValue::U16(1971),
            FieldValue::Byte(1),
            FieldValue::Byte(1),
            FieldValue::Byte(10),
            FieldValue::Byte(0),
            FieldValue::Byte(0),
        ];
        assert!(evaluate(&Assertion::TimeWithinTolerance(want, 5), &fields));
    }

    #[test]
    fn rtc_time_outside_tolerance_fails() {
        let want = Timestamp {
            year: 1971,
            month: 1,
            day: 1,
            hour: 10,
            minute: 0,
            second: 0,
        };
        let fields = [
            FieldValue::U16(1971),
            FieldValue::Byte(1),
            FieldValue::Byte(1),
            FieldValue::Byte(10),
            FieldValue::Byte(0),
            FieldValue::Byte(6),
        ];
        assert!(!evaluate(&Assertion::TimeWithinTolerance(want, 5), &fields));
    }

    #[test]
    fn alarm_equals_checks_enable_and_tolerance() {
        let want = AlarmSpec {
            enable: true,
            hour: 8,
            minute: 30,
            second: 0,
        };
        let got = [
            FieldValue::Bool(true),
            FieldValue::Byte(8),
            FieldValue::Byte(30),
            FieldValue::Byte(3),
        ];
        assert!(evaluate(&Assertion::AlarmEquals(want, 5), &got));
        let wrong_enable = [
            FieldValue::Bool(false),
            FieldValue::Byte(8),
            FieldValue::Byte(30),
            FieldValue::Byte(0),
        ];
        assert!(!evaluate(&Assertion::AlarmEquals(want, 5), &wrong_enable));
    }
}
