use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Spacing between two occurrences of a recurrent job.
///
/// Stored in the `interval` column as a human readable duration such as
/// `24h0m0s`, `1m30s` or `250ms`. Parsing also accepts shorter forms
/// (`1h30m`, `2.5h`, `90s`) and the bare literal `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Interval(Duration);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIntervalError {
    #[error("Interval is empty")]
    Empty,
    #[error("Interval `{0}` is negative")]
    Negative(String),
    #[error("Interval `{0}` is not a valid duration")]
    Invalid(String),
    #[error("Interval `{0}` is missing a unit")]
    MissingUnit(String),
    #[error("Unknown unit `{unit}` in interval `{input}`")]
    UnknownUnit { unit: String, input: String },
    #[error("Interval `{0}` is too large")]
    Overflow(String),
}

impl Interval {
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Signed delta for calendar arithmetic, `None` when out of chrono's range.
    pub fn to_time_delta(&self) -> Option<chrono::TimeDelta> {
        chrono::TimeDelta::from_std(self.0).ok()
    }
}

impl From<Duration> for Interval {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<Interval> for Duration {
    fn from(interval: Interval) -> Self {
        interval.0
    }
}

/// Renders `value / 10^precision` with a trimmed fractional part.
fn decimal(value: u128, precision: u32) -> String {
    let scale = 10u128.pow(precision);
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = precision as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let nanos = self.0.as_nanos();
        if nanos == 0 {
            return f.write_str("0s");
        }

        if nanos < NANOS_PER_SECOND {
            let (unit, precision) = if nanos < 1_000 {
                ("ns", 0)
            } else if nanos < 1_000_000 {
                ("µs", 3)
            } else {
                ("ms", 6)
            };
            return write!(f, "{}{unit}", decimal(nanos, precision));
        }

        let total_secs = nanos / NANOS_PER_SECOND;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let secs = decimal(
            (total_secs % 60) * NANOS_PER_SECOND + nanos % NANOS_PER_SECOND,
            9,
        );

        if hours > 0 {
            write!(f, "{hours}h{minutes}m{secs}s")
        } else if minutes > 0 {
            write!(f, "{minutes}m{secs}s")
        } else {
            write!(f, "{secs}s")
        }
    }
}

fn unit_nanos(unit: &str, input: &str) -> Result<u128, ParseIntervalError> {
    match unit {
        "ns" => Ok(1),
        "us" | "µs" | "μs" => Ok(1_000),
        "ms" => Ok(1_000_000),
        "s" => Ok(NANOS_PER_SECOND),
        "m" => Ok(60 * NANOS_PER_SECOND),
        "h" => Ok(3600 * NANOS_PER_SECOND),
        "" => Err(ParseIntervalError::MissingUnit(input.to_string())),
        other => Err(ParseIntervalError::UnknownUnit {
            unit: other.to_string(),
            input: input.to_string(),
        }),
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(len)
}

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(ParseIntervalError::Empty);
        }
        if input.starts_with('-') {
            return Err(ParseIntervalError::Negative(input.to_string()));
        }
        let mut rest = input.strip_prefix('+').unwrap_or(input);
        if rest == "0" {
            return Ok(Self::default());
        }
        if rest.is_empty() {
            return Err(ParseIntervalError::Invalid(input.to_string()));
        }

        let overflow = || ParseIntervalError::Overflow(input.to_string());
        let mut total: u128 = 0;

        while !rest.is_empty() {
            let (whole, after) = split_digits(rest);
            let (frac, after) = match after.strip_prefix('.') {
                Some(after_dot) => split_digits(after_dot),
                None => ("", after),
            };
            if whole.is_empty() && frac.is_empty() {
                return Err(ParseIntervalError::Invalid(input.to_string()));
            }

            let unit_len = after
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(after.len());
            let (unit, after) = after.split_at(unit_len);
            let scale = unit_nanos(unit, input)?;

            let whole: u128 = if whole.is_empty() {
                0
            } else {
                whole.parse().map_err(|_| overflow())?
            };
            let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

            let mut place = scale;
            for digit in frac.bytes() {
                place /= 10;
                if place == 0 {
                    break;
                }
                value = value
                    .checked_add(u128::from(digit - b'0') * place)
                    .ok_or_else(overflow)?;
            }

            total = total.checked_add(value).ok_or_else(overflow)?;
            rest = after;
        }

        let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| overflow())?;
        let nanos = (total % NANOS_PER_SECOND) as u32;
        Ok(Self(Duration::new(secs, nanos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(s: &str) -> Interval {
        s.parse().unwrap()
    }

    #[test]
    fn formats_like_stored_values() {
        assert_eq!(Interval::from_secs(24 * 3600).to_string(), "24h0m0s");
        assert_eq!(Interval::from_secs(90).to_string(), "1m30s");
        assert_eq!(Interval::from_secs(5).to_string(), "5s");
        assert_eq!(Interval::from_secs(3661).to_string(), "1h1m1s");
        assert_eq!(Interval::default().to_string(), "0s");
        assert_eq!(Interval::new(Duration::from_millis(1500)).to_string(), "1.5s");
        assert_eq!(Interval::new(Duration::from_millis(250)).to_string(), "250ms");
        assert_eq!(Interval::new(Duration::from_micros(10)).to_string(), "10µs");
        assert_eq!(Interval::new(Duration::from_nanos(7)).to_string(), "7ns");
    }

    #[test]
    fn parses_compound_and_fractional_forms() {
        assert_eq!(interval("24h0m0s"), Interval::from_secs(86_400));
        assert_eq!(interval("1h30m"), Interval::from_secs(5_400));
        assert_eq!(interval("2.5h"), Interval::from_secs(9_000));
        assert_eq!(interval("90s"), Interval::from_secs(90));
        assert_eq!(interval("1.5s"), Interval::new(Duration::from_millis(1500)));
        assert_eq!(interval("300ms"), Interval::new(Duration::from_millis(300)));
        assert_eq!(interval("10us"), Interval::new(Duration::from_micros(10)));
        assert_eq!(interval("10µs"), Interval::new(Duration::from_micros(10)));
        assert_eq!(interval("0"), Interval::default());
        assert_eq!(interval("+5m"), Interval::from_secs(300));
    }

    #[test]
    fn display_output_parses_back() {
        for secs in [1, 59, 60, 61, 3599, 3600, 86_400, 90_061] {
            let value = Interval::from_secs(secs);
            assert_eq!(interval(&value.to_string()), value);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<Interval>(), Err(ParseIntervalError::Empty));
        assert!(matches!(
            "-1h".parse::<Interval>(),
            Err(ParseIntervalError::Negative(_))
        ));
        assert!(matches!(
            "10".parse::<Interval>(),
            Err(ParseIntervalError::MissingUnit(_))
        ));
        assert!(matches!(
            "3d".parse::<Interval>(),
            Err(ParseIntervalError::UnknownUnit { .. })
        ));
        assert!(matches!(
            "h".parse::<Interval>(),
            Err(ParseIntervalError::Invalid(_))
        ));
        assert!(matches!(
            "99999999999999999999999999999999999999999h".parse::<Interval>(),
            Err(ParseIntervalError::Overflow(_))
        ));
    }

    #[test]
    fn fraction_overflow_is_an_error() {
        assert!(matches!(
            "340282366920938463463374607431.9s".parse::<Interval>(),
            Err(ParseIntervalError::Overflow(_))
        ));
    }
}
