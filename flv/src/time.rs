//! Time units used while muxing.
//!
//! Encoders hand out timestamps in their own clock (microseconds on most devices) while the FLV
//! container stores 32 bit millisecond values.  A `Rational` describes the unit a timestamp is
//! expressed in, and `rescale()` converts a timestamp between two units using exact integer
//! arithmetic.
//!
//! # Examples
//!
//! ```
//! use rml_flv::time::{rescale, Rational};
//!
//! let device = Rational::MICROSECONDS;
//! let tags = Rational::MILLISECONDS;
//!
//! assert_eq!(rescale(33_333, device, tags), 33);
//! assert_eq!(rescale(66_666, device, tags), 66);
//! assert_eq!(rescale(-1_500, device, tags), -1);
//! ```
//!
//! FLV timestamps wrap around after 2<sup>32</sup> milliseconds, so `FlvTimestamp` compares
//! values the same way RTMP does: two times are adjacent if they are within 2<sup>31</sup> - 1
//! milliseconds of each other.
//!
//! ```
//! use rml_flv::time::FlvTimestamp;
//!
//! let time1 = FlvTimestamp::new(10000);
//! let time2 = FlvTimestamp::new(4000000000);
//!
//! assert!(time1 > time2);
//! assert_eq!(FlvTimestamp::from_millis(1 << 32), 0);
//! ```

use std::cmp::{max, min, Ordering};
use std::convert::TryFrom;
use std::fmt;

/// An exact unit of time, in seconds, expressed as `num / den`.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash)]
pub struct Rational {
    num: u32,
    den: u32,
}

impl Rational {
    /// The unit device encoders stamp their output with
    pub const MICROSECONDS: Rational = Rational { num: 1, den: 1_000_000 };

    /// The unit FLV tag timestamps are stored in
    pub const MILLISECONDS: Rational = Rational { num: 1, den: 1_000 };

    /// Creates a new rational.  Returns `None` if either part is zero, as a zero numerator
    /// cannot be rescaled into and a zero denominator is not a time unit.
    pub fn new(num: u32, den: u32) -> Option<Rational> {
        if num == 0 || den == 0 {
            return None;
        }

        Some(Rational { num, den })
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn den(&self) -> u32 {
        self.den
    }

    /// The inverse of this unit as a floating point rate (e.g. frames per second for `1/30`)
    pub fn rate(&self) -> f64 {
        self.den as f64 / self.num as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// How `rescale_rounded()` handles values that do not land exactly on the target unit
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum Rounding {
    /// Truncate toward zero
    Zero,

    /// Round to the nearest value, with halfway cases rounded away from zero
    NearestAwayFromZero,

    /// Round toward negative infinity
    Down,

    /// Round toward positive infinity
    Up,
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding::Zero
    }
}

/// Converts `value` from the `from` unit into the `to` unit, truncating toward zero.
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    rescale_rounded(value, from, to, Rounding::Zero)
}

/// Converts `value` from the `from` unit into the `to` unit with the specified rounding.
///
/// The intermediate product is computed with 128 bit integers so any `i64` value combined with
/// any pair of `u32` rationals is exact: `|value| * num * den` stays below 2<sup>127</sup>.  Results that do not fit into an `i64` saturate.
pub fn rescale_rounded(value: i64, from: Rational, to: Rational, rounding: Rounding) -> i64 {
    let numerator = value as i128 * from.num as i128 * to.den as i128;
    let denominator = from.den as i128 * to.num as i128;

    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let result = match rounding {
        Rounding::Zero => quotient,
        Rounding::Down if remainder < 0 => quotient - 1,
        Rounding::Down => quotient,
        Rounding::Up if remainder > 0 => quotient + 1,
        Rounding::Up => quotient,
        // |remainder| < denominator <= u32::MAX * u32::MAX, so doubling it cannot overflow
        Rounding::NearestAwayFromZero if 2 * remainder.abs() >= denominator => quotient + numerator.signum(),
        Rounding::NearestAwayFromZero => quotient,
    };

    i64::try_from(result).unwrap_or(if result < 0 { i64::MIN } else { i64::MAX })
}

/// The representation of an FLV tag timestamp
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct FlvTimestamp {
    /// Milliseconds since the start of the stream, wrapped to 32 bits
    pub value: u32,
}

impl FlvTimestamp {
    pub fn new(initial_value: u32) -> Self {
        FlvTimestamp {
            value: initial_value,
        }
    }

    /// Wraps a millisecond count into the 32 bits an FLV tag can carry
    pub fn from_millis(millis: i64) -> Self {
        FlvTimestamp {
            value: (millis as u64 & 0xFFFF_FFFF) as u32,
        }
    }

    /// Rebuilds a timestamp from the 24 bit field and the extended byte of a tag header
    pub fn from_parts(lower: u32, extended: u8) -> Self {
        FlvTimestamp {
            value: (lower & 0x00FF_FFFF) | ((extended as u32) << 24),
        }
    }

    /// The bits stored in the tag header's 24 bit timestamp field
    pub fn lower_bits(&self) -> u32 {
        self.value & 0x00FF_FFFF
    }

    /// The bits stored in the tag header's `TimestampExtended` byte
    pub fn extended_bits(&self) -> u8 {
        (self.value >> 24) as u8
    }
}

impl Ord for FlvTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.value, &other.value)
    }
}

impl PartialOrd for FlvTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare(&self.value, &other.value))
    }
}

impl PartialEq<u32> for FlvTimestamp {
    fn eq(&self, other: &u32) -> bool {
        self.value == *other
    }
}

impl PartialOrd<u32> for FlvTimestamp {
    fn partial_cmp(&self, other: &u32) -> Option<Ordering> {
        Some(compare(&self.value, other))
    }
}

impl fmt::Display for FlvTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}ms", self.value)
    }
}

fn compare(value1: &u32, value2: &u32) -> Ordering {
    const MAX_ADJACENT_VALUE: u32 = 2147483647; //2u32.pow(31) - 1

    let max_val = max(value1, value2);
    let min_val = min(value1, value2);
    let difference = max_val - min_val;
    match difference <= MAX_ADJACENT_VALUE {
        true => value1.cmp(value2),
        false => value2.cmp(value1),
    }
}
