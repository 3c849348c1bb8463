//! Compact, binary-prefixed byte quantities for tiny displays.
//!
//! `bytes2human(10000)` is `"9K"`: the largest power of 1024 that fits picks
//! the unit and the magnitude is truncated toward zero, so the printed value
//! never overstates the real one.

use std::{convert::Infallible, str::FromStr};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("byte count cannot be negative, got [{value}]")]
    InvalidArgument { value: i128 },
    #[error("'{input}' is not a formatted size")]
    Malformed { input: String },
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A non-negative amount of bytes. Wide enough for anything a 64 bit counter reports and then some.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, derive_more::Display)]
pub struct ByteCount(u128);

impl ByteCount {
    pub const fn new(bytes: u128) -> Self {
        Self(bytes)
    }
    pub const fn get(self) -> u128 {
        self.0
    }
}

macro_rules! byte_count_from_unsigned {
    ($($ty:ty),+) => {$(
        impl From<$ty> for ByteCount {
            fn from(value: $ty) -> Self {
                Self(value as u128)
            }
        }
    )+};
}

macro_rules! byte_count_try_from_signed {
    ($($ty:ty),+) => {$(
        impl TryFrom<$ty> for ByteCount {
            type Error = Error;

            fn try_from(value: $ty) -> Result<Self> {
                u128::try_from(value)
                    .map(Self)
                    .map_err(|_| Error::InvalidArgument { value: value as i128 })
            }
        }
    )+};
}

byte_count_from_unsigned!(u8, u16, u32, u64, u128, usize);
byte_count_try_from_signed!(i8, i16, i32, i64, i128, isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    B,
    K,
    M,
    G,
    T,
    P,
    E,
    Z,
    Y,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Write::write_char(f, self.symbol())
    }
}

/// Every unit except plain bytes, smallest first.
pub const SCALED_UNITS: [Unit; 8] = [Unit::K, Unit::M, Unit::G, Unit::T, Unit::P, Unit::E, Unit::Z, Unit::Y];

impl Unit {
    pub const fn exponent(self) -> u32 {
        self as u32
    }

    /// `1024^exponent`, so `1` for [`Unit::B`] and `2^80` for [`Unit::Y`]
    pub const fn threshold(self) -> u128 {
        1 << (10 * self.exponent())
    }

    pub const fn symbol(self) -> char {
        match self {
            Unit::B => 'B',
            Unit::K => 'K',
            Unit::M => 'M',
            Unit::G => 'G',
            Unit::T => 'T',
            Unit::P => 'P',
            Unit::E => 'E',
            Unit::Z => 'Z',
            Unit::Y => 'Y',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        std::iter::once(Unit::B)
            .chain(SCALED_UNITS)
            .find(|unit| unit.symbol() == symbol)
    }

    /// the next bigger unit, `None` for [`Unit::Y`]
    pub fn next(self) -> Option<Self> {
        SCALED_UNITS
            .iter()
            .copied()
            .find(|unit| unit.exponent() == self.exponent() + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{magnitude}{unit}")]
pub struct FormattedSize {
    pub magnitude: u128,
    pub unit: Unit,
}

impl FormattedSize {
    /// Smallest byte count that formats to `self`. `None` when it does not fit into a `u128`.
    pub fn lower_bound(&self) -> Option<u128> {
        self.magnitude.checked_mul(self.unit.threshold())
    }
}

impl FromStr for FormattedSize {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let malformed = || Error::Malformed { input: input.to_owned() };
        input
            .char_indices()
            .last()
            .ok_or_else(malformed)
            .and_then(|(split_at, symbol)| {
                let digits = &input[..split_at];
                // only what `Display` writes: no sign, no leading zeros
                let canonical = !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && (digits == "0" || !digits.starts_with('0'));
                Unit::from_symbol(symbol)
                    .filter(|_| canonical)
                    .ok_or_else(malformed)
                    .and_then(|unit| {
                        digits
                            .parse::<u128>()
                            .map_err(|_| malformed())
                            .map(|magnitude| Self { magnitude, unit })
                    })
            })
    }
}

/// Picks the largest unit whose threshold is not above `bytes` and truncates the magnitude.
pub fn format(bytes: impl Into<ByteCount>) -> FormattedSize {
    let bytes = bytes.into().get();
    SCALED_UNITS
        .iter()
        .rev()
        .copied()
        .find(|unit| bytes >= unit.threshold())
        .map(|unit| FormattedSize {
            magnitude: bytes / unit.threshold(),
            unit,
        })
        .unwrap_or(FormattedSize { magnitude: bytes, unit: Unit::B })
}

/// Like [`format`], for inputs that may be negative. Negative values are rejected, never coerced.
pub fn try_format<N>(bytes: N) -> Result<FormattedSize>
where
    N: TryInto<ByteCount>,
    N::Error: Into<Error>,
{
    let bytes: ByteCount = bytes.try_into().map_err(Into::<Error>::into)?;
    Ok(format(bytes))
}

pub fn bytes2human(bytes: impl Into<ByteCount>) -> String {
    format(bytes).to_string()
}

pub fn try_bytes2human<N>(bytes: N) -> Result<String>
where
    N: TryInto<ByteCount>,
    N::Error: Into<Error>,
{
    try_format(bytes).map(|size| size.to_string())
}

#[extension_traits::extension(pub trait HumanBytesExt)]
impl<T: Into<ByteCount> + Copy> T {
    fn human_bytes(&self) -> String {
        bytes2human(*self)
    }
}
