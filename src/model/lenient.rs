//! Forgiving deserializers for values that UI code hands over as strings.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Number {
    fn into_i64<E: de::Error>(self) -> Result<i64, E> {
        match self {
            Number::Int(n) => Ok(n),
            // `i64::MAX as f64` is 2^63, itself out of range.
            Number::Float(f)
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
            {
                Ok(f as i64)
            }
            Number::Float(f) => Err(E::custom(format!("expected an integer, found {f}"))),
            Number::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected an integer, found {s:?}"))),
        }
    }
}

/// Integer given either as a JSON number or a numeric string.
pub fn int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
    T::Error: fmt::Display,
{
    let n = Number::deserialize(deserializer)?.into_i64()?;
    T::try_from(n).map_err(de::Error::custom)
}

/// Like [`int`], with `null` mapping to `None`.
pub fn opt_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
    T::Error: fmt::Display,
{
    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) => T::try_from(n.into_i64()?)
            .map(Some)
            .map_err(de::Error::custom),
    }
}
