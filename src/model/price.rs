//! Book prices
//!
//! A non-negative [`rust_decimal::Decimal`]. Prices are written as decimal
//! strings (`"12.50"`) so the stored value reads back exactly, and accepted
//! as either strings or JSON numbers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{ModelError, ModelResult};

/// Fractional digits always carried, so `12.5` reads as `12.50`
const MIN_SCALE: u32 = 2;

/// A non-negative decimal price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Wrap a decimal, rejecting negative amounts
    pub fn new(value: Decimal) -> ModelResult<Self> {
        let mut value = value;
        if value.is_zero() {
            value.set_sign_positive(true);
        } else if value.is_sign_negative() {
            return Err(ModelError::InvalidPrice(format!("{} is negative", value)));
        }
        if value.scale() < MIN_SCALE {
            value.rescale(MIN_SCALE);
        }
        Ok(Price(value))
    }

    pub const fn inner(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ModelError;

    fn try_from(value: Decimal) -> ModelResult<Self> {
        Price::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Price {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| ModelError::InvalidPrice(format!("'{}': {}", s, e)))?;
        Price::new(value)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct PriceVisitor;

impl<'de> Visitor<'de> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative decimal string or number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Price::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Price::new(Decimal::from(v)).map_err(E::custom)
    }

    // Shortest round-trip rendering, so 9.99 stays 9.99
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}
