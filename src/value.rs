use std::io::Write;

use crate::error::{Error, Result};

/// A numeric sample as it goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
}
impl Value {
    /// Integers render in base 10, floats with exactly two fractional digits.
    pub fn write_to(self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Integer(n) => write!(buf, "{n}")?,
            Value::Float(v) => {
                if !v.is_finite() {
                    return Err(Error::InvalidValue(v));
                }
                write!(buf, "{v:.2}")?
            }
        }
        Ok(())
    }

    pub fn to_wire(self) -> Result<String> {
        let mut buf = vec![];
        self.write_to(&mut buf)?;
        // base-10 digits and `.`/`-` only
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Integer(i64::from(n))
            }
        })*
    };
}
impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_have_two_fractional_digits() {
        assert_eq!(Value::from(3.14159).to_wire().unwrap(), "3.14");
        assert_eq!(Value::from(10.0).to_wire().unwrap(), "10.00");
        assert_eq!(Value::from(-0.5f32).to_wire().unwrap(), "-0.50");
        assert_eq!(Value::from(1234567.891).to_wire().unwrap(), "1234567.89");
    }

    #[test]
    fn integers_are_plain() {
        assert_eq!(Value::from(42).to_wire().unwrap(), "42");
        assert_eq!(Value::from(-7i8).to_wire().unwrap(), "-7");
        assert_eq!(Value::from(u32::MAX).to_wire().unwrap(), "4294967295");
        assert_eq!(
            Value::from(i64::MIN).to_wire().unwrap(),
            "-9223372036854775808"
        );
    }

    #[test]
    fn non_finite_is_rejected() {
        let mut buf = vec![];
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Value::from(v).write_to(&mut buf),
                Err(Error::InvalidValue(_))
            ));
        }
        assert!(buf.is_empty());
    }
}
