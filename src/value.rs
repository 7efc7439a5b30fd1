//! Exact 64-bit values for hosts whose native numbers are doubles.
//!
//! A [`Value`] is either a signed or an unsigned 64-bit quantity. The tag is
//! fixed at creation; every binary operation coerces its right-hand operand
//! to the tag of the left-hand side through one shared coercion table, and
//! produces a result carrying that same tag. Arithmetic wraps modulo 2^64
//! (two's complement for the signed tag), matching fixed-width hardware
//! behaviour bit for bit.

use thiserror::Error;

const SIGNED_MIN_MAGNITUDE: u64 = 0x8000_0000_0000_0000;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Coercion and arithmetic failures. These are misuse errors: the caller is
/// expected to fix the operands, not branch and retry.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValueError {
    /// A value is not representable under the requested tag.
    #[error("value out of range for 64-bit conversion")]
    OutOfRange,

    #[error("division by zero")]
    DivideByZero,

    /// Signed exponentiation with a negative exponent.
    #[error("exponent must not be negative")]
    NegativeExponent,

    /// String operand that does not parse as a base-10 integer.
    #[error("invalid integer string: {0:?}")]
    InvalidString(String),
}

/// A host-supplied operand entering the 64-bit value system.
///
/// Hosts deal in booleans, doubles, decimal strings and already-constructed
/// [`Value`]s; everything funnels through here before the coercion rule is
/// applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Bool(bool),
    Number(f64),
    Str(String),
    Value(Value),
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Bool(v)
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Number(v)
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Str(v.to_string())
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Str(v)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<u64> for Operand {
    fn from(v: u64) -> Self {
        Operand::Value(Value::Unsigned(v))
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Value(Value::Signed(v))
    }
}

/// An exact 64-bit integer value, signed or unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
}

/// Truncate a double toward zero and reinterpret it modulo 2^64.
///
/// Non-finite doubles coerce to zero; this never fails. The magnitude is
/// reduced with an exact `%` before the cast, and the negative side wraps
/// through `wrapping_neg` rather than adding 2^64 back in f64, where the
/// sum would round at the top of the range.
pub(crate) fn f64_to_u64(v: f64) -> u64 {
    if !v.is_finite() {
        return 0;
    }
    let t = v.trunc();
    if t >= 0.0 {
        (t % TWO_POW_64) as u64
    } else {
        (((-t) % TWO_POW_64) as u64).wrapping_neg()
    }
}

pub(crate) fn f64_to_i64(v: f64) -> i64 {
    f64_to_u64(v) as i64
}

/// Parse the digit run of a base-10 magnitude. Overflow past u64::MAX and
/// trailing non-digit text are both coercion failures.
fn parse_magnitude(s: &str, original: &str) -> Result<u64, ValueError> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_digit() {
        return Err(ValueError::InvalidString(original.to_string()));
    }
    let mut acc: u64 = 0;
    let mut idx = 0;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        let digit = (bytes[idx] - b'0') as u64;
        acc = acc
            .checked_mul(10)
            .and_then(|a| a.checked_add(digit))
            .ok_or_else(|| ValueError::InvalidString(original.to_string()))?;
        idx += 1;
    }
    if idx != bytes.len() {
        return Err(ValueError::InvalidString(original.to_string()));
    }
    Ok(acc)
}

fn parse_unsigned(s: &str) -> Result<u64, ValueError> {
    let trimmed = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return Err(ValueError::InvalidString(s.to_string()));
    }
    if trimmed.starts_with('-') {
        // no sign permitted under the unsigned tag
        return Err(ValueError::InvalidString(s.to_string()));
    }
    parse_magnitude(trimmed, s)
}

/// Signed strings parse through an unsigned magnitude reinterpreted in two's
/// complement, so "9223372036854775808" yields i64::MIN rather than an
/// overflow failure. Magnitudes past 2^64-1 still fail.
fn parse_signed(s: &str) -> Result<i64, ValueError> {
    let trimmed = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return Err(ValueError::InvalidString(s.to_string()));
    }
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let magnitude = parse_magnitude(rest, s)?;
    let bits = if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };
    Ok(bits as i64)
}

/// The shared coercion table, unsigned target.
fn coerce_unsigned(op: Operand) -> Result<u64, ValueError> {
    match op {
        Operand::Bool(b) => Ok(b as u64),
        Operand::Number(n) => Ok(f64_to_u64(n)),
        Operand::Str(s) => parse_unsigned(&s),
        Operand::Value(Value::Unsigned(v)) => Ok(v),
        Operand::Value(Value::Signed(v)) => {
            if v < 0 {
                Err(ValueError::OutOfRange)
            } else {
                Ok(v as u64)
            }
        }
    }
}

/// The shared coercion table, signed target.
fn coerce_signed(op: Operand) -> Result<i64, ValueError> {
    match op {
        Operand::Bool(b) => Ok(b as i64),
        Operand::Number(n) => Ok(f64_to_i64(n)),
        Operand::Str(s) => parse_signed(&s),
        Operand::Value(Value::Signed(v)) => Ok(v),
        Operand::Value(Value::Unsigned(v)) => {
            if v > i64::MAX as u64 {
                Err(ValueError::OutOfRange)
            } else {
                Ok(v as i64)
            }
        }
    }
}

macro_rules! binary_op {
    ($self:ident, $rhs:ident, $u:expr, $s:expr) => {
        match $self {
            Value::Unsigned(a) => {
                let b = coerce_unsigned($rhs.into())?;
                Ok(Value::Unsigned($u(a, b)))
            }
            Value::Signed(a) => {
                let b = coerce_signed($rhs.into())?;
                Ok(Value::Signed($s(a, b)))
            }
        }
    };
}

impl Value {
    /// Construct an unsigned value from any host operand.
    pub fn unsigned(op: impl Into<Operand>) -> Result<Value, ValueError> {
        Ok(Value::Unsigned(coerce_unsigned(op.into())?))
    }

    /// Construct a signed value from any host operand.
    pub fn signed(op: impl Into<Operand>) -> Result<Value, ValueError> {
        Ok(Value::Signed(coerce_signed(op.into())?))
    }

    /// The raw 64-bit pattern, tag erased.
    pub fn bits(self) -> u64 {
        match self {
            Value::Unsigned(v) => v,
            Value::Signed(v) => v as u64,
        }
    }

    /// Range-checked conversion to u64 (`OutOfRange` for negative signed).
    pub fn to_u64(self) -> Result<u64, ValueError> {
        coerce_unsigned(Operand::Value(self))
    }

    /// Range-checked conversion to i64 (`OutOfRange` past i64::MAX).
    pub fn to_i64(self) -> Result<i64, ValueError> {
        coerce_signed(Operand::Value(self))
    }

    pub fn add(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        binary_op!(self, rhs, u64::wrapping_add, i64::wrapping_add)
    }

    pub fn sub(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        binary_op!(self, rhs, u64::wrapping_sub, i64::wrapping_sub)
    }

    pub fn mul(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        binary_op!(self, rhs, u64::wrapping_mul, i64::wrapping_mul)
    }

    pub fn div(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        match self {
            Value::Unsigned(a) => {
                let b = coerce_unsigned(rhs.into())?;
                if b == 0 {
                    return Err(ValueError::DivideByZero);
                }
                Ok(Value::Unsigned(a / b))
            }
            Value::Signed(a) => {
                let b = coerce_signed(rhs.into())?;
                if b == 0 {
                    return Err(ValueError::DivideByZero);
                }
                Ok(Value::Signed(a.wrapping_div(b)))
            }
        }
    }

    pub fn rem(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        match self {
            Value::Unsigned(a) => {
                let b = coerce_unsigned(rhs.into())?;
                if b == 0 {
                    return Err(ValueError::DivideByZero);
                }
                Ok(Value::Unsigned(a % b))
            }
            Value::Signed(a) => {
                let b = coerce_signed(rhs.into())?;
                if b == 0 {
                    return Err(ValueError::DivideByZero);
                }
                Ok(Value::Signed(a.wrapping_rem(b)))
            }
        }
    }

    /// Exponentiation by squaring with wrapping multiplies. The signed tag
    /// rejects negative exponents; `pow(b, 0)` is 1 for every base.
    pub fn pow(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        match self {
            Value::Unsigned(base) => {
                let exp = coerce_unsigned(rhs.into())?;
                Ok(Value::Unsigned(pow_u64(base, exp)))
            }
            Value::Signed(base) => {
                let exp = coerce_signed(rhs.into())?;
                if exp < 0 {
                    return Err(ValueError::NegativeExponent);
                }
                Ok(Value::Signed(pow_u64(base as u64, exp as u64) as i64))
            }
        }
    }

    /// Negation. The signed minimum promotes to an unsigned 2^63, since its
    /// negation is not representable under the signed tag; an unsigned value
    /// strictly above 2^63 has no signed negation and fails.
    pub fn neg(self) -> Result<Value, ValueError> {
        match self {
            Value::Signed(v) => {
                if v == i64::MIN {
                    Ok(Value::Unsigned(SIGNED_MIN_MAGNITUDE))
                } else {
                    Ok(Value::Signed(-v))
                }
            }
            Value::Unsigned(v) => {
                if v > SIGNED_MIN_MAGNITUDE {
                    Err(ValueError::OutOfRange)
                } else {
                    Ok(Value::Signed(v.wrapping_neg() as i64))
                }
            }
        }
    }

    pub fn bitand(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        binary_op!(self, rhs, |a, b| a & b, |a: i64, b: i64| a & b)
    }

    pub fn bitor(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        binary_op!(self, rhs, |a, b| a | b, |a: i64, b: i64| a | b)
    }

    pub fn bitxor(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        binary_op!(self, rhs, |a, b| a ^ b, |a: i64, b: i64| a ^ b)
    }

    pub fn bitnot(self) -> Value {
        match self {
            Value::Unsigned(v) => Value::Unsigned(!v),
            Value::Signed(v) => Value::Signed(!v),
        }
    }

    /// Left shift, count masked modulo 64.
    pub fn shl(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        match self {
            Value::Unsigned(a) => {
                let b = coerce_unsigned(rhs.into())?;
                Ok(Value::Unsigned(a.wrapping_shl(b as u32)))
            }
            Value::Signed(a) => {
                let b = coerce_signed(rhs.into())?;
                Ok(Value::Signed(a.wrapping_shl(b as u32)))
            }
        }
    }

    /// Right shift, count masked modulo 64. The signed tag shifts the bit
    /// pattern logically, not arithmetically.
    pub fn shr(self, rhs: impl Into<Operand>) -> Result<Value, ValueError> {
        match self {
            Value::Unsigned(a) => {
                let b = coerce_unsigned(rhs.into())?;
                Ok(Value::Unsigned(a.wrapping_shr(b as u32)))
            }
            Value::Signed(a) => {
                let b = coerce_signed(rhs.into())?;
                let shifted = (a as u64).wrapping_shr(b as u32);
                Ok(Value::Signed(shifted as i64))
            }
        }
    }

    pub fn eq(self, rhs: impl Into<Operand>) -> Result<bool, ValueError> {
        match self {
            Value::Unsigned(a) => Ok(a == coerce_unsigned(rhs.into())?),
            Value::Signed(a) => Ok(a == coerce_signed(rhs.into())?),
        }
    }

    pub fn lt(self, rhs: impl Into<Operand>) -> Result<bool, ValueError> {
        match self {
            Value::Unsigned(a) => Ok(a < coerce_unsigned(rhs.into())?),
            Value::Signed(a) => Ok(a < coerce_signed(rhs.into())?),
        }
    }

    pub fn le(self, rhs: impl Into<Operand>) -> Result<bool, ValueError> {
        match self {
            Value::Unsigned(a) => Ok(a <= coerce_unsigned(rhs.into())?),
            Value::Signed(a) => Ok(a <= coerce_signed(rhs.into())?),
        }
    }
}

fn pow_u64(mut base: u64, mut exp: u64) -> u64 {
    let mut result: u64 = 1;
    loop {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        exp >>= 1;
        if exp == 0 {
            break;
        }
        base = base.wrapping_mul(base);
    }
    result
}

impl Default for Value {
    fn default() -> Self {
        Value::Unsigned(0)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::Signed(v) => {
                // magnitude through an unsigned intermediate so i64::MIN
                // prints without overflowing
                if v < 0 {
                    write!(f, "-{}", v.unsigned_abs())
                } else {
                    write!(f, "{}", v)
                }
            }
        }
    }
}
