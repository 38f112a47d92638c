//! Bundled slide functions.
//!
//! The plain functions work on raw numbers/strings; [`number`], [`byte`], [`color`],
//! [`color_hex`] and [`color_hexa`] wrap them as [`Slide`] callables over [`Value`]s.

use crate::callbacks::Slide;
use crate::error::{CallbackError, CallbackResult};
use crate::value::{Value, ValueKind};

#[inline]
pub fn slide_number(from: f64, to: f64, amount: f64) -> f64 {
    from + (to - from) * amount
}

/// Linear slide rounded half-to-even and clamped to a color channel.
#[inline]
pub fn slide_byte(from: f64, to: f64, amount: f64) -> f64 {
    slide_number(from, to, amount).round_ties_even().clamp(0.0, 255.0)
}

struct HexColor<'a> {
    hash: bool,
    digits: &'a str,
}

fn parse_hex(value: &str) -> CallbackResult<(HexColor<'_>, u32)> {
    let (hash, digits) = match value.strip_prefix('#') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let invalid = || CallbackError::InvalidColor {
        value: value.to_string(),
    };
    if (digits.len() != 6 && digits.len() != 8) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let packed = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
    Ok((HexColor { hash, digits }, packed))
}

fn slide_hex(from: &str, to: &str, amount: f64, width: Option<usize>) -> CallbackResult<String> {
    let (head, a) = parse_hex(from)?;
    let (tail, b) = parse_hex(to)?;
    let width = width.unwrap_or(head.digits.len());
    if head.digits.len() != width {
        return Err(CallbackError::InvalidColor {
            value: from.to_string(),
        });
    }
    if tail.digits.len() != width {
        return Err(CallbackError::InvalidColor {
            value: to.to_string(),
        });
    }

    let channels = width / 2;
    let mut out = String::with_capacity(width + 1);
    if head.hash {
        out.push('#');
    }
    for i in (0..channels).rev() {
        let shift = i * 8;
        let ca = f64::from((a >> shift) & 0xff);
        let cb = f64::from((b >> shift) & 0xff);
        out.push_str(&format!("{:02x}", slide_byte(ca, cb, amount) as u8));
    }
    Ok(out)
}

/// Slide two hex colors of matching width (6 or 8 digits). The result takes color 1's
/// leading `#` (or lack of one).
pub fn slide_color(from: &str, to: &str, amount: f64) -> CallbackResult<String> {
    slide_hex(from, to, amount, None)
}

fn numbers(from: &Value, to: &Value) -> CallbackResult<(f64, f64)> {
    let expect = |v: &Value| {
        v.as_number().ok_or(CallbackError::ValueKind {
            expected: ValueKind::Number,
            actual: v.kind(),
        })
    };
    Ok((expect(from)?, expect(to)?))
}

fn texts<'a>(from: &'a Value, to: &'a Value) -> CallbackResult<(&'a str, &'a str)> {
    let expect = |v: &'a Value| {
        v.as_text().ok_or(CallbackError::ValueKind {
            expected: ValueKind::Text,
            actual: v.kind(),
        })
    };
    Ok((expect(from)?, expect(to)?))
}

pub fn number() -> Slide {
    Slide::new(|from, to, amount| {
        let (a, b) = numbers(from, to)?;
        Ok(Value::Number(slide_number(a, b, amount)))
    })
}

pub fn byte() -> Slide {
    Slide::new(|from, to, amount| {
        let (a, b) = numbers(from, to)?;
        Ok(Value::Number(slide_byte(a, b, amount)))
    })
}

/// Hex color slide that accepts either width, as long as both sides match.
pub fn color() -> Slide {
    Slide::new(|from, to, amount| {
        let (a, b) = texts(from, to)?;
        slide_hex(a, b, amount, None).map(Value::Text)
    })
}

/// `#rrggbb` slide.
pub fn color_hex() -> Slide {
    Slide::new(|from, to, amount| {
        let (a, b) = texts(from, to)?;
        slide_hex(a, b, amount, Some(6)).map(Value::Text)
    })
}

/// `#rrggbbaa` slide.
pub fn color_hexa() -> Slide {
    Slide::new(|from, to, amount| {
        let (a, b) = texts(from, to)?;
        slide_hex(a, b, amount, Some(8)).map(Value::Text)
    })
}
