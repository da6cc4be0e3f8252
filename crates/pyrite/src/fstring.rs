//! F-string bodies and the format-spec mini-grammar.
//!
//! The lexer hands the parser a raw f-string body. [`split_fstring`] cuts it
//! into literal runs and `{expression[:spec]}` interpolations (handling the
//! `{{`/`}}` escapes and brackets/quotes nested inside expressions); the
//! parser then parses each expression slot with the ordinary expression
//! grammar. [`FormatSpec`] implements the supported subset of the format
//! mini-grammar: fill, alignment, sign, zero-padding, width, precision, and
//! a type code for integers, floats and strings.

use crate::exception::{RunError, RunResult};
use crate::value::Value;

/// A raw interpolation slot cut out of an f-string body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawPart {
    Literal(String),
    Interp { expr_src: String, spec: Option<String> },
}

/// Splits an f-string body into literal and interpolation parts.
///
/// Returns an error message (without line context; the caller adds it) on
/// unbalanced braces.
pub(crate) fn split_fstring(body: &str) -> Result<Vec<RawPart>, String> {
    let chars: Vec<char> = body.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '}' => return Err("single '}' is not allowed in f-string".to_owned()),
            '{' => {
                if !literal.is_empty() {
                    parts.push(RawPart::Literal(std::mem::take(&mut literal)));
                }
                let (expr_src, spec, next) = read_interp(&chars, i + 1)?;
                parts.push(RawPart::Interp { expr_src, spec });
                i = next;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    if !literal.is_empty() {
        parts.push(RawPart::Literal(literal));
    }
    Ok(parts)
}

/// Reads one interpolation starting just after the `{`.
///
/// The expression ends at a `:` or `}` that sits at bracket depth zero and
/// outside string quotes; everything after the `:` up to the closing `}` is
/// the format spec.
fn read_interp(chars: &[char], start: usize) -> Result<(String, Option<String>, usize), String> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut expr = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            expr.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                expr.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                expr.push(c);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                expr.push(c);
            }
            '}' if depth == 0 => {
                if expr.trim().is_empty() {
                    return Err("empty expression in f-string".to_owned());
                }
                return Ok((expr, None, i + 1));
            }
            '}' => {
                depth -= 1;
                expr.push(c);
            }
            ':' if depth == 0 => {
                let mut spec = String::new();
                i += 1;
                while i < chars.len() && chars[i] != '}' {
                    spec.push(chars[i]);
                    i += 1;
                }
                if i == chars.len() {
                    return Err("expected '}' in f-string".to_owned());
                }
                if expr.trim().is_empty() {
                    return Err("empty expression in f-string".to_owned());
                }
                return Ok((expr, Some(spec), i + 1));
            }
            c => expr.push(c),
        }
        i += 1;
    }
    Err("expected '}' in f-string".to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
    Center,
    /// `=`: padding goes between the sign and the digits.
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sign {
    Plus,
    Minus,
    Space,
}

/// Parsed format spec: `[[fill]align][sign][0][width][.precision][type]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub sign: Option<Sign>,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub ty: Option<char>,
}

impl FormatSpec {
    pub(crate) fn parse(spec: &str) -> Result<Self, String> {
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        let mut fill = ' ';
        let mut align = None;

        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        };
        if chars.len() >= 2
            && let Some(a) = align_of(chars[1])
        {
            fill = chars[0];
            align = Some(a);
            i = 2;
        } else if let Some(&c) = chars.first()
            && let Some(a) = align_of(c)
        {
            align = Some(a);
            i = 1;
        }

        let mut sign = None;
        if let Some(&c) = chars.get(i) {
            sign = match c {
                '+' => Some(Sign::Plus),
                '-' => Some(Sign::Minus),
                ' ' => Some(Sign::Space),
                _ => None,
            };
            if sign.is_some() {
                i += 1;
            }
        }

        if chars.get(i) == Some(&'0') {
            if align.is_none() {
                fill = '0';
                align = Some(Align::AfterSign);
            }
            i += 1;
        }

        let mut width = None;
        let mut digits = String::new();
        while let Some(&c) = chars.get(i) {
            if c.is_ascii_digit() {
                digits.push(c);
                i += 1;
            } else {
                break;
            }
        }
        if !digits.is_empty() {
            width = Some(digits.parse().map_err(|_| format!("invalid width in format spec {spec:?}"))?);
        }

        let mut precision = None;
        if chars.get(i) == Some(&'.') {
            i += 1;
            let mut digits = String::new();
            while let Some(&c) = chars.get(i) {
                if c.is_ascii_digit() {
                    digits.push(c);
                    i += 1;
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(format!("expected precision digits in format spec {spec:?}"));
            }
            precision = Some(digits.parse().map_err(|_| format!("invalid precision in format spec {spec:?}"))?);
        }

        let mut ty = None;
        if let Some(&c) = chars.get(i) {
            if matches!(c, 'd' | 'b' | 'o' | 'x' | 'X' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 's' | '%') {
                ty = Some(c);
                i += 1;
            } else {
                return Err(format!("unknown format code {c:?}"));
            }
        }
        if i != chars.len() {
            return Err(format!("invalid format spec {spec:?}"));
        }
        Ok(Self {
            fill,
            align,
            sign,
            width,
            precision,
            ty,
        })
    }

    /// Formats a value according to this spec.
    pub(crate) fn format(&self, value: &Value) -> RunResult<String> {
        match self.ty {
            Some('d' | 'b' | 'o' | 'x' | 'X') => {
                let n = match value {
                    Value::Int(n) => *n,
                    Value::Bool(b) => i64::from(*b),
                    other => {
                        return Err(RunError::value_error(format!(
                            "cannot format {} with {:?}",
                            other.type_name(),
                            self.ty.unwrap_or('d'),
                        )));
                    }
                };
                let digits = match self.ty {
                    Some('b') => format!("{:b}", n.unsigned_abs()),
                    Some('o') => format!("{:o}", n.unsigned_abs()),
                    Some('x') => format!("{:x}", n.unsigned_abs()),
                    Some('X') => format!("{:X}", n.unsigned_abs()),
                    _ => n.unsigned_abs().to_string(),
                };
                Ok(self.pad_number(&digits, n < 0))
            }
            Some('f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%') => {
                let f = match value {
                    Value::Float(f) => *f,
                    Value::Int(n) => *n as f64,
                    Value::Bool(b) => f64::from(i8::from(*b)),
                    other => {
                        return Err(RunError::value_error(format!(
                            "cannot format {} with {:?}",
                            other.type_name(),
                            self.ty.unwrap_or('f'),
                        )));
                    }
                };
                let digits = self.float_digits(f);
                Ok(self.pad_number(&digits, f.is_sign_negative() && f != 0.0))
            }
            Some('s') | None => {
                if self.ty.is_none()
                    && self.precision.is_some()
                    && matches!(value, Value::Float(_))
                {
                    // Bare precision on a float behaves like `g`.
                    return self.as_general().format(value);
                }
                let mut s = value.py_str();
                if let Some(p) = self.precision {
                    s = s.chars().take(p).collect();
                }
                Ok(self.pad_text(&s))
            }
            _ => Ok(self.pad_text(&value.py_str())),
        }
    }

    fn as_general(&self) -> Self {
        let mut spec = self.clone();
        spec.ty = Some('g');
        spec
    }

    fn float_digits(&self, f: f64) -> String {
        let abs = f.abs();
        match self.ty {
            Some('f' | 'F') => format!("{:.*}", self.precision.unwrap_or(6), abs),
            Some('%') => format!("{:.*}%", self.precision.unwrap_or(6), abs * 100.0),
            Some('e' | 'E') => {
                let s = format!("{:.*e}", self.precision.unwrap_or(6), abs);
                let s = fix_exponent(&s);
                if self.ty == Some('E') { s.to_uppercase() } else { s }
            }
            // `g`: precision counts significant digits; trailing zeros drop.
            _ => {
                let precision = self.precision.unwrap_or(6).max(1);
                let mut s = format!("{abs:.*e}", precision - 1);
                if let Some(exp_pos) = s.find('e') {
                    let exp: i32 = s[exp_pos + 1..].parse().unwrap_or(0);
                    if exp >= -4 && exp < i32::try_from(precision).unwrap_or(i32::MAX) {
                        let decimals = (i32::try_from(precision).unwrap_or(i32::MAX) - 1 - exp).max(0);
                        s = format!("{abs:.*}", usize::try_from(decimals).unwrap_or(0));
                        if s.contains('.') {
                            s = s.trim_end_matches('0').trim_end_matches('.').to_owned();
                        }
                    } else {
                        let mantissa = s[..exp_pos].trim_end_matches('0').trim_end_matches('.').to_owned();
                        s = format!("{mantissa}{}", fix_exponent(&s[exp_pos..]));
                    }
                }
                if self.ty == Some('G') { s.to_uppercase() } else { s }
            }
        }
    }

    fn sign_prefix(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else {
            match self.sign {
                Some(Sign::Plus) => "+",
                Some(Sign::Space) => " ",
                _ => "",
            }
        }
    }

    fn pad_number(&self, digits: &str, negative: bool) -> String {
        let sign = self.sign_prefix(negative);
        let width = self.width.unwrap_or(0);
        let content_len = sign.chars().count() + digits.chars().count();
        if content_len >= width {
            return format!("{sign}{digits}");
        }
        let pad: String = std::iter::repeat_n(self.fill, width - content_len).collect();
        match self.align.unwrap_or(Align::Right) {
            Align::Left => format!("{sign}{digits}{pad}"),
            Align::Right => format!("{pad}{sign}{digits}"),
            Align::AfterSign => format!("{sign}{pad}{digits}"),
            Align::Center => {
                let left = (width - content_len) / 2;
                let right = width - content_len - left;
                let lpad: String = std::iter::repeat_n(self.fill, left).collect();
                let rpad: String = std::iter::repeat_n(self.fill, right).collect();
                format!("{lpad}{sign}{digits}{rpad}")
            }
        }
    }

    fn pad_text(&self, s: &str) -> String {
        let width = self.width.unwrap_or(0);
        let len = s.chars().count();
        if len >= width {
            return s.to_owned();
        }
        let pad = width - len;
        match self.align.unwrap_or(Align::Left) {
            Align::Right | Align::AfterSign => {
                let p: String = std::iter::repeat_n(self.fill, pad).collect();
                format!("{p}{s}")
            }
            Align::Left => {
                let p: String = std::iter::repeat_n(self.fill, pad).collect();
                format!("{s}{p}")
            }
            Align::Center => {
                let left = pad / 2;
                let lpad: String = std::iter::repeat_n(self.fill, left).collect();
                let rpad: String = std::iter::repeat_n(self.fill, pad - left).collect();
                format!("{lpad}{s}{rpad}")
            }
        }
    }
}

/// Rust renders exponents as `e3`; Python writes `e+03`.
pub(crate) fn fix_exponent(s: &str) -> String {
    let Some(pos) = s.find(['e', 'E']) else {
        return s.to_owned();
    };
    let (mantissa, exp) = s.split_at(pos);
    let exp = &exp[1..];
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("+", exp.strip_prefix('+').unwrap_or(exp)),
    };
    if digits.len() < 2 {
        format!("{mantissa}e{sign}0{digits}")
    } else {
        format!("{mantissa}e{sign}{digits}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_literals_and_interps() {
        let parts = split_fstring("a {x} b {y:>3} {{esc}}").unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], RawPart::Literal("a ".to_owned()));
        assert_eq!(
            parts[1],
            RawPart::Interp {
                expr_src: "x".to_owned(),
                spec: None
            }
        );
        assert_eq!(
            parts[3],
            RawPart::Interp {
                expr_src: "y".to_owned(),
                spec: Some(">3".to_owned())
            }
        );
        assert_eq!(parts[4], RawPart::Literal(" {esc}".to_owned()));
    }

    #[test]
    fn colon_inside_index_is_not_a_spec() {
        let parts = split_fstring("{d['a:b']}").unwrap();
        assert_eq!(
            parts[0],
            RawPart::Interp {
                expr_src: "d['a:b']".to_owned(),
                spec: None
            }
        );
    }

    #[test]
    fn unbalanced_brace_is_an_error() {
        assert!(split_fstring("{x").is_err());
        assert!(split_fstring("}").is_err());
    }

    #[test]
    fn int_formats() {
        let spec = FormatSpec::parse("04d").unwrap();
        assert_eq!(spec.format(&Value::Int(9)).unwrap(), "0009");
        let spec = FormatSpec::parse("2d").unwrap();
        assert_eq!(spec.format(&Value::Int(1)).unwrap(), " 1");
        let spec = FormatSpec::parse("+d").unwrap();
        assert_eq!(spec.format(&Value::Int(3)).unwrap(), "+3");
        let spec = FormatSpec::parse("x").unwrap();
        assert_eq!(spec.format(&Value::Int(255)).unwrap(), "ff");
    }

    #[test]
    fn float_formats() {
        let spec = FormatSpec::parse(".2f").unwrap();
        assert_eq!(spec.format(&Value::Float(3.14159)).unwrap(), "3.14");
        let spec = FormatSpec::parse("8.2f").unwrap();
        assert_eq!(spec.format(&Value::Float(-3.5)).unwrap(), "   -3.50");
        let spec = FormatSpec::parse("e").unwrap();
        assert_eq!(spec.format(&Value::Float(1500.0)).unwrap(), "1.500000e+03");
    }

    #[test]
    fn string_formats() {
        let spec = FormatSpec::parse("<5").unwrap();
        assert_eq!(spec.format(&Value::str("ab")).unwrap(), "ab   ");
        let spec = FormatSpec::parse("^5").unwrap();
        assert_eq!(spec.format(&Value::str("ab")).unwrap(), " ab  ");
        let spec = FormatSpec::parse(".2s").unwrap();
        assert_eq!(spec.format(&Value::str("abcdef")).unwrap(), "ab");
    }

    #[test]
    fn rejects_unknown_code() {
        assert!(FormatSpec::parse("q").is_err());
    }
}
