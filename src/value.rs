//! Typed parameter values and the text decoder
//!
//! Every directive parameter is one of the closed set of [`ParameterType`]s.
//! [`parse_value`] decodes exactly one value from a [`Cursor`] and leaves the
//! rest of the text for the next parameter. Arithmetic values are clamped into
//! their range rather than rejected.

use crate::error::ValueError;
use crate::types::{
    Point2, Point3, Point4, Position, Range, Rectangle, RgbColour, RgbaColour, Size,
};
use indexmap::IndexMap;
use std::fmt;
use std::num::IntErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Validation table for checked-text parameters
pub type CheckedValues = Arc<IndexMap<String, u32>>;

/// Validation table for 64-bit flag parameters
pub type CheckedValues64 = Arc<IndexMap<String, u64>>;

/// Builds a checked-text table from `(name, value)` pairs
pub fn checked_values<I, S>(pairs: I) -> CheckedValues
where
    I: IntoIterator<Item = (S, u32)>,
    S: Into<String>,
{
    Arc::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

/// Builds a 64-bit flag table from `(name, value)` pairs
pub fn checked_values64<I, S>(pairs: I) -> CheckedValues64
where
    I: IntoIterator<Item = (S, u64)>,
    S: Into<String>,
{
    Arc::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

/// Closed set of parameter kinds a directive can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    /// Extended precision in the file format; carried as `f64`
    LongDouble,
    Text,
    Name,
    Path,
    Point2I,
    Point3I,
    Point4I,
    Point2F,
    Point3F,
    Point4F,
    Point2D,
    Point3D,
    Point4D,
    Size,
    Position,
    Rectangle,
    RgbColour,
    RgbaColour,
    HdrRgbColour,
    HdrRgbaColour,
    CheckedText,
    BitwiseOred32BitsCheckedText,
    BitwiseOred64BitsCheckedText,
}

impl ParameterType {
    pub const ALL: [ParameterType; 34] = [
        ParameterType::Bool,
        ParameterType::Int8,
        ParameterType::Int16,
        ParameterType::Int32,
        ParameterType::Int64,
        ParameterType::UInt8,
        ParameterType::UInt16,
        ParameterType::UInt32,
        ParameterType::UInt64,
        ParameterType::Float,
        ParameterType::Double,
        ParameterType::LongDouble,
        ParameterType::Text,
        ParameterType::Name,
        ParameterType::Path,
        ParameterType::Point2I,
        ParameterType::Point3I,
        ParameterType::Point4I,
        ParameterType::Point2F,
        ParameterType::Point3F,
        ParameterType::Point4F,
        ParameterType::Point2D,
        ParameterType::Point3D,
        ParameterType::Point4D,
        ParameterType::Size,
        ParameterType::Position,
        ParameterType::Rectangle,
        ParameterType::RgbColour,
        ParameterType::RgbaColour,
        ParameterType::HdrRgbColour,
        ParameterType::HdrRgbaColour,
        ParameterType::CheckedText,
        ParameterType::BitwiseOred32BitsCheckedText,
        ParameterType::BitwiseOred64BitsCheckedText,
    ];

    /// Name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ParameterType::Bool => "bool",
            ParameterType::Int8 => "int8",
            ParameterType::Int16 => "int16",
            ParameterType::Int32 => "int32",
            ParameterType::Int64 => "int64",
            ParameterType::UInt8 => "uint8",
            ParameterType::UInt16 => "uint16",
            ParameterType::UInt32 => "uint32",
            ParameterType::UInt64 => "uint64",
            ParameterType::Float => "float",
            ParameterType::Double => "double",
            ParameterType::LongDouble => "long double",
            ParameterType::Text => "text",
            ParameterType::Name => "name",
            ParameterType::Path => "path",
            ParameterType::Point2I => "2 integers point",
            ParameterType::Point3I => "3 integers point",
            ParameterType::Point4I => "4 integers point",
            ParameterType::Point2F => "2 floats point",
            ParameterType::Point3F => "3 floats point",
            ParameterType::Point4F => "4 floats point",
            ParameterType::Point2D => "2 doubles point",
            ParameterType::Point3D => "3 doubles point",
            ParameterType::Point4D => "4 doubles point",
            ParameterType::Size => "size",
            ParameterType::Position => "position",
            ParameterType::Rectangle => "rectangle",
            ParameterType::RgbColour => "rgb colour",
            ParameterType::RgbaColour => "rgba colour",
            ParameterType::HdrRgbColour => "hdr rgb colour",
            ParameterType::HdrRgbaColour => "hdr rgba colour",
            ParameterType::CheckedText => "checked text",
            ParameterType::BitwiseOred32BitsCheckedText => "32 bits bitwise ORed checked texts",
            ParameterType::BitwiseOred64BitsCheckedText => "64 bits bitwise ORed checked texts",
        }
    }

    /// Scalar numeric types, the ones carrying a clamping range
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            ParameterType::Int8
                | ParameterType::Int16
                | ParameterType::Int32
                | ParameterType::Int64
                | ParameterType::UInt8
                | ParameterType::UInt16
                | ParameterType::UInt32
                | ParameterType::UInt64
                | ParameterType::Float
                | ParameterType::Double
                | ParameterType::LongDouble
        )
    }

    /// Types validated against a caller-supplied table
    pub fn is_checked(self) -> bool {
        matches!(
            self,
            ParameterType::CheckedText
                | ParameterType::BitwiseOred32BitsCheckedText
                | ParameterType::BitwiseOred64BitsCheckedText
        )
    }

    /// Full-domain constraint for arithmetic types, `None` otherwise
    pub fn default_constraint(self) -> Constraint {
        match self {
            ParameterType::Int8 => Constraint::Signed(Range::new(i8::MIN.into(), i8::MAX.into())),
            ParameterType::Int16 => {
                Constraint::Signed(Range::new(i16::MIN.into(), i16::MAX.into()))
            }
            ParameterType::Int32 => {
                Constraint::Signed(Range::new(i32::MIN.into(), i32::MAX.into()))
            }
            ParameterType::Int64 => Constraint::Signed(Range::new(i64::MIN, i64::MAX)),
            ParameterType::UInt8 => Constraint::Unsigned(Range::new(0, u8::MAX.into())),
            ParameterType::UInt16 => Constraint::Unsigned(Range::new(0, u16::MAX.into())),
            ParameterType::UInt32 => Constraint::Unsigned(Range::new(0, u32::MAX.into())),
            ParameterType::UInt64 => Constraint::Unsigned(Range::new(0, u64::MAX)),
            ParameterType::Float => {
                Constraint::Real(Range::new(f64::from(f32::MIN), f64::from(f32::MAX)))
            }
            ParameterType::Double | ParameterType::LongDouble => {
                Constraint::Real(Range::new(f64::MIN, f64::MAX))
            }
            _ => Constraint::None,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation attached to a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    None,
    Signed(Range<i64>),
    Unsigned(Range<u64>),
    Real(Range<f64>),
    /// Table for checked text and 32-bit flags
    Values(CheckedValues),
    /// Table for 64-bit flags
    Values64(CheckedValues64),
}

/// A decoded parameter value; one variant per [`ParameterType`]
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    LongDouble(f64),
    Text(String),
    Name(String),
    Path(PathBuf),
    Point2I(Point2<i32>),
    Point3I(Point3<i32>),
    Point4I(Point4<i32>),
    Point2F(Point2<f32>),
    Point3F(Point3<f32>),
    Point4F(Point4<f32>),
    Point2D(Point2<f64>),
    Point3D(Point3<f64>),
    Point4D(Point4<f64>),
    Size(Size),
    Position(Position),
    Rectangle(Rectangle),
    RgbColour(RgbColour),
    RgbaColour(RgbaColour),
    HdrRgbColour(RgbColour),
    HdrRgbaColour(RgbaColour),
    CheckedText(u32),
    BitwiseOred32(u32),
    BitwiseOred64(u64),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterType {
        match self {
            ParameterValue::Bool(_) => ParameterType::Bool,
            ParameterValue::Int8(_) => ParameterType::Int8,
            ParameterValue::Int16(_) => ParameterType::Int16,
            ParameterValue::Int32(_) => ParameterType::Int32,
            ParameterValue::Int64(_) => ParameterType::Int64,
            ParameterValue::UInt8(_) => ParameterType::UInt8,
            ParameterValue::UInt16(_) => ParameterType::UInt16,
            ParameterValue::UInt32(_) => ParameterType::UInt32,
            ParameterValue::UInt64(_) => ParameterType::UInt64,
            ParameterValue::Float(_) => ParameterType::Float,
            ParameterValue::Double(_) => ParameterType::Double,
            ParameterValue::LongDouble(_) => ParameterType::LongDouble,
            ParameterValue::Text(_) => ParameterType::Text,
            ParameterValue::Name(_) => ParameterType::Name,
            ParameterValue::Path(_) => ParameterType::Path,
            ParameterValue::Point2I(_) => ParameterType::Point2I,
            ParameterValue::Point3I(_) => ParameterType::Point3I,
            ParameterValue::Point4I(_) => ParameterType::Point4I,
            ParameterValue::Point2F(_) => ParameterType::Point2F,
            ParameterValue::Point3F(_) => ParameterType::Point3F,
            ParameterValue::Point4F(_) => ParameterType::Point4F,
            ParameterValue::Point2D(_) => ParameterType::Point2D,
            ParameterValue::Point3D(_) => ParameterType::Point3D,
            ParameterValue::Point4D(_) => ParameterType::Point4D,
            ParameterValue::Size(_) => ParameterType::Size,
            ParameterValue::Position(_) => ParameterType::Position,
            ParameterValue::Rectangle(_) => ParameterType::Rectangle,
            ParameterValue::RgbColour(_) => ParameterType::RgbColour,
            ParameterValue::RgbaColour(_) => ParameterType::RgbaColour,
            ParameterValue::HdrRgbColour(_) => ParameterType::HdrRgbColour,
            ParameterValue::HdrRgbaColour(_) => ParameterType::HdrRgbaColour,
            ParameterValue::CheckedText(_) => ParameterType::CheckedText,
            ParameterValue::BitwiseOred32(_) => ParameterType::BitwiseOred32BitsCheckedText,
            ParameterValue::BitwiseOred64(_) => ParameterType::BitwiseOred64BitsCheckedText,
        }
    }

    /// Extracts the value as a Rust type, see [`FromValue`]
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

/// Writes text values quoted when they would not read back as one token
fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.is_empty() || text.chars().any(char::is_whitespace) || text.starts_with('"') {
        write!(f, "\"{}\"", text)
    } else {
        f.write_str(text)
    }
}

/// Text form that [`parse_value`] reads back; checked values print as numbers
impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::Int8(v) => write!(f, "{}", v),
            ParameterValue::Int16(v) => write!(f, "{}", v),
            ParameterValue::Int32(v) => write!(f, "{}", v),
            ParameterValue::Int64(v) => write!(f, "{}", v),
            ParameterValue::UInt8(v) => write!(f, "{}", v),
            ParameterValue::UInt16(v) => write!(f, "{}", v),
            ParameterValue::UInt32(v) => write!(f, "{}", v),
            ParameterValue::UInt64(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Double(v) | ParameterValue::LongDouble(v) => write!(f, "{}", v),
            ParameterValue::Text(v) | ParameterValue::Name(v) => write_text(f, v),
            ParameterValue::Path(v) => write_text(f, &v.to_string_lossy()),
            ParameterValue::Point2I(v) => write!(f, "{}", v),
            ParameterValue::Point3I(v) => write!(f, "{}", v),
            ParameterValue::Point4I(v) => write!(f, "{}", v),
            ParameterValue::Point2F(v) => write!(f, "{}", v),
            ParameterValue::Point3F(v) => write!(f, "{}", v),
            ParameterValue::Point4F(v) => write!(f, "{}", v),
            ParameterValue::Point2D(v) => write!(f, "{}", v),
            ParameterValue::Point3D(v) => write!(f, "{}", v),
            ParameterValue::Point4D(v) => write!(f, "{}", v),
            ParameterValue::Size(v) => write!(f, "{}", v),
            ParameterValue::Position(v) => write!(f, "{}", v),
            ParameterValue::Rectangle(v) => write!(f, "{}", v),
            ParameterValue::RgbColour(v) | ParameterValue::HdrRgbColour(v) => write!(f, "{}", v),
            ParameterValue::RgbaColour(v) | ParameterValue::HdrRgbaColour(v) => {
                write!(f, "{}", v)
            }
            ParameterValue::CheckedText(v) | ParameterValue::BitwiseOred32(v) => {
                write!(f, "{}", v)
            }
            ParameterValue::BitwiseOred64(v) => write!(f, "{}", v),
        }
    }
}

/// Conversion from a decoded value to a concrete Rust type
pub trait FromValue: Sized {
    fn from_value(value: &ParameterValue) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty => $($variant:ident),+) => {
        impl FromValue for $ty {
            fn from_value(value: &ParameterValue) -> Option<Self> {
                match value {
                    $(ParameterValue::$variant(v) => Some(v.clone()),)+
                    _ => None,
                }
            }
        }
    };
}

impl_from_value!(bool => Bool);
impl_from_value!(i8 => Int8);
impl_from_value!(i16 => Int16);
impl_from_value!(i32 => Int32);
impl_from_value!(i64 => Int64);
impl_from_value!(u8 => UInt8);
impl_from_value!(u16 => UInt16);
impl_from_value!(u32 => UInt32, CheckedText, BitwiseOred32);
impl_from_value!(u64 => UInt64, BitwiseOred64);
impl_from_value!(f32 => Float);
impl_from_value!(f64 => Double, LongDouble);
impl_from_value!(String => Text, Name);
impl_from_value!(PathBuf => Path);
impl_from_value!(Point2<i32> => Point2I);
impl_from_value!(Point3<i32> => Point3I);
impl_from_value!(Point4<i32> => Point4I);
impl_from_value!(Point2<f32> => Point2F);
impl_from_value!(Point3<f32> => Point3F);
impl_from_value!(Point4<f32> => Point4F);
impl_from_value!(Point2<f64> => Point2D);
impl_from_value!(Point3<f64> => Point3D);
impl_from_value!(Point4<f64> => Point4D);
impl_from_value!(Size => Size);
impl_from_value!(Position => Position);
impl_from_value!(Rectangle => Rectangle);
impl_from_value!(RgbColour => RgbColour, HdrRgbColour);
impl_from_value!(RgbaColour => RgbaColour, HdrRgbaColour);

/// Read position over the parameter text of one directive
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Text not consumed yet, without leading whitespace
    pub fn remaining(&self) -> &'a str {
        self.text[self.pos..].trim_start()
    }

    /// True once only whitespace is left
    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, position: usize) {
        self.pos = position.min(self.text.len());
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Next run of characters not matching `is_delimiter`
    fn take_until(&mut self, is_delimiter: impl Fn(char) -> bool) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(is_delimiter).unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Next whitespace-delimited token
    pub fn next_token(&mut self) -> Option<&'a str> {
        self.take_until(char::is_whitespace)
    }

    /// Next numeric component; commas separate components like whitespace
    fn next_component(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.text[self.pos..].starts_with(',') {
            self.pos += 1;
        }
        let token = self.take_until(|c| c.is_whitespace() || c == ',')?;
        Some(token)
    }

    /// Next token or double-quoted span, quotes removed
    pub fn next_text(&mut self) -> Result<Option<&'a str>, ValueError> {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        if let Some(quoted) = rest.strip_prefix('"') {
            return match quoted.find('"') {
                Some(end) => {
                    self.pos += end + 2;
                    Ok(Some(&quoted[..end]))
                }
                None => Err(ValueError::UnterminatedQuote {
                    text: rest.to_string(),
                }),
            };
        }
        Ok(self.next_token())
    }

    /// Consumes everything left
    pub fn take_rest(&mut self) -> &'a str {
        let rest = self.remaining();
        self.pos = self.text.len();
        rest
    }
}

fn parse_integer(token: &str, expected: &'static str) -> Result<i128, ValueError> {
    match token.parse::<i128>() {
        Ok(value) => Ok(value),
        Err(error) => match error.kind() {
            IntErrorKind::PosOverflow => Ok(i128::MAX),
            IntErrorKind::NegOverflow => Ok(i128::MIN),
            _ => Err(ValueError::InvalidNumber {
                text: token.to_string(),
                expected,
            }),
        },
    }
}

/// Single precision values are read as `f32` so that formatted floats read
/// back bit-exact
fn parse_real(token: &str, expected: &'static str, single: bool) -> Result<f64, ValueError> {
    let invalid = || ValueError::InvalidNumber {
        text: token.to_string(),
        expected,
    };
    let value = if single {
        token.parse::<f32>().map(f64::from).map_err(|_| invalid())?
    } else {
        token.parse::<f64>().map_err(|_| invalid())?
    };
    if value.is_nan() {
        return Err(invalid());
    }
    Ok(value)
}

fn signed(
    cursor: &mut Cursor<'_>,
    kind: ParameterType,
    constraint: &Constraint,
    domain: Range<i64>,
) -> Result<i64, ValueError> {
    let token = cursor.next_component().ok_or(ValueError::Missing {
        expected: kind.name(),
    })?;
    let value = parse_integer(token, kind.name())?;
    let value = value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
    let value = match constraint {
        Constraint::Signed(range) => range.clamp(value),
        _ => value,
    };
    Ok(domain.clamp(value))
}

fn unsigned(
    cursor: &mut Cursor<'_>,
    kind: ParameterType,
    constraint: &Constraint,
    domain: Range<u64>,
) -> Result<u64, ValueError> {
    let token = cursor.next_component().ok_or(ValueError::Missing {
        expected: kind.name(),
    })?;
    let value = parse_integer(token, kind.name())?;
    let value = value.clamp(0, i128::from(u64::MAX)) as u64;
    let value = match constraint {
        Constraint::Unsigned(range) => range.clamp(value),
        _ => value,
    };
    Ok(domain.clamp(value))
}

fn real(
    cursor: &mut Cursor<'_>,
    kind: ParameterType,
    constraint: &Constraint,
    domain: Range<f64>,
) -> Result<f64, ValueError> {
    let token = cursor.next_component().ok_or(ValueError::Missing {
        expected: kind.name(),
    })?;
    let value = parse_real(token, kind.name(), kind == ParameterType::Float)?;
    let value = match constraint {
        Constraint::Real(range) => range.clamp(value),
        _ => value,
    };
    Ok(domain.clamp(value))
}

fn parse_bool(cursor: &mut Cursor<'_>) -> Result<bool, ValueError> {
    let token = cursor.next_token().ok_or(ValueError::Missing {
        expected: ParameterType::Bool.name(),
    })?;
    match token.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ValueError::InvalidBool {
            text: token.to_string(),
        }),
    }
}

fn candidates<V>(values: &IndexMap<String, V>) -> String {
    values.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn lookup<V: Copy>(values: &IndexMap<String, V>, token: &str) -> Result<V, ValueError> {
    values
        .get(token)
        .copied()
        .ok_or_else(|| ValueError::UnknownToken {
            token: token.to_string(),
            candidates: candidates(values),
        })
}

fn flag_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == '|' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Parses `count` components with `component`, wrapping failures with their
/// index
fn components<T, const N: usize>(
    cursor: &mut Cursor<'_>,
    kind: ParameterType,
    mut component: impl FnMut(&mut Cursor<'_>) -> Result<T, ValueError>,
) -> Result<[T; N], ValueError>
where
    T: Copy + Default,
{
    let mut values = [T::default(); N];
    for (index, slot) in values.iter_mut().enumerate() {
        *slot = component(cursor).map_err(|reason| ValueError::Component {
            expected: kind.name(),
            index: index + 1,
            count: N,
            reason: Box::new(reason),
        })?;
    }
    Ok(values)
}

fn i32_component(cursor: &mut Cursor<'_>) -> Result<i32, ValueError> {
    let domain = Range::new(i64::from(i32::MIN), i64::from(i32::MAX));
    Ok(signed(cursor, ParameterType::Int32, &Constraint::None, domain)? as i32)
}

fn u32_component(cursor: &mut Cursor<'_>) -> Result<u32, ValueError> {
    let domain = Range::new(0, u64::from(u32::MAX));
    Ok(unsigned(cursor, ParameterType::UInt32, &Constraint::None, domain)? as u32)
}

fn f32_component(cursor: &mut Cursor<'_>) -> Result<f32, ValueError> {
    let domain = Range::new(f64::from(f32::MIN), f64::from(f32::MAX));
    Ok(real(cursor, ParameterType::Float, &Constraint::None, domain)? as f32)
}

fn f64_component(cursor: &mut Cursor<'_>) -> Result<f64, ValueError> {
    let domain = Range::new(f64::MIN, f64::MAX);
    real(cursor, ParameterType::Double, &Constraint::None, domain)
}

fn unit_component(cursor: &mut Cursor<'_>) -> Result<f32, ValueError> {
    let domain = Range::new(0.0, 1.0);
    Ok(real(cursor, ParameterType::Float, &Constraint::None, domain)? as f32)
}

fn hdr_component(cursor: &mut Cursor<'_>) -> Result<f32, ValueError> {
    let domain = Range::new(0.0, f64::from(f32::MAX));
    Ok(real(cursor, ParameterType::Float, &Constraint::None, domain)? as f32)
}

fn values_table(constraint: &Constraint) -> Option<&IndexMap<String, u32>> {
    match constraint {
        Constraint::Values(values) => Some(values),
        _ => None,
    }
}

/// Decodes one value of type `kind` from `cursor`
///
/// On success the cursor is left after the consumed text. On failure the
/// cursor is restored and the value is not produced; callers decide whether
/// the failure is fatal for the directive.
pub fn parse_value(
    kind: ParameterType,
    constraint: &Constraint,
    cursor: &mut Cursor<'_>,
) -> Result<ParameterValue, ValueError> {
    let start = cursor.position();
    let result = decode(kind, constraint, cursor);
    if result.is_err() {
        cursor.restore(start);
    }
    result
}

fn decode(
    kind: ParameterType,
    constraint: &Constraint,
    cursor: &mut Cursor<'_>,
) -> Result<ParameterValue, ValueError> {
    let signed_domain = |low: i64, high: i64| Range::new(low, high);
    let value = match kind {
        ParameterType::Bool => ParameterValue::Bool(parse_bool(cursor)?),
        ParameterType::Int8 => ParameterValue::Int8(signed(
            cursor,
            kind,
            constraint,
            signed_domain(i8::MIN.into(), i8::MAX.into()),
        )? as i8),
        ParameterType::Int16 => ParameterValue::Int16(signed(
            cursor,
            kind,
            constraint,
            signed_domain(i16::MIN.into(), i16::MAX.into()),
        )? as i16),
        ParameterType::Int32 => ParameterValue::Int32(signed(
            cursor,
            kind,
            constraint,
            signed_domain(i32::MIN.into(), i32::MAX.into()),
        )? as i32),
        ParameterType::Int64 => ParameterValue::Int64(signed(
            cursor,
            kind,
            constraint,
            signed_domain(i64::MIN, i64::MAX),
        )?),
        ParameterType::UInt8 => ParameterValue::UInt8(
            unsigned(cursor, kind, constraint, Range::new(0, u8::MAX.into()))? as u8,
        ),
        ParameterType::UInt16 => ParameterValue::UInt16(
            unsigned(cursor, kind, constraint, Range::new(0, u16::MAX.into()))? as u16,
        ),
        ParameterType::UInt32 => ParameterValue::UInt32(
            unsigned(cursor, kind, constraint, Range::new(0, u32::MAX.into()))? as u32,
        ),
        ParameterType::UInt64 => {
            ParameterValue::UInt64(unsigned(cursor, kind, constraint, Range::new(0, u64::MAX))?)
        }
        ParameterType::Float => ParameterValue::Float(real(
            cursor,
            kind,
            constraint,
            Range::new(f64::from(f32::MIN), f64::from(f32::MAX)),
        )? as f32),
        ParameterType::Double => ParameterValue::Double(real(
            cursor,
            kind,
            constraint,
            Range::new(f64::MIN, f64::MAX),
        )?),
        ParameterType::LongDouble => ParameterValue::LongDouble(real(
            cursor,
            kind,
            constraint,
            Range::new(f64::MIN, f64::MAX),
        )?),
        ParameterType::Text | ParameterType::Name | ParameterType::Path => {
            let text = cursor.next_text()?.ok_or(ValueError::Missing {
                expected: kind.name(),
            })?;
            match kind {
                ParameterType::Name if text.is_empty() => return Err(ValueError::EmptyName),
                ParameterType::Name => ParameterValue::Name(text.to_string()),
                ParameterType::Path => ParameterValue::Path(PathBuf::from(text)),
                _ => ParameterValue::Text(text.to_string()),
            }
        }
        ParameterType::Point2I => {
            let [x, y] = components::<_, 2>(cursor, kind, i32_component)?;
            ParameterValue::Point2I(Point2::new(x, y))
        }
        ParameterType::Point3I => {
            let [x, y, z] = components::<_, 3>(cursor, kind, i32_component)?;
            ParameterValue::Point3I(Point3::new(x, y, z))
        }
        ParameterType::Point4I => {
            let [x, y, z, w] = components::<_, 4>(cursor, kind, i32_component)?;
            ParameterValue::Point4I(Point4::new(x, y, z, w))
        }
        ParameterType::Point2F => {
            let [x, y] = components::<_, 2>(cursor, kind, f32_component)?;
            ParameterValue::Point2F(Point2::new(x, y))
        }
        ParameterType::Point3F => {
            let [x, y, z] = components::<_, 3>(cursor, kind, f32_component)?;
            ParameterValue::Point3F(Point3::new(x, y, z))
        }
        ParameterType::Point4F => {
            let [x, y, z, w] = components::<_, 4>(cursor, kind, f32_component)?;
            ParameterValue::Point4F(Point4::new(x, y, z, w))
        }
        ParameterType::Point2D => {
            let [x, y] = components::<_, 2>(cursor, kind, f64_component)?;
            ParameterValue::Point2D(Point2::new(x, y))
        }
        ParameterType::Point3D => {
            let [x, y, z] = components::<_, 3>(cursor, kind, f64_component)?;
            ParameterValue::Point3D(Point3::new(x, y, z))
        }
        ParameterType::Point4D => {
            let [x, y, z, w] = components::<_, 4>(cursor, kind, f64_component)?;
            ParameterValue::Point4D(Point4::new(x, y, z, w))
        }
        ParameterType::Size => {
            let [width, height] = components::<_, 2>(cursor, kind, u32_component)?;
            ParameterValue::Size(Size::new(width, height))
        }
        ParameterType::Position => {
            let [x, y] = components::<_, 2>(cursor, kind, i32_component)?;
            ParameterValue::Position(Position::new(x, y))
        }
        ParameterType::Rectangle => {
            let [left, top, right, bottom] = components::<_, 4>(cursor, kind, i32_component)?;
            ParameterValue::Rectangle(Rectangle::new(left, top, right, bottom))
        }
        ParameterType::RgbColour => {
            let [r, g, b] = components::<_, 3>(cursor, kind, unit_component)?;
            ParameterValue::RgbColour(RgbColour::new(r, g, b))
        }
        ParameterType::RgbaColour => {
            let [r, g, b, a] = components::<_, 4>(cursor, kind, unit_component)?;
            ParameterValue::RgbaColour(RgbaColour::new(r, g, b, a))
        }
        ParameterType::HdrRgbColour => {
            let [r, g, b] = components::<_, 3>(cursor, kind, hdr_component)?;
            ParameterValue::HdrRgbColour(RgbColour::new(r, g, b))
        }
        ParameterType::HdrRgbaColour => {
            let [r, g, b, a] = components::<_, 4>(cursor, kind, hdr_component)?;
            ParameterValue::HdrRgbaColour(RgbaColour::new(r, g, b, a))
        }
        ParameterType::CheckedText => {
            let token = cursor.next_text()?.ok_or(ValueError::Missing {
                expected: kind.name(),
            })?;
            let values = values_table(constraint).ok_or_else(|| ValueError::UnknownToken {
                token: token.to_string(),
                candidates: String::new(),
            })?;
            ParameterValue::CheckedText(lookup(values, token)?)
        }
        ParameterType::BitwiseOred32BitsCheckedText => {
            let text = cursor.take_rest();
            let mut flags = 0u32;
            for token in flag_tokens(text) {
                flags |= match values_table(constraint) {
                    Some(values) => lookup(values, token)?,
                    None => lookup(&IndexMap::<String, u32>::new(), token)?,
                };
            }
            ParameterValue::BitwiseOred32(flags)
        }
        ParameterType::BitwiseOred64BitsCheckedText => {
            let text = cursor.take_rest();
            let mut flags = 0u64;
            for token in flag_tokens(text) {
                flags |= match constraint {
                    Constraint::Values64(values) => lookup(values, token)?,
                    _ => lookup(&IndexMap::<String, u64>::new(), token)?,
                };
            }
            ParameterValue::BitwiseOred64(flags)
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: ParameterType, text: &str) -> Result<ParameterValue, ValueError> {
        let mut cursor = Cursor::new(text);
        parse_value(kind, &kind.default_constraint(), &mut cursor)
    }

    fn filters() -> CheckedValues {
        checked_values([("nearest", 0u32), ("linear", 1u32)])
    }

    #[test]
    fn test_integers_clamp_to_domain() {
        assert_eq!(parse(ParameterType::UInt8, "300"), Ok(ParameterValue::UInt8(255)));
        assert_eq!(parse(ParameterType::UInt32, "-5"), Ok(ParameterValue::UInt32(0)));
        assert_eq!(parse(ParameterType::Int8, "-1000"), Ok(ParameterValue::Int8(-128)));
        assert_eq!(
            parse(ParameterType::Int64, "99999999999999999999999999999999999999999999"),
            Ok(ParameterValue::Int64(i64::MAX))
        );
        assert_eq!(parse(ParameterType::Int32, "+42"), Ok(ParameterValue::Int32(42)));
    }

    #[test]
    fn test_integer_clamps_to_range() {
        let constraint = Constraint::Unsigned(Range::new(0, 8));
        let mut cursor = Cursor::new("12 rest");
        let value = parse_value(ParameterType::UInt32, &constraint, &mut cursor).unwrap();
        assert_eq!(value, ParameterValue::UInt32(8));
        assert_eq!(cursor.remaining(), "rest");
    }

    #[test]
    fn test_invalid_number_restores_cursor() {
        let mut cursor = Cursor::new("abc 1");
        let result = parse_value(
            ParameterType::Float,
            &ParameterType::Float.default_constraint(),
            &mut cursor,
        );
        assert!(matches!(result, Err(ValueError::InvalidNumber { .. })));
        assert_eq!(cursor.remaining(), "abc 1");
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(parse(ParameterType::Double, "NaN").is_err());
    }

    #[test]
    fn test_bool_spellings() {
        assert_eq!(parse(ParameterType::Bool, "TRUE"), Ok(ParameterValue::Bool(true)));
        assert_eq!(parse(ParameterType::Bool, "off"), Ok(ParameterValue::Bool(false)));
        assert!(matches!(
            parse(ParameterType::Bool, "maybe"),
            Err(ValueError::InvalidBool { .. })
        ));
    }

    #[test]
    fn test_text_quoted_and_bare() {
        let mut cursor = Cursor::new("\"Hello World\" next");
        let value = parse_value(ParameterType::Text, &Constraint::None, &mut cursor).unwrap();
        assert_eq!(value, ParameterValue::Text("Hello World".to_string()));
        assert_eq!(cursor.remaining(), "next");

        let value = parse_value(ParameterType::Name, &Constraint::None, &mut cursor).unwrap();
        assert_eq!(value, ParameterValue::Name("next".to_string()));
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_unterminated_quote_is_lexical() {
        let error = parse(ParameterType::Text, "\"open ended").unwrap_err();
        assert!(error.is_lexical());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(parse(ParameterType::Name, "\"\""), Err(ValueError::EmptyName));
        assert_eq!(
            parse(ParameterType::Text, "\"\""),
            Ok(ParameterValue::Text(String::new()))
        );
    }

    #[test]
    fn test_composites_accept_commas() {
        assert_eq!(
            parse(ParameterType::Point3F, "1.5, -2, 0.25"),
            Ok(ParameterValue::Point3F(Point3::new(1.5, -2.0, 0.25)))
        );
        assert_eq!(
            parse(ParameterType::Size, "1024 768"),
            Ok(ParameterValue::Size(Size::new(1024, 768)))
        );
    }

    #[test]
    fn test_composite_failure_names_component() {
        let error = parse(ParameterType::Point3I, "1 2").unwrap_err();
        match error {
            ValueError::Component { index, count, .. } => {
                assert_eq!(index, 3);
                assert_eq!(count, 3);
            }
            other => panic!("Expected component error, got {:?}", other),
        }
    }

    #[test]
    fn test_colours_clamp_components() {
        assert_eq!(
            parse(ParameterType::RgbColour, "2.0 0.5 -1"),
            Ok(ParameterValue::RgbColour(RgbColour::new(1.0, 0.5, 0.0)))
        );
        assert_eq!(
            parse(ParameterType::HdrRgbColour, "2.0 0.5 -1"),
            Ok(ParameterValue::HdrRgbColour(RgbColour::new(2.0, 0.5, 0.0)))
        );
    }

    #[test]
    fn test_checked_text() {
        let constraint = Constraint::Values(filters());
        let mut cursor = Cursor::new("linear");
        assert_eq!(
            parse_value(ParameterType::CheckedText, &constraint, &mut cursor),
            Ok(ParameterValue::CheckedText(1))
        );

        let mut cursor = Cursor::new("bogus");
        match parse_value(ParameterType::CheckedText, &constraint, &mut cursor) {
            Err(ValueError::UnknownToken { token, candidates }) => {
                assert_eq!(token, "bogus");
                assert_eq!(candidates, "nearest, linear");
            }
            other => panic!("Expected unknown token, got {:?}", other),
        }
    }

    #[test]
    fn test_bitwise_ored_flags() {
        let flags = checked_values([("a", 1u32), ("b", 2u32), ("c", 4u32)]);
        let constraint = Constraint::Values(flags);

        let mut cursor = Cursor::new("a | c");
        assert_eq!(
            parse_value(ParameterType::BitwiseOred32BitsCheckedText, &constraint, &mut cursor),
            Ok(ParameterValue::BitwiseOred32(5))
        );
        assert!(cursor.is_exhausted());

        let mut cursor = Cursor::new("");
        assert_eq!(
            parse_value(ParameterType::BitwiseOred32BitsCheckedText, &constraint, &mut cursor),
            Ok(ParameterValue::BitwiseOred32(0))
        );

        let mut cursor = Cursor::new("a|zz");
        assert!(
            parse_value(ParameterType::BitwiseOred32BitsCheckedText, &constraint, &mut cursor)
                .is_err()
        );
    }

    #[test]
    fn test_from_value_conversions() {
        assert_eq!(ParameterValue::CheckedText(3).get::<u32>(), Some(3));
        assert_eq!(ParameterValue::LongDouble(1.5).get::<f64>(), Some(1.5));
        assert_eq!(ParameterValue::Float(1.5).get::<f64>(), None);
        assert_eq!(
            ParameterValue::Name("x".to_string()).get::<String>(),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_display_quotes_text_with_spaces() {
        assert_eq!(ParameterValue::Text("a b".to_string()).to_string(), "\"a b\"");
        assert_eq!(ParameterValue::Text("ab".to_string()).to_string(), "ab");
        assert_eq!(ParameterValue::Text(String::new()).to_string(), "\"\"");
    }

    #[test]
    fn test_every_type_has_distinct_name() {
        let mut names: Vec<_> = ParameterType::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ParameterType::ALL.len());
    }
}
