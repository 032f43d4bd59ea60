//! Parser parameters: declared type, validation, and the decoded value
//!
//! Parameters are registered as prototypes alongside each directive. For
//! every directive line the prototypes are cloned, filled from the line text
//! and handed to the handler as a [`ParameterList`].

use crate::error::{HandlerError, ValueError};
use crate::types::Range;
use crate::value::{
    CheckedValues, CheckedValues64, Constraint, Cursor, FromValue, ParameterType,
    ParameterValue, parse_value,
};
use smallvec::SmallVec;
use std::ops::Index;

/// Scalar types a clamping range can be built from
pub trait RangeValue: Copy + PartialOrd {
    fn into_constraint(range: Range<Self>) -> Constraint;
}

macro_rules! impl_range_value {
    ($variant:ident, $wide:ty => $($ty:ty),+) => {
        $(
            impl RangeValue for $ty {
                fn into_constraint(range: Range<Self>) -> Constraint {
                    Constraint::$variant(Range::new(
                        <$wide>::from(range.low()),
                        <$wide>::from(range.high()),
                    ))
                }
            }
        )+
    };
}

impl_range_value!(Signed, i64 => i8, i16, i32, i64);
impl_range_value!(Unsigned, u64 => u8, u16, u32, u64);
impl_range_value!(Real, f64 => f32, f64);

/// One typed directive parameter
///
/// Arithmetic parameters always carry a range, defaulting to the full domain
/// of their type. A parameter that failed to decode stays unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserParameter {
    kind: ParameterType,
    constraint: Constraint,
    default: Option<ParameterValue>,
    value: Option<ParameterValue>,
}

impl ParserParameter {
    /// Unset parameter of type `kind`; arithmetic types get their full range
    pub fn new(kind: ParameterType) -> Self {
        Self {
            kind,
            constraint: kind.default_constraint(),
            default: None,
            value: None,
        }
    }

    /// Single token validated against `values`
    pub fn checked_text(values: CheckedValues) -> Self {
        Self {
            constraint: Constraint::Values(values),
            ..Self::new(ParameterType::CheckedText)
        }
    }

    /// `|`-separated tokens from `values`, ORed into 32 bits
    pub fn bitwise_ored32(values: CheckedValues) -> Self {
        Self {
            constraint: Constraint::Values(values),
            ..Self::new(ParameterType::BitwiseOred32BitsCheckedText)
        }
    }

    /// `|`-separated tokens from `values`, ORed into 64 bits
    pub fn bitwise_ored64(values: CheckedValues64) -> Self {
        Self {
            constraint: Constraint::Values64(values),
            ..Self::new(ParameterType::BitwiseOred64BitsCheckedText)
        }
    }

    /// Restricts an arithmetic parameter; decoded values are clamped into
    /// `range`
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the parameter type, e.g. a `Range<f32>`
    /// on an `Int32` parameter.
    pub fn with_range<T: RangeValue>(mut self, range: Range<T>) -> Self {
        let constraint = T::into_constraint(range);
        assert!(
            std::mem::discriminant(&constraint) == std::mem::discriminant(&self.constraint),
            "range does not match parameter type <{}>",
            self.kind
        );
        self.constraint = constraint;
        self
    }

    /// Value used when the directive text ends before this parameter
    ///
    /// # Panics
    ///
    /// Panics if `value` is not of the parameter type.
    pub fn with_default(mut self, value: ParameterValue) -> Self {
        assert_eq!(value.kind(), self.kind, "default value type mismatch");
        self.default = Some(value);
        self
    }

    /// Declared type of the parameter
    pub fn kind(&self) -> ParameterType {
        self.kind
    }

    /// Type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn default_value(&self) -> Option<&ParameterValue> {
        self.default.as_ref()
    }

    /// Whether the last decode produced a value
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&ParameterValue> {
        self.value.as_ref()
    }

    pub fn get<T: FromValue>(&self) -> Option<T> {
        self.value.as_ref().and_then(T::from_value)
    }

    /// Decodes this parameter from `cursor`; on failure it stays unset
    pub fn parse(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ValueError> {
        self.value = None;
        let value = parse_value(self.kind, &self.constraint, cursor)?;
        self.value = Some(value);
        Ok(())
    }

    /// Sets the parameter to its default, if it has one
    pub fn apply_default(&mut self) -> bool {
        match &self.default {
            Some(default) => {
                self.value = Some(default.clone());
                true
            }
            None => false,
        }
    }

    /// Clears the decoded value
    pub fn reset(&mut self) {
        self.value = None;
    }

    /// Text form of the value that decodes back to it; checked values are
    /// written with their table names
    pub fn to_text(&self) -> Option<String> {
        let value = self.value.as_ref()?;
        let text = match (value, &self.constraint) {
            (ParameterValue::CheckedText(v), Constraint::Values(values)) => values
                .iter()
                .find(|(_, value)| *value == v)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| v.to_string()),
            (ParameterValue::BitwiseOred32(v), Constraint::Values(values)) => values
                .iter()
                .filter(|(_, flag)| **flag != 0 && *v & **flag == **flag)
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            (ParameterValue::BitwiseOred64(v), Constraint::Values64(values)) => values
                .iter()
                .filter(|(_, flag)| **flag != 0 && *v & **flag == **flag)
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            _ => value.to_string(),
        };
        Some(text)
    }
}

impl From<ParameterType> for ParserParameter {
    fn from(kind: ParameterType) -> Self {
        Self::new(kind)
    }
}

/// A declared parameter that could not be decoded
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    pub index: usize,
    pub kind: ParameterType,
    pub error: ValueError,
}

/// Parameters passed to a handler, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterList {
    params: SmallVec<[ParserParameter; 4]>,
    trailing: Option<String>,
}

impl ParameterList {
    /// Creates an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills clones of `prototypes` from `text`
    ///
    /// Decoding stops at the first failure or when the text runs out; the
    /// remaining parameters are left unset (or take their default). Text left
    /// after the last declared parameter is kept as [`trailing`](Self::trailing).
    pub fn decode(prototypes: &[ParserParameter], text: &str) -> (Self, Option<DecodeFailure>) {
        let mut cursor = Cursor::new(text);
        let mut list = Self::default();
        let mut failure = None;

        for (index, prototype) in prototypes.iter().enumerate() {
            let mut param = prototype.clone();
            param.reset();

            if failure.is_none() {
                if cursor.is_exhausted() {
                    param.apply_default();
                } else if let Err(error) = param.parse(&mut cursor) {
                    failure = Some(DecodeFailure {
                        index,
                        kind: param.kind(),
                        error,
                    });
                }
            }

            list.params.push(param);
        }

        if failure.is_none() && !cursor.is_exhausted() {
            list.trailing = Some(cursor.take_rest().to_string());
        }

        (list, failure)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParserParameter> {
        self.params.iter()
    }

    pub fn param(&self, index: usize) -> Option<&ParserParameter> {
        self.params.get(index)
    }

    /// Number of parameters holding a value
    pub fn set_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_set()).count()
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(ParserParameter::is_set)
    }

    /// Value at `index`, if set and convertible to `T`
    pub fn get<T: FromValue>(&self, index: usize) -> Option<T> {
        self.params.get(index).and_then(ParserParameter::get)
    }

    /// Like [`get`](Self::get) but reports a missing value as a handler error
    pub fn require<T: FromValue>(&self, index: usize) -> Result<T, HandlerError> {
        self.get(index).ok_or_else(|| {
            let type_name = self
                .params
                .get(index)
                .map(ParserParameter::type_name)
                .unwrap_or("parameter");
            HandlerError::missing_parameter(index, type_name)
        })
    }

    /// Undeclared text left at the end of the directive
    pub fn trailing(&self) -> Option<&str> {
        self.trailing.as_deref()
    }
}

impl Index<usize> for ParameterList {
    type Output = ParserParameter;

    fn index(&self, index: usize) -> &Self::Output {
        &self.params[index]
    }
}

impl FromIterator<ParserParameter> for ParameterList {
    fn from_iter<I: IntoIterator<Item = ParserParameter>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
            trailing: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::make_range;
    use crate::value::{checked_values, checked_values64};

    #[test]
    fn test_arithmetic_parameters_have_full_range() {
        let param = ParserParameter::new(ParameterType::UInt16);
        assert_eq!(
            param.constraint(),
            &Constraint::Unsigned(Range::new(0, u64::from(u16::MAX)))
        );
        assert!(!param.is_set());
    }

    #[test]
    fn test_with_range_clamps() {
        let mut param =
            ParserParameter::new(ParameterType::Float).with_range(make_range(0.0f32, 1.0f32));
        param.parse(&mut Cursor::new("4.5")).unwrap();
        assert_eq!(param.get::<f32>(), Some(1.0));
    }

    #[test]
    #[should_panic(expected = "range does not match parameter type <int32>")]
    fn test_range_of_wrong_type_panics() {
        let _ = ParserParameter::new(ParameterType::Int32).with_range(make_range(0.0f32, 1.0f32));
    }

    #[test]
    #[should_panic(expected = "range does not match parameter type <name>")]
    fn test_range_on_non_arithmetic_panics() {
        let _ = ParserParameter::new(ParameterType::Name).with_range(make_range(0u8, 4u8));
    }

    #[test]
    fn test_failed_parse_leaves_unset() {
        let mut param = ParserParameter::new(ParameterType::Int32);
        param.parse(&mut Cursor::new("12")).unwrap();
        assert!(param.is_set());

        assert!(param.parse(&mut Cursor::new("twelve")).is_err());
        assert!(!param.is_set());
        assert_eq!(param.value(), None);
    }

    #[test]
    fn test_decode_stops_when_text_runs_out() {
        let prototypes = [
            ParserParameter::new(ParameterType::Name),
            ParserParameter::new(ParameterType::Float),
            ParserParameter::new(ParameterType::Bool),
        ];
        let (list, failure) = ParameterList::decode(&prototypes, "light 2.5");

        assert!(failure.is_none());
        assert_eq!(list.len(), 3);
        assert_eq!(list.get::<String>(0), Some("light".to_string()));
        assert_eq!(list.get::<f32>(1), Some(2.5));
        assert!(!list.is_set(2));
        assert_eq!(list.set_count(), 2);
    }

    #[test]
    fn test_decode_applies_defaults() {
        let prototypes = [ParserParameter::new(ParameterType::Bool)
            .with_default(ParameterValue::Bool(true))];
        let (list, failure) = ParameterList::decode(&prototypes, "");

        assert!(failure.is_none());
        assert_eq!(list.get::<bool>(0), Some(true));
    }

    #[test]
    fn test_decode_reports_first_failure() {
        let prototypes = [
            ParserParameter::new(ParameterType::Int32),
            ParserParameter::new(ParameterType::Int32),
            ParserParameter::new(ParameterType::Int32),
        ];
        let (list, failure) = ParameterList::decode(&prototypes, "1 x 3");

        let failure = failure.expect("Expected a decode failure");
        assert_eq!(failure.index, 1);
        assert_eq!(failure.kind, ParameterType::Int32);
        assert!(list.is_set(0));
        assert!(!list.is_set(1));
        assert!(!list.is_set(2));
        assert_eq!(list.trailing(), None);
    }

    #[test]
    fn test_decode_keeps_trailing_text() {
        let prototypes = [ParserParameter::new(ParameterType::UInt32)];
        let (list, _) = ParameterList::decode(&prototypes, "4 extra words");
        assert_eq!(list.trailing(), Some("extra words"));
    }

    #[test]
    fn test_require_names_missing_type() {
        let prototypes = [ParserParameter::new(ParameterType::Point3F)];
        let (list, _) = ParameterList::decode(&prototypes, "");
        let error = list.require::<crate::types::Point3f>(0).unwrap_err();
        assert!(error.message.contains("<3 floats point>"));
    }

    #[test]
    fn test_checked_text_to_text_uses_names() {
        let mut param =
            ParserParameter::checked_text(checked_values([("nearest", 0u32), ("linear", 1u32)]));
        param.parse(&mut Cursor::new("linear")).unwrap();
        assert_eq!(param.get::<u32>(), Some(1));
        assert_eq!(param.to_text(), Some("linear".to_string()));
    }

    #[test]
    fn test_flags64_above_bit_31() {
        let mut param = ParserParameter::bitwise_ored64(checked_values64([
            ("low", 1u64),
            ("middle", 1u64 << 31),
            ("high", 1u64 << 40),
            ("top", 1u64 << 63),
        ]));
        assert!(matches!(param.constraint(), Constraint::Values64(_)));

        param.parse(&mut Cursor::new("top | low|high")).unwrap();
        assert_eq!(param.get::<u64>(), Some((1 << 63) | (1 << 40) | 1));
        assert_eq!(param.get::<u32>(), None);
        assert_eq!(param.to_text(), Some("low|high|top".to_string()));

        assert!(matches!(
            param.parse(&mut Cursor::new("high|huge")),
            Err(ValueError::UnknownToken { .. })
        ));
        assert!(!param.is_set());
    }

    #[test]
    fn test_flags_to_text() {
        let mut param = ParserParameter::bitwise_ored32(checked_values([
            ("read", 1u32),
            ("write", 2u32),
            ("exec", 4u32),
        ]));
        param.parse(&mut Cursor::new("exec|read")).unwrap();
        assert_eq!(param.get::<u32>(), Some(5));
        assert_eq!(param.to_text(), Some("read|exec".to_string()));
    }
}
