//! # Section Grammar
//!
//! A streaming, data-driven attribute parser for brace-delimited, section-based
//! description files (scenes, materials, samplers and the like).
//!
//! ## Overview
//!
//! Files are sequences of directives, one per line, each a keyword followed by
//! typed parameters. A directive may open a block delimited by `{` and `}`
//! whose lines are resolved against the block's own section:
//!
//! ```text
//! // samplers used by the scene
//! sampler "Linear"
//! {
//!     min_filter linear
//!     mag_filter linear
//!     max_anisotropy 16
//! }
//! ```
//!
//! The grammar lives entirely in data. Callers register, per section, the
//! keywords they understand together with the ordered list of parameter types
//! each keyword takes. The engine reads the file line by line, decodes and
//! validates the parameters, and calls the handler. Handlers build the
//! caller's objects and announce nested blocks.
//!
//! ## Key Features
//!
//! - **Typed Parameters**: 34 parameter types, from booleans and clamped
//!   integers to points, rectangles, colours and checked enumerations
//! - **Recoverable Diagnostics**: malformed directives are reported and
//!   skipped, the parse carries on
//! - **Includes and Defines**: `include "file"` and `define NAME value`
//! - **Brace Shorthand**: `sampler "Linear" {` and `min_filter linear }`
//! - **Shared Registry**: one immutable registry serves concurrent parses
//!
//! ## Basic Usage
//!
//! ```rust
//! use section_grammar::{
//!     AttributeParser, Block, ParameterType, ParserParameter, Section, SectionRegistry,
//!     checked_values,
//! };
//!
//! const SAMPLER: Section = Section::new(1);
//!
//! let filters = checked_values([("nearest", 0u32), ("linear", 1u32)]);
//!
//! let mut builder = SectionRegistry::builder();
//! builder.register_section(SAMPLER, "sampler");
//! builder.register_parser(
//!     Section::ROOT,
//!     "sampler",
//!     |context, params| {
//!         let name: String = params.require(0)?;
//!         context.set("sampler", name);
//!         Ok(Block::Opens(SAMPLER))
//!     },
//!     vec![ParserParameter::new(ParameterType::Name)],
//! )?;
//! builder.register_parser(
//!     SAMPLER,
//!     "min_filter",
//!     |context, params| {
//!         let filter: u32 = params.require(0)?;
//!         context.set("min_filter", filter);
//!         Ok(Block::None)
//!     },
//!     vec![ParserParameter::checked_text(filters)],
//! )?;
//! let registry = builder.build();
//!
//! let parser = AttributeParser::new(&registry);
//! let result = parser.parse_str(
//!     "scene.cscn",
//!     r#"
//!     sampler "Linear" {
//!         min_filter linear
//!     }
//!     "#,
//! );
//!
//! assert!(result.is_success());
//! assert!(result.diagnostics().is_empty());
//! # Ok::<(), section_grammar::RegistryError>(())
//! ```
//!
//! ## Collecting Results
//!
//! Objects built by handlers live in the [`ParsingContext`] scratch bag. Pass
//! your own context to [`AttributeParser::parse_with`] to read them back, and
//! use the validation hook to reject incomplete input:
//!
//! ```rust
//! use section_grammar::{
//!     AttributeParser, Block, HandlerError, ParameterType, ParserParameter, Section,
//!     SectionRegistry,
//! };
//!
//! let mut builder = SectionRegistry::builder();
//! builder.register_parser(
//!     Section::ROOT,
//!     "threads",
//!     |context, params| {
//!         context.set("threads", params.require::<u8>(0)?);
//!         Ok(Block::None)
//!     },
//!     vec![ParserParameter::new(ParameterType::UInt8)],
//! )?;
//! let registry = builder.build();
//!
//! let parser = AttributeParser::new(&registry);
//! let mut context = parser.context();
//! let result = parser.parse_with(&mut context, "engine.cfg", "threads 300".as_bytes(), |context| {
//!     context
//!         .get::<u8>("threads")
//!         .map(|_| ())
//!         .ok_or_else(|| HandlerError::new("threads not set"))
//! });
//!
//! assert!(result.success);
//! // out-of-range values are clamped into the type's domain
//! assert_eq!(context.take::<u8>("threads"), Some(255));
//! # Ok::<(), section_grammar::RegistryError>(())
//! ```
//!
//! ## Diagnostics
//!
//! Every problem becomes a [`Diagnostic`] in the returned [`ParseResult`] and is
//! also forwarded to the [`log`] facade. Unknown keywords, bad values and
//! handler failures are recovered locally. Unbalanced braces and I/O failures
//! abort the parse and set `success` to false.

pub mod context;
pub mod error;
pub mod parameter;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod types;
pub mod value;

// Re-export main types and functions
pub use context::{ParseState, ParsingContext};
pub use parser::{AttributeParser, ParserConfig};
pub use registry::{
    AttributeHandler, AttributeParserEntry, Block, DiscardHandler, Section, SectionRegistry,
    SectionRegistryBuilder,
};

// Re-export error and diagnostic types
pub use error::{
    Diagnostic, DiagnosticKind, HandlerError, ParseResult, ParserError, RegistryError, Severity,
    ValueError,
};

// Re-export the parameter model
pub use parameter::{DecodeFailure, ParameterList, ParserParameter};
pub use value::{
    CheckedValues, CheckedValues64, Constraint, Cursor, FromValue, ParameterType,
    ParameterValue, checked_values, checked_values64, parse_value,
};

// Re-export value types
pub use types::{
    Point2, Point2d, Point2f, Point2i, Point3, Point3d, Point3f, Point3i, Point4, Point4d,
    Point4f, Point4i, Position, Range, Rectangle, RgbColour, RgbaColour, Size, make_range,
};

// Re-export line reader types
pub use reader::{LineReader, LogicalLine, ReaderConfig, SkipReason, SkippedLine};
