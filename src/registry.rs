//! Section registry: keyword tables per section
//!
//! The registry is assembled once with a [`SectionRegistryBuilder`] and is
//! immutable afterwards, so a single instance can be shared by any number of
//! concurrent parses.

use crate::context::ParsingContext;
use crate::error::{HandlerError, RegistryError};
use crate::parameter::{ParameterList, ParserParameter};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Keyword under which a section's end handler is registered
pub const END_KEYWORD: &str = "}";

/// Opaque section identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Section(pub u32);

impl Section {
    /// Bottom of every section stack, the file level
    pub const ROOT: Section = Section(0);
    /// Sentinel; parsers can never be registered for it
    pub const COUNT: Section = Section(u32::MAX);

    pub const fn new(id: u32) -> Self {
        Section(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Section::ROOT => f.write_str("root"),
            Section::COUNT => f.write_str("count"),
            Section(id) => write!(f, "section#{}", id),
        }
    }
}

/// What a handler asks the engine to do with the following `{`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    /// The directive has no block
    None,
    /// The directive opens a block parsed in the given section
    Opens(Section),
}

/// Handler invoked for one directive
pub trait AttributeHandler: Send + Sync {
    fn handle(
        &self,
        context: &mut ParsingContext,
        params: &ParameterList,
    ) -> Result<Block, HandlerError>;
}

impl<F> AttributeHandler for F
where
    F: Fn(&mut ParsingContext, &ParameterList) -> Result<Block, HandlerError> + Send + Sync,
{
    fn handle(
        &self,
        context: &mut ParsingContext,
        params: &ParameterList,
    ) -> Result<Block, HandlerError> {
        self(context, params)
    }
}

/// Fallback for sections whose lines are free-form (lists of names, raw data)
pub trait DiscardHandler: Send + Sync {
    fn discard(&self, context: &mut ParsingContext, line: &str) -> Result<(), HandlerError>;
}

impl<F> DiscardHandler for F
where
    F: Fn(&mut ParsingContext, &str) -> Result<(), HandlerError> + Send + Sync,
{
    fn discard(&self, context: &mut ParsingContext, line: &str) -> Result<(), HandlerError> {
        self(context, line)
    }
}

/// A registered directive: its handler and parameter prototypes
#[derive(Clone)]
pub struct AttributeParserEntry {
    handler: Arc<dyn AttributeHandler>,
    params: Vec<ParserParameter>,
}

impl AttributeParserEntry {
    pub fn handler(&self) -> &dyn AttributeHandler {
        self.handler.as_ref()
    }

    pub fn params(&self) -> &[ParserParameter] {
        &self.params
    }
}

impl fmt::Debug for AttributeParserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeParserEntry")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Collects registrations; duplicate keys are rejected immediately
#[derive(Default)]
pub struct SectionRegistryBuilder {
    parsers: IndexMap<Section, IndexMap<String, AttributeParserEntry>>,
    discards: IndexMap<Section, Arc<dyn DiscardHandler>>,
    names: IndexMap<Section, String>,
}

impl SectionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name used in diagnostic section paths
    pub fn register_section(&mut self, section: Section, name: impl Into<String>) -> &mut Self {
        self.names.insert(section, name.into());
        self
    }

    /// Registers a closure handler for `keyword` in `section`
    pub fn register_parser<F>(
        &mut self,
        section: Section,
        keyword: &str,
        handler: F,
        params: Vec<ParserParameter>,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&mut ParsingContext, &ParameterList) -> Result<Block, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(section, keyword, handler, params)
    }

    /// Registers any [`AttributeHandler`] implementation
    pub fn register_handler<H>(
        &mut self,
        section: Section,
        keyword: &str,
        handler: H,
        params: Vec<ParserParameter>,
    ) -> Result<&mut Self, RegistryError>
    where
        H: AttributeHandler + 'static,
    {
        if section == Section::COUNT {
            return Err(RegistryError::ReservedSection {
                section: section.to_string(),
            });
        }

        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(RegistryError::EmptyKeyword {
                section: self.display_name(section),
            });
        }

        if self
            .parsers
            .get(&section)
            .is_some_and(|table| table.contains_key(keyword))
        {
            return Err(RegistryError::DuplicateParser {
                section: self.display_name(section),
                keyword: keyword.to_string(),
            });
        }

        self.parsers.entry(section).or_default().insert(
            keyword.to_string(),
            AttributeParserEntry {
                handler: Arc::new(handler),
                params,
            },
        );
        Ok(self)
    }

    /// Registers the handler run when `section`'s block closes
    pub fn register_end<F>(&mut self, section: Section, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&mut ParsingContext, &ParameterList) -> Result<Block, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(section, END_KEYWORD, handler, Vec::new())
    }

    /// Registers the fallback for unknown lines in `section`
    pub fn register_discard<F>(&mut self, section: Section, handler: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&mut ParsingContext, &str) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        if section == Section::COUNT {
            return Err(RegistryError::ReservedSection {
                section: section.to_string(),
            });
        }
        if self.discards.contains_key(&section) {
            return Err(RegistryError::DuplicateDiscard {
                section: self.display_name(section),
            });
        }
        self.discards.insert(section, Arc::new(handler));
        Ok(self)
    }

    pub fn build(self) -> SectionRegistry {
        log::debug!(
            "section registry built: {} sections, {} parsers, {} discard handlers",
            self.parsers.len(),
            self.parsers.values().map(IndexMap::len).sum::<usize>(),
            self.discards.len()
        );
        SectionRegistry {
            parsers: self.parsers,
            discards: self.discards,
            names: Arc::new(self.names),
        }
    }

    fn display_name(&self, section: Section) -> String {
        self.names
            .get(&section)
            .cloned()
            .unwrap_or_else(|| section.to_string())
    }
}

impl fmt::Debug for SectionRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionRegistryBuilder")
            .field("parsers", &self.parsers)
            .field("discards", &self.discards.keys().collect::<Vec<_>>())
            .field("names", &self.names)
            .finish()
    }
}

/// Immutable `(section, keyword) → entry` table
pub struct SectionRegistry {
    parsers: IndexMap<Section, IndexMap<String, AttributeParserEntry>>,
    discards: IndexMap<Section, Arc<dyn DiscardHandler>>,
    names: Arc<IndexMap<Section, String>>,
}

impl SectionRegistry {
    pub fn builder() -> SectionRegistryBuilder {
        SectionRegistryBuilder::new()
    }

    /// Entry for `keyword` in `section`; other sections are never consulted
    pub fn lookup(&self, section: Section, keyword: &str) -> Option<&AttributeParserEntry> {
        self.parsers.get(&section)?.get(keyword)
    }

    /// End handler of `section`, if one was registered
    pub fn end_handler(&self, section: Section) -> Option<&AttributeParserEntry> {
        self.lookup(section, END_KEYWORD)
    }

    pub fn discard(&self, section: Section) -> Option<&dyn DiscardHandler> {
        self.discards.get(&section).map(|handler| handler.as_ref())
    }

    pub fn section_name(&self, section: Section) -> Option<&str> {
        self.names.get(&section).map(String::as_str)
    }

    /// Keywords registered in `section`, in registration order
    pub fn keywords(&self, section: Section) -> impl Iterator<Item = &str> {
        self.parsers
            .get(&section)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }

    pub(crate) fn names(&self) -> Arc<IndexMap<Section, String>> {
        Arc::clone(&self.names)
    }
}

impl fmt::Debug for SectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionRegistry")
            .field("parsers", &self.parsers)
            .field("discards", &self.discards.keys().collect::<Vec<_>>())
            .field("names", &self.names)
            .finish()
    }
}
