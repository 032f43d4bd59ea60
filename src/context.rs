//! Mutable state of one parse

use crate::error::{Diagnostic, DiagnosticKind, Severity};
use crate::registry::{Section, SectionRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the engine stands in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseState {
    /// At file level, only `ROOT` on the stack
    ParsingFile,
    /// Inside a block; `depth` counts open blocks
    InSection { section: Section, depth: usize },
    /// Aborted by a fatal diagnostic or a failed validation
    Error,
    /// Reached end of input and validated
    Done,
}

/// Section stack, position, diagnostics and caller scratch objects of one
/// parse
///
/// Handlers receive the context mutably and keep the objects they build in
/// the scratch bag, keyed by name:
///
/// ```
/// use section_grammar::{ParsingContext, SectionRegistry};
///
/// let registry = SectionRegistry::builder().build();
/// let mut context = ParsingContext::new(&registry);
/// context.set("samplers", Vec::<String>::new());
/// context.get_mut::<Vec<String>>("samplers").unwrap().push("Linear".into());
/// assert_eq!(context.get::<Vec<String>>("samplers").unwrap().len(), 1);
/// ```
pub struct ParsingContext {
    names: Arc<IndexMap<Section, String>>,
    sections: SmallVec<[Section; 8]>,
    path: PathBuf,
    line: u64,
    keyword: String,
    diagnostics: Vec<Diagnostic>,
    scratch: IndexMap<String, Box<dyn Any + Send>>,
    outcome: Option<ParseState>,

    /// Section announced by the last handler, waiting for its `{`
    pub(crate) pending: Option<Section>,
    /// Set when the next `{` belongs to a directive that was not handled
    pub(crate) ignore_next_block: bool,
    /// Nesting level inside a skipped block
    pub(crate) ignore_depth: usize,
    pub(crate) defines: IndexMap<String, String>,
    pub(crate) include_depth: usize,
}

impl ParsingContext {
    /// Creates a context using `registry`'s section names for diagnostics
    pub fn new(registry: &SectionRegistry) -> Self {
        Self {
            names: registry.names(),
            sections: smallvec![Section::ROOT],
            path: PathBuf::new(),
            line: 0,
            keyword: String::new(),
            diagnostics: Vec::new(),
            scratch: IndexMap::new(),
            outcome: None,
            pending: None,
            ignore_next_block: false,
            ignore_depth: 0,
            defines: IndexMap::new(),
            include_depth: 0,
        }
    }

    /// Opens `section` on top of the stack
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Pops the top section; `ROOT` is never popped
    pub fn pop_section(&mut self) -> Option<Section> {
        if self.sections.len() > 1 {
            self.sections.pop()
        } else {
            None
        }
    }

    /// Section on top of the stack, `ROOT` outside any block
    pub fn current_section(&self) -> Section {
        self.sections.last().copied().unwrap_or(Section::ROOT)
    }

    /// Stack size, `ROOT` included
    pub fn depth(&self) -> usize {
        self.sections.len()
    }

    /// Open sections from `ROOT` to the innermost one
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Where the engine is: at file level, inside a section, or finished
    pub fn state(&self) -> ParseState {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        match self.sections.len() {
            0 | 1 => ParseState::ParsingFile,
            len => ParseState::InSection {
                section: self.current_section(),
                depth: len - 1,
            },
        }
    }

    /// Line number of the directive being processed
    pub fn line(&self) -> u64 {
        self.line
    }

    /// File being read (the included file while inside an include)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keyword of the directive being processed
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn section_name(&self, section: Section) -> String {
        self.names
            .get(&section)
            .cloned()
            .unwrap_or_else(|| section.to_string())
    }

    /// `scene::sampler::min_filter` style path of the current directive
    pub fn section_path(&self) -> String {
        let mut parts: Vec<String> = self
            .sections
            .iter()
            .skip(1)
            .map(|section| self.section_name(*section))
            .collect();
        if !self.keyword.is_empty() {
            parts.push(self.keyword.clone());
        }
        if parts.is_empty() {
            self.section_name(Section::ROOT)
        } else {
            parts.join("::")
        }
    }

    /// Value of a textual define, if any
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    /// Stores `value` under `name`, replacing any previous object
    pub fn set<T: Any + Send>(&mut self, name: impl Into<String>, value: T) {
        self.scratch.insert(name.into(), Box::new(value));
    }

    pub fn get<T: Any + Send>(&self, name: &str) -> Option<&T> {
        self.scratch.get(name)?.downcast_ref()
    }

    pub fn get_mut<T: Any + Send>(&mut self, name: &str) -> Option<&mut T> {
        self.scratch.get_mut(name)?.downcast_mut()
    }

    /// Removes and returns the object if it has type `T`; an object of
    /// another type is left in place
    pub fn take<T: Any + Send>(&mut self, name: &str) -> Option<T> {
        if !self.scratch.get(name)?.is::<T>() {
            return None;
        }
        let value = self.scratch.shift_remove(name)?;
        value.downcast().ok().map(|boxed| *boxed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scratch.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.scratch.shift_remove(name).is_some()
    }

    /// Records a handler warning at the current directive
    pub fn warning(&mut self, message: impl Into<String>) {
        self.report_with(DiagnosticKind::Handler, Severity::Warning, message.into());
    }

    /// Records a handler error at the current directive
    pub fn error(&mut self, message: impl Into<String>) {
        self.report_with(DiagnosticKind::Handler, Severity::Error, message.into());
    }

    /// Records a diagnostic of `kind` with its default severity
    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.report_with(kind, kind.severity(), message.into());
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    fn report_with(&mut self, kind: DiagnosticKind, severity: Severity, message: String) {
        let diagnostic = Diagnostic::new(kind, &self.path, self.line, self.section_path(), message)
            .with_severity(severity);
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn set_position(&mut self, path: &Path, line: u64) {
        self.path = path.to_path_buf();
        self.line = line;
        self.keyword.clear();
    }

    pub(crate) fn begin_line(&mut self, line: u64) {
        self.line = line;
        self.keyword.clear();
    }

    pub(crate) fn set_keyword(&mut self, keyword: &str) {
        self.keyword.clear();
        self.keyword.push_str(keyword);
    }

    pub(crate) fn clear_keyword(&mut self) {
        self.keyword.clear();
    }

    /// Resets engine state left over from a previous parse, defines
    /// included; the scratch bag and earlier diagnostics are kept
    pub(crate) fn begin_parse(&mut self) {
        self.outcome = None;
        self.defines.clear();
        self.sections.truncate(1);
        self.pending = None;
        self.ignore_next_block = false;
        self.ignore_depth = 0;
        self.include_depth = 0;
    }

    pub(crate) fn finish(&mut self, state: ParseState) {
        self.outcome = Some(state);
    }
}

impl std::fmt::Debug for ParsingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsingContext")
            .field("sections", &self.sections)
            .field("path", &self.path)
            .field("line", &self.line)
            .field("keyword", &self.keyword)
            .field("diagnostics", &self.diagnostics.len())
            .field("scratch", &self.scratch.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
