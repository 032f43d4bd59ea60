//! Attribute parser engine
//!
//! Streams logical lines from a [`LineReader`], resolves each directive
//! against the section on top of the context's stack, decodes its parameters
//! and invokes the registered handler. Blocks are opened by handlers
//! returning [`Block::Opens`] and closed by `}` lines.

use crate::context::{ParseState, ParsingContext};
use crate::error::{DiagnosticKind, Diagnostic, HandlerError, ParseResult, ParserError};
use crate::parameter::ParameterList;
use crate::reader::{LineReader, ReaderConfig};
use crate::registry::{Block, Section, SectionRegistry};
use crate::value::Cursor;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Built-in directive reading another file in place
pub const INCLUDE_KEYWORD: &str = "include";

/// Built-in directive declaring a textual substitution
pub const DEFINE_KEYWORD: &str = "define";

/// Characters that delimit the words a define can replace
const DEFINE_SEPARATORS: &str = " \t,;:?./-*+=(){}[]|";

/// Configuration for the attribute parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Line reader options
    pub reader: ReaderConfig,
    /// Maximum number of simultaneously open blocks
    pub max_depth: usize,
    /// Maximum nesting of `include` directives
    pub max_include_depth: usize,
    /// Handle `include` when a section does not register it
    pub allow_includes: bool,
    /// Handle `define` when a section does not register it
    pub allow_defines: bool,
    /// Skip the block of an unhandled directive without a diagnostic
    pub ignore_unknown_blocks: bool,
}

impl ParserConfig {
    /// Creates a parser configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the line reader options
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Sets the maximum number of simultaneously open blocks
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum nesting of `include` directives
    pub fn with_max_include_depth(mut self, max_include_depth: usize) -> Self {
        self.max_include_depth = max_include_depth;
        self
    }

    /// Enables or disables the built-in `include` directive
    pub fn with_includes(mut self, allow: bool) -> Self {
        self.allow_includes = allow;
        self
    }

    /// Enables or disables the built-in `define` directive
    pub fn with_defines(mut self, allow: bool) -> Self {
        self.allow_defines = allow;
        self
    }

    /// Skips blocks of unhandled directives silently when `true`, with a
    /// lexical warning otherwise
    pub fn with_ignore_unknown_blocks(mut self, ignore: bool) -> Self {
        self.ignore_unknown_blocks = ignore;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            max_depth: 64,
            max_include_depth: 16,
            allow_includes: true,
            allow_defines: true,
            ignore_unknown_blocks: true,
        }
    }
}

/// Drives parses against a shared, immutable registry
///
/// The parser itself holds no per-parse state, so one instance can serve
/// several threads at once.
#[derive(Debug, Clone)]
pub struct AttributeParser<'r> {
    registry: &'r SectionRegistry,
    config: ParserConfig,
}

impl<'r> AttributeParser<'r> {
    /// Creates a parser over `registry` with the default configuration
    pub fn new(registry: &'r SectionRegistry) -> Self {
        Self::with_config(registry, ParserConfig::default())
    }

    /// Creates a parser over `registry` with a custom configuration
    pub fn with_config(registry: &'r SectionRegistry, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    /// Returns the parser configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns the registry directives are resolved against
    pub fn registry(&self) -> &'r SectionRegistry {
        self.registry
    }

    /// Fresh context bound to this parser's registry
    pub fn context(&self) -> ParsingContext {
        ParsingContext::new(self.registry)
    }

    /// Parses the file at `path`
    pub fn parse_file(&self, path: impl AsRef<Path>) -> ParseResult {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => self.parse_reader(path, BufReader::new(file)),
            Err(source) => {
                let error = ParserError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                let diagnostic = Diagnostic::new(
                    error.kind(),
                    path,
                    0,
                    self.context().section_path(),
                    error.to_string(),
                );
                diagnostic.log();
                ParseResult {
                    success: false,
                    diagnostics: vec![diagnostic],
                }
            }
        }
    }

    /// Parses in-memory text; `name` is used as the path in diagnostics and
    /// as the base directory for includes
    pub fn parse_str(&self, name: impl AsRef<Path>, text: &str) -> ParseResult {
        self.parse_reader(name, text.as_bytes())
    }

    /// Parses any buffered reader with a fresh context
    pub fn parse_reader<R: BufRead>(&self, name: impl AsRef<Path>, reader: R) -> ParseResult {
        let mut context = self.context();
        self.parse_with(&mut context, name, reader, |_| Ok(()))
    }

    /// Parses with a caller-supplied context, then runs `validate` if the
    /// input was structurally complete
    ///
    /// Handlers leave the objects they build in the context's scratch bag;
    /// `validate` is where the caller commits them. A failing `validate`
    /// marks the parse unsuccessful.
    pub fn parse_with<R, V>(
        &self,
        context: &mut ParsingContext,
        name: impl AsRef<Path>,
        reader: R,
        validate: V,
    ) -> ParseResult
    where
        R: BufRead,
        V: FnOnce(&mut ParsingContext) -> Result<(), HandlerError>,
    {
        let path = name.as_ref();
        log::info!("parsing {}", path.display());

        let first = context.diagnostics().len();
        context.begin_parse();

        let outcome = self
            .run_source(context, path, reader)
            .and_then(|()| self.finish_source(context));

        let success = match outcome {
            Ok(()) => match validate(&mut *context) {
                Ok(()) => true,
                Err(error) => {
                    context.clear_keyword();
                    context.report(DiagnosticKind::Validation, error.message);
                    false
                }
            },
            Err(_) => false,
        };

        context.finish(if success {
            ParseState::Done
        } else {
            ParseState::Error
        });

        let diagnostics = context.diagnostics()[first..].to_vec();
        log::info!(
            "finished {}: {} ({} diagnostics)",
            path.display(),
            if success { "success" } else { "failure" },
            diagnostics.len()
        );

        ParseResult {
            success,
            diagnostics,
        }
    }

    /// Records a fatal error at the current position and hands it back for
    /// propagation
    fn fail(&self, context: &mut ParsingContext, error: ParserError) -> ParserError {
        context.report(error.kind(), error.to_string());
        error
    }

    fn run_source<R: BufRead>(
        &self,
        context: &mut ParsingContext,
        path: &Path,
        source: R,
    ) -> Result<(), ParserError> {
        context.set_position(path, 0);
        let mut reader = LineReader::with_config(source, self.config.reader.clone());

        loop {
            let next = reader.next_line();

            for skipped in reader.drain_skipped() {
                context.begin_line(skipped.line);
                context.report(DiagnosticKind::Lexical, skipped.to_string());
            }

            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(()),
                Err(source) => {
                    let error = ParserError::Io {
                        path: path.to_path_buf(),
                        source,
                    };
                    return Err(self.fail(context, error));
                }
            };

            context.begin_line(line.line);
            self.process_line(context, &line.text)?;
        }
    }

    /// End of the top-level input: pending blocks and the brace balance
    fn finish_source(&self, context: &mut ParsingContext) -> Result<(), ParserError> {
        if let Some(section) = context.pending.take() {
            self.emulate_block(context, section)?;
        }

        let open = context.depth() - 1 + context.ignore_depth;
        if open > 0 {
            context.clear_keyword();
            let error = ParserError::structural(format!(
                "unexpected end of file, {} block(s) still open, missing '}}'",
                open
            ));
            return Err(self.fail(context, error));
        }

        Ok(())
    }

    fn process_line(&self, context: &mut ParsingContext, line: &str) -> Result<(), ParserError> {
        if context.ignore_depth > 0 {
            match line {
                "{" => context.ignore_depth += 1,
                "}" => context.ignore_depth -= 1,
                _ => {}
            }
            return Ok(());
        }

        if line == "{" {
            if let Some(section) = context.pending.take() {
                context.ignore_next_block = false;
                return self.open_block(context, section);
            }

            context.ignore_depth = 1;
            if std::mem::take(&mut context.ignore_next_block) {
                if !self.config.ignore_unknown_blocks {
                    context.report(
                        DiagnosticKind::Lexical,
                        "block of an unhandled directive skipped",
                    );
                }
            } else {
                context.report(
                    DiagnosticKind::Lexical,
                    "'{' without a preceding block directive, block skipped",
                );
            }
            return Ok(());
        }

        if let Some(section) = context.pending.take() {
            self.emulate_block(context, section)?;
        }
        context.ignore_next_block = false;

        if line == "}" {
            return self.close_block(context);
        }

        let (keyword, rest) = split_keyword(line);
        context.set_keyword(keyword);
        self.dispatch(context, line, keyword, rest)
    }

    fn open_block(&self, context: &mut ParsingContext, section: Section) -> Result<(), ParserError> {
        if context.depth() > self.config.max_depth {
            let error = ParserError::structural(format!(
                "maximum block nesting depth of {} exceeded",
                self.config.max_depth
            ));
            return Err(self.fail(context, error));
        }

        context.push_section(section);
        log::trace!(
            "{}:{}: opened [{}]",
            context.path().display(),
            context.line(),
            context.section_path()
        );
        Ok(())
    }

    fn close_block(&self, context: &mut ParsingContext) -> Result<(), ParserError> {
        if context.depth() <= 1 {
            return Err(self.fail(context, ParserError::structural("unmatched '}'")));
        }

        let section = context.current_section();
        if let Some(entry) = self.registry.end_handler(section) {
            let (params, _) = ParameterList::decode(entry.params(), "");
            match entry.handler().handle(context, &params) {
                Ok(Block::None) => {}
                Ok(Block::Opens(opened)) => log::debug!(
                    "end handler of [{}] asked to open {}, ignored",
                    context.section_path(),
                    opened
                ),
                Err(error) => context.report(DiagnosticKind::Handler, error.message),
            }
        }

        context.pop_section();
        Ok(())
    }

    /// A block directive followed by something other than `{` behaves as if
    /// its block were empty
    fn emulate_block(&self, context: &mut ParsingContext, section: Section) -> Result<(), ParserError> {
        log::debug!(
            "{}:{}: no block after [{}], emulating an empty one",
            context.path().display(),
            context.line(),
            context.section_path()
        );
        self.open_block(context, section)?;
        self.close_block(context)
    }

    fn dispatch(
        &self,
        context: &mut ParsingContext,
        line: &str,
        keyword: &str,
        rest: &str,
    ) -> Result<(), ParserError> {
        let section = context.current_section();

        if let Some(entry) = self.registry.lookup(section, keyword) {
            let text = substitute(&context.defines, rest);
            let (params, failure) = ParameterList::decode(entry.params(), &text);

            if let Some(failure) = failure {
                context.report(
                    failure.error.kind(),
                    format!(
                        "parameter {} <{}>: {}",
                        failure.index + 1,
                        failure.kind,
                        failure.error
                    ),
                );
                if failure.error.is_lexical() {
                    context.ignore_next_block = true;
                    return Ok(());
                }
            }

            log::trace!(
                "{}:{}: [{}] {}",
                context.path().display(),
                context.line(),
                context.section_path(),
                text
            );

            match entry.handler().handle(context, &params) {
                Ok(Block::None) => {}
                Ok(Block::Opens(opened)) => context.pending = Some(opened),
                Err(error) => {
                    context.report(DiagnosticKind::Handler, error.message);
                    context.ignore_next_block = true;
                }
            }
            return Ok(());
        }

        match keyword {
            INCLUDE_KEYWORD if self.config.allow_includes => return self.include(context, rest),
            DEFINE_KEYWORD if self.config.allow_defines => {
                self.define(context, rest);
                return Ok(());
            }
            _ => {}
        }

        if let Some(discard) = self.registry.discard(section) {
            let line = line.trim_end();
            let head = &line[..line.len() - rest.len()];
            let line = match substitute(&context.defines, rest) {
                Cow::Borrowed(_) => Cow::Borrowed(line),
                Cow::Owned(text) => Cow::Owned(format!("{}{}", head, text)),
            };
            if let Err(error) = discard.discard(context, &line) {
                context.report(DiagnosticKind::Handler, error.message);
            }
            return Ok(());
        }

        context.report(
            DiagnosticKind::UnknownDirective,
            format!("unknown directive '{}'", keyword),
        );
        context.ignore_next_block = true;
        Ok(())
    }

    fn include(&self, context: &mut ParsingContext, rest: &str) -> Result<(), ParserError> {
        let rest = substitute(&context.defines, rest);
        let target = match Cursor::new(&rest).next_text() {
            Ok(Some(target)) if !target.is_empty() => target.to_string(),
            Ok(_) => {
                context.report(DiagnosticKind::Lexical, "include needs a file path");
                return Ok(());
            }
            Err(error) => {
                context.report(DiagnosticKind::Lexical, error.to_string());
                return Ok(());
            }
        };

        if context.include_depth >= self.config.max_include_depth {
            let error = ParserError::structural(format!(
                "maximum include depth of {} exceeded by '{}'",
                self.config.max_include_depth, target
            ));
            return Err(self.fail(context, error));
        }

        let path = match context.path().parent() {
            Some(parent) => parent.join(&target),
            None => target.into(),
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(source) => return Err(self.fail(context, ParserError::Io { path, source })),
        };

        log::debug!(
            "{}:{}: including {}",
            context.path().display(),
            context.line(),
            path.display()
        );

        let saved_path = context.path().to_path_buf();
        let saved_line = context.line();
        context.include_depth += 1;

        let result = self.run_source(context, &path, BufReader::new(file));

        context.include_depth -= 1;
        context.set_position(&saved_path, saved_line);
        result
    }

    fn define(&self, context: &mut ParsingContext, rest: &str) {
        let (name, value) = split_keyword(rest);
        if name.is_empty() || value.is_empty() {
            context.report(DiagnosticKind::Lexical, "define needs a name and a value");
            return;
        }

        let value = substitute(&context.defines, value).into_owned();
        log::debug!("define {} = {}", name, value);
        if let Some(previous) = context.defines.insert(name.to_string(), value) {
            log::warn!(
                "{}:{}: '{}' redefined, previous value was '{}'",
                context.path().display(),
                context.line(),
                name,
                previous
            );
        }
    }
}

/// Splits a directive into its keyword and the remaining parameter text
fn split_keyword(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(end) => (&line[..end], line[end..].trim_start()),
        None => (line, ""),
    }
}

/// Replaces whole words that name a define
fn substitute<'a>(defines: &IndexMap<String, String>, text: &'a str) -> Cow<'a, str> {
    if defines.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut word_start = 0;

    let mut push_word = |out: &mut String, word: &str| match defines.get(word) {
        Some(value) => {
            changed = true;
            out.push_str(value);
        }
        None => out.push_str(word),
    };

    for (index, c) in text.char_indices() {
        if DEFINE_SEPARATORS.contains(c) {
            push_word(&mut out, &text[word_start..index]);
            out.push(c);
            word_start = index + c.len_utf8();
        }
    }
    push_word(&mut out, &text[word_start..]);

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParserParameter;
    use crate::registry::SectionRegistryBuilder;
    use crate::value::ParameterType;
    use std::sync::{Arc, Mutex};

    const SCENE: Section = Section(1);
    const ITEM: Section = Section(2);

    type Log = Arc<Mutex<Vec<String>>>;

    fn registry(log: &Log) -> SectionRegistry {
        let mut builder = SectionRegistryBuilder::new();
        builder.register_section(SCENE, "scene");
        builder.register_section(ITEM, "item");

        let events = Arc::clone(log);
        builder
            .register_parser(
                Section::ROOT,
                "scene",
                move |_, params| {
                    events
                        .lock()
                        .unwrap()
                        .push(format!("scene {}", params.get::<String>(0).unwrap_or_default()));
                    Ok(Block::Opens(SCENE))
                },
                vec![ParserParameter::new(ParameterType::Name)],
            )
            .unwrap();

        let events = Arc::clone(log);
        builder
            .register_parser(
                SCENE,
                "value",
                move |_, params| {
                    let value = params.get::<i32>(0);
                    events.lock().unwrap().push(format!("value {:?}", value));
                    Ok(Block::None)
                },
                vec![ParserParameter::new(ParameterType::Int32)],
            )
            .unwrap();

        let events = Arc::clone(log);
        builder
            .register_parser(
                SCENE,
                "item",
                move |_, _| {
                    events.lock().unwrap().push("item".to_string());
                    Ok(Block::Opens(ITEM))
                },
                vec![],
            )
            .unwrap();

        let events = Arc::clone(log);
        builder
            .register_end(ITEM, move |_, _| {
                events.lock().unwrap().push("end item".to_string());
                Ok(Block::None)
            })
            .unwrap();

        let events = Arc::clone(log);
        builder
            .register_end(SCENE, move |_, _| {
                events.lock().unwrap().push("end scene".to_string());
                Ok(Block::None)
            })
            .unwrap();

        builder.build()
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_split_keyword() {
        assert_eq!(split_keyword("value 1 2"), ("value", "1 2"));
        assert_eq!(split_keyword("value\t  1"), ("value", "1"));
        assert_eq!(split_keyword("end"), ("end", ""));
    }

    #[test]
    fn test_substitute_whole_words() {
        let mut defines = IndexMap::new();
        defines.insert("SIZE".to_string(), "512".to_string());

        assert_eq!(substitute(&defines, "SIZE SIZE"), "512 512");
        assert_eq!(substitute(&defines, "-SIZE,SIZE|x"), "-512,512|x");
        assert_eq!(substitute(&defines, "SIZES MY_SIZE"), "SIZES MY_SIZE");
        assert!(matches!(substitute(&defines, "none"), Cow::Borrowed(_)));
        assert!(matches!(substitute(&IndexMap::new(), "SIZE"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_blocks_and_end_handlers() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "scene main\n{\n  item\n  {\n  }\n  value 3\n}\n");

        assert!(result.success, "{:?}", result.diagnostics);
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            events(&log),
            ["scene main", "item", "end item", "value Some(3)", "end scene"]
        );
    }

    #[test]
    fn test_optional_block_is_emulated() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "scene main {\n  item\n  value 1\n}\n");

        assert!(result.success);
        assert_eq!(
            events(&log),
            ["scene main", "item", "end item", "value Some(1)", "end scene"]
        );
    }

    #[test]
    fn test_pending_block_at_end_of_file() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "scene main");

        assert!(result.success);
        assert_eq!(events(&log), ["scene main", "end scene"]);
    }

    #[test]
    fn test_unmatched_close_is_fatal() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "}\nscene main\n{\n}\n");

        assert!(!result.success);
        assert_eq!(result.count(DiagnosticKind::Structural), 1);
        assert_eq!(result.diagnostics[0].line, 1);
        assert!(events(&log).is_empty());
    }

    #[test]
    fn test_missing_close_at_end_of_file() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "scene main\n{\nitem\n{\n");

        assert!(!result.success);
        assert_eq!(result.count(DiagnosticKind::Structural), 1);
        assert!(result.diagnostics[0].message.contains("2 block(s)"));
    }

    #[test]
    fn test_type_error_still_calls_handler() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "scene main {\nvalue seven\n}");

        assert!(result.success);
        assert_eq!(result.count(DiagnosticKind::Type), 1);
        assert_eq!(result.diagnostics[0].section, "scene::value");
        assert_eq!(result.diagnostics[0].line, 2);
        assert_eq!(events(&log), ["scene main", "value None", "end scene"]);
    }

    #[test]
    fn test_lexical_error_skips_line_and_block() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "scene \"main\n{\nvalue 1\n}\n");

        assert!(result.success);
        assert_eq!(result.count(DiagnosticKind::Lexical), 1);
        assert!(events(&log).is_empty());
    }

    #[test]
    fn test_stray_open_brace_is_skipped() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str("test.cscn", "{\nvalue 1\n}\nscene main {\n}");

        assert!(result.success);
        assert_eq!(result.count(DiagnosticKind::Lexical), 1);
        assert_eq!(events(&log), ["scene main", "end scene"]);
    }

    #[test]
    fn test_max_depth() {
        let mut builder = SectionRegistryBuilder::new();
        builder
            .register_parser(SCENE, "nest", |_, _| Ok(Block::Opens(SCENE)), vec![])
            .unwrap();
        builder
            .register_parser(Section::ROOT, "nest", |_, _| Ok(Block::Opens(SCENE)), vec![])
            .unwrap();
        let registry = builder.build();
        let parser = AttributeParser::with_config(&registry, ParserConfig::new().with_max_depth(2));

        assert!(parser.parse_str("a", "nest {\nnest {\n}\n}").success);

        let result = parser.parse_str("a", "nest {\nnest {\nnest {\n}\n}\n}");
        assert!(!result.success);
        assert_eq!(result.count(DiagnosticKind::Structural), 1);
        assert!(result.diagnostics[0].message.contains("depth of 2"));
    }

    #[test]
    fn test_defines_are_substituted() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_str(
            "test.cscn",
            "define COUNT 12\ndefine NAME main\nscene NAME {\nvalue COUNT\n}",
        );

        assert!(result.success);
        assert!(result.diagnostics.is_empty());
        assert_eq!(events(&log), ["scene main", "value Some(12)", "end scene"]);
    }

    #[test]
    fn test_defines_can_be_disabled() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::with_config(&registry, ParserConfig::new().with_defines(false));

        let result = parser.parse_str("test.cscn", "define COUNT 12");
        assert_eq!(result.count(DiagnosticKind::UnknownDirective), 1);
    }

    #[test]
    fn test_validate_hook() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);
        let mut context = parser.context();

        let result = parser.parse_with(&mut context, "test.cscn", "scene main {\n}".as_bytes(), |_| {
            Err(HandlerError::new("scene has no camera"))
        });

        assert!(!result.success);
        assert_eq!(result.count(DiagnosticKind::Validation), 1);
        assert_eq!(context.state(), ParseState::Error);
    }

    #[test]
    fn test_validate_not_run_after_fatal_error() {
        let log = Log::default();
        let registry = registry(&log);
        let parser = AttributeParser::new(&registry);
        let mut context = parser.context();
        let mut validated = false;

        let result = parser.parse_with(&mut context, "test.cscn", "}".as_bytes(), |_| {
            validated = true;
            Ok(())
        });

        assert!(!result.success);
        assert!(!validated);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let registry = SectionRegistryBuilder::new().build();
        let parser = AttributeParser::new(&registry);

        let result = parser.parse_file("definitely/not/here.cscn");

        assert!(!result.success);
        assert_eq!(result.count(DiagnosticKind::Io), 1);
    }
}
