//! Parses a sampler description file and prints what was built
//!
//! ```text
//! RUST_LOG=section_grammar=debug cargo run --example sampler_file -- samplers.cscn
//! ```
//!
//! Without an argument an embedded sample is parsed.

use section_grammar::{
    AttributeParser, Block, HandlerError, ParameterType, ParameterValue, ParserParameter,
    ParsingContext, Section, SectionRegistry, checked_values, make_range,
};

const SAMPLER: Section = Section::new(1);

const SAMPLE: &str = r#"
// Texture samplers
define ANISOTROPY 8

sampler "Linear" {
    min_filter linear
    mag_filter linear
    max_anisotropy ANISOTROPY
    border_colour 0 0 0 1
}

sampler "Shadow"
{
    min_filter nearest
    comparison
    wrap u | v
    lod_bias 0.5 // not supported, reported and skipped
}

sampler "Default"
"#;

#[derive(Debug, Clone)]
struct Sampler {
    name: String,
    min_filter: u32,
    mag_filter: u32,
    max_anisotropy: f32,
    comparison: bool,
    wrap: u32,
    border: [f32; 4],
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filter) => builder.parse_filters(&filter),
        Err(_) => builder.filter_level(log::LevelFilter::Info),
    };
    builder.init();
}

fn current(context: &mut ParsingContext) -> Result<&mut Sampler, HandlerError> {
    context
        .get_mut::<Sampler>("sampler")
        .ok_or_else(|| HandlerError::missing_object("sampler"))
}

fn registry() -> Result<SectionRegistry, section_grammar::RegistryError> {
    let filters = checked_values([("nearest", 0u32), ("linear", 1u32), ("anisotropic", 2u32)]);
    let wraps = checked_values([("u", 1u32), ("v", 2u32), ("w", 4u32)]);

    let mut builder = SectionRegistry::builder();
    builder.register_section(SAMPLER, "sampler");

    builder.register_parser(
        Section::ROOT,
        "sampler",
        |context, params| {
            context.set(
                "sampler",
                Sampler {
                    name: params.require(0)?,
                    min_filter: 0,
                    mag_filter: 0,
                    max_anisotropy: 1.0,
                    comparison: false,
                    wrap: 0,
                    border: [0.0; 4],
                },
            );
            Ok(Block::Opens(SAMPLER))
        },
        vec![ParserParameter::new(ParameterType::Name)],
    )?;
    builder.register_parser(
        SAMPLER,
        "min_filter",
        |context, params| {
            current(context)?.min_filter = params.require(0)?;
            Ok(Block::None)
        },
        vec![ParserParameter::checked_text(filters.clone())],
    )?;
    builder.register_parser(
        SAMPLER,
        "mag_filter",
        |context, params| {
            current(context)?.mag_filter = params.require(0)?;
            Ok(Block::None)
        },
        vec![ParserParameter::checked_text(filters)],
    )?;
    builder.register_parser(
        SAMPLER,
        "max_anisotropy",
        |context, params| {
            current(context)?.max_anisotropy = params.require(0)?;
            Ok(Block::None)
        },
        vec![ParserParameter::new(ParameterType::Float).with_range(make_range(1.0f32, 16.0f32))],
    )?;
    builder.register_parser(
        SAMPLER,
        "comparison",
        |context, params| {
            current(context)?.comparison = params.require(0)?;
            Ok(Block::None)
        },
        vec![ParserParameter::new(ParameterType::Bool).with_default(ParameterValue::Bool(true))],
    )?;
    builder.register_parser(
        SAMPLER,
        "wrap",
        |context, params| {
            current(context)?.wrap = params.require(0)?;
            Ok(Block::None)
        },
        vec![ParserParameter::bitwise_ored32(wraps)],
    )?;
    builder.register_parser(
        SAMPLER,
        "border_colour",
        |context, params| {
            let colour: section_grammar::RgbaColour = params.require(0)?;
            current(context)?.border = [colour.r, colour.g, colour.b, colour.a];
            Ok(Block::None)
        },
        vec![ParserParameter::new(ParameterType::RgbaColour)],
    )?;
    builder.register_end(SAMPLER, |context, _| {
        let sampler = context
            .take::<Sampler>("sampler")
            .ok_or_else(|| HandlerError::missing_object("sampler"))?;
        let mut samplers = context.take::<Vec<Sampler>>("samplers").unwrap_or_default();
        samplers.push(sampler);
        context.set("samplers", samplers);
        Ok(Block::None)
    })?;

    Ok(builder.build())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let registry = registry()?;
    let parser = AttributeParser::new(&registry);
    let mut context = parser.context();

    let result = match std::env::args().nth(1) {
        Some(path) => {
            let file = std::fs::File::open(&path)?;
            parser.parse_with(&mut context, &path, std::io::BufReader::new(file), |_| Ok(()))
        }
        None => parser.parse_with(&mut context, "embedded.cscn", SAMPLE.as_bytes(), |_| Ok(())),
    };

    for sampler in context.get::<Vec<Sampler>>("samplers").into_iter().flatten() {
        println!("{:?}", sampler);
    }

    println!(
        "success: {}, {} warning(s), {} error(s)",
        result.success,
        result.warnings().count(),
        result.errors().count()
    );
    for diagnostic in result.diagnostics() {
        println!("  {}", diagnostic);
    }

    Ok(())
}
