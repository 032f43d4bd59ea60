use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use section_grammar::{
    AttributeParser, Block, Cursor, HandlerError, LineReader, ParameterList, ParameterType,
    ParserParameter, ParsingContext, Section, SectionRegistry, checked_values, make_range,
    parse_value,
};

const MATERIAL: Section = Section::new(1);
const PASS: Section = Section::new(2);

fn noop(_: &mut ParsingContext, _: &ParameterList) -> Result<Block, HandlerError> {
    Ok(Block::None)
}

/// Registry for a material-like grammar with a few typical directives
fn material_registry() -> SectionRegistry {
    let blend = checked_values([("none", 0u32), ("additive", 1u32), ("interpolative", 2u32)]);
    let channels = checked_values([("diffuse", 1u32), ("normal", 2u32), ("specular", 4u32)]);

    let mut builder = SectionRegistry::builder();
    builder
        .register_section(MATERIAL, "material")
        .register_section(PASS, "pass");

    builder
        .register_parser(
            Section::ROOT,
            "material",
            |_, _| Ok(Block::Opens(MATERIAL)),
            vec![ParserParameter::new(ParameterType::Name)],
        )
        .unwrap();
    builder
        .register_parser(MATERIAL, "pass", |_, _| Ok(Block::Opens(PASS)), vec![])
        .unwrap();
    builder
        .register_parser(
            PASS,
            "diffuse",
            noop,
            vec![ParserParameter::new(ParameterType::RgbColour)],
        )
        .unwrap();
    builder
        .register_parser(
            PASS,
            "shininess",
            noop,
            vec![ParserParameter::new(ParameterType::Float).with_range(make_range(0.0f32, 128.0f32))],
        )
        .unwrap();
    builder
        .register_parser(
            PASS,
            "blend",
            noop,
            vec![ParserParameter::checked_text(blend)],
        )
        .unwrap();
    builder
        .register_parser(
            PASS,
            "channels",
            noop,
            vec![ParserParameter::bitwise_ored32(channels)],
        )
        .unwrap();
    builder.build()
}

fn generate_materials(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        text.push_str(&format!(
            "// material {i}\nmaterial \"Material{i}\"\n{{\n  pass\n  {{\n    diffuse 1.0 0.5 0.25\n    \
             shininess 64\n    blend additive\n    channels diffuse | normal\n  }}\n}}\n"
        ));
    }
    text
}

/// Benchmark whole-file parsing at several sizes
fn bench_parse_materials(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_materials");
    let registry = material_registry();
    let parser = AttributeParser::new(&registry);

    for count in [10, 100, 1000] {
        let text = generate_materials(count);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &text, |b, text| {
            b.iter(|| parser.parse_str("bench.cmtl", black_box(text)));
        });
    }

    group.finish();
}

/// Benchmark the line reader alone
fn bench_line_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_reader");
    let text = generate_materials(100);
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("logical_lines", |b| {
        b.iter(|| LineReader::new(black_box(text.as_bytes())).count());
    });

    group.finish();
}

/// Benchmark single value decoding per parameter type
fn bench_parse_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_value");

    let cases = [
        (ParameterType::Int32, "-123456"),
        (ParameterType::Double, "3.14159265358979"),
        (ParameterType::Point3F, "1.5, -2.25, 8"),
        (ParameterType::Rectangle, "0 0 1920 1080"),
        (ParameterType::Text, "\"quoted text value\""),
    ];

    for (kind, text) in cases {
        let constraint = kind.default_constraint();
        group.bench_with_input(BenchmarkId::from_parameter(kind.name()), text, |b, text| {
            b.iter(|| parse_value(kind, &constraint, &mut Cursor::new(black_box(text))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_materials,
    bench_line_reader,
    bench_parse_value
);
criterion_main!(benches);
