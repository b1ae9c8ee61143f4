//! Pipeline benchmarks for Retroscript.

use std::io;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use retroscript::bytecode::{Decompiler, OpB};
use retroscript::lexer::scan;
use retroscript::parser::{Parser, PrattParser};
use retroscript::{CompilerConfig, ParserStrategy, Target};

/// A counting loop with `n` iterations and some arithmetic per step.
fn loop_program(n: u32) -> String {
    format!(
        r#"
var i = 0;
var sum = 0;
while (i < {}) {{
    var step = i * 2 - 1;
    sum = sum + step / 3;
    i = i + 1;
}}
print sum;
"#,
        n
    )
}

/// A long flat expression: `1 + 2 * 3 - 4 + 5 * 6 - ...`.
fn long_expression(terms: usize) -> String {
    let mut source = String::from("1");
    for n in 2..=terms {
        let op = match n % 3 {
            0 => " + ",
            1 => " * ",
            _ => " - ",
        };
        source.push_str(op);
        source.push_str(&(n % 100).to_string());
    }
    source
}

fn scanning_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanning");
    let source = loop_program(100).repeat(50);

    group.bench_function("scan_program", |b| b.iter(|| scan(black_box(&source))));

    group.finish();
}

/// Compare both parsing strategies on the same expression.
fn parsing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for terms in [10, 100, 1000] {
        let source = long_expression(terms);
        let (tokens, _) = scan(&source);

        group.bench_with_input(
            BenchmarkId::new("recursive_descent", terms),
            &tokens,
            |b, tokens| b.iter(|| Parser::new(black_box(tokens.clone())).parse()),
        );

        group.bench_with_input(BenchmarkId::new("pratt", terms), &tokens, |b, tokens| {
            b.iter(|| PrattParser::new(black_box(tokens.clone())).parse())
        });
    }

    group.finish();
}

fn compile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    let source = loop_program(1000);

    for target in [Target::A, Target::B] {
        let config = CompilerConfig::new(ParserStrategy::RecursiveDescent, target);
        group.bench_function(target.to_string(), |b| {
            b.iter(|| retroscript::compile(black_box(&source), &config).unwrap())
        });
    }

    group.finish();
}

fn interpreter_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpreter");

    for n in [100, 1000, 10000] {
        let source = loop_program(n);
        group.bench_with_input(BenchmarkId::new("loop", n), &source, |b, src| {
            b.iter(|| {
                retroscript::interpret_with_writer(
                    black_box(src),
                    &CompilerConfig::default(),
                    io::sink(),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

fn disassembly_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("disassembly");
    let source = loop_program(10).repeat(20);
    let chunk = retroscript::compile(&source, &CompilerConfig::default()).unwrap();

    group.bench_function("decompile_target_b", |b| {
        b.iter(|| Decompiler::<OpB>::new(black_box(&chunk)).decompile().unwrap())
    });

    group.bench_function("disassemble_target_b", |b| {
        b.iter(|| retroscript::disassemble(black_box(&chunk), Target::B).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    scanning_benchmarks,
    parsing_benchmarks,
    compile_benchmarks,
    interpreter_benchmarks,
    disassembly_benchmarks,
);

criterion_main!(benches);
