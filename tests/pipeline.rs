//! End-to-end tests: source through both parsers, the interpreter and both
//! bytecode targets.
//!
//! Generated code is checked by running a small stack evaluator over the
//! decompiled records and comparing its output with the interpreter's.

use std::collections::HashMap;

use pretty_assertions::assert_eq;

use retroscript::ast::StmtKind;
use retroscript::bytecode::{Chunk, Decompilation, Decompiler, OpA, OpB, MAX_CONSTANTS};
use retroscript::error::{ChunkError, CompileError, LexerError, ParserError, RuntimeError};
use retroscript::lexer::{scan, TokenKind};
use retroscript::value::Value;
use retroscript::{CompilerConfig, ParserStrategy, Target};

const STEP_LIMIT: usize = 100_000;

fn config(target: Target) -> CompilerConfig {
    CompilerConfig::new(ParserStrategy::RecursiveDescent, target)
}

fn interpreter_output(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    retroscript::interpret_with_writer(source, &CompilerConfig::default(), &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn arithmetic(op: &str, a: Value, b: Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => match op {
            "+" => Ok(Value::Int(a + b)),
            "-" => Ok(Value::Int(a - b)),
            "*" => Ok(Value::Int(a * b)),
            "/" if b == 0 => Err("division by zero".to_string()),
            "/" => Ok(Value::Int(a / b)),
            _ => Err(format!("unknown operator {}", op)),
        },
        (Value::Double(a), Value::Double(b)) => match op {
            "+" => Ok(Value::Double(a + b)),
            "-" => Ok(Value::Double(a - b)),
            "*" => Ok(Value::Double(a * b)),
            "/" if b == 0.0 => Err("division by zero".to_string()),
            "/" => Ok(Value::Double(a / b)),
            _ => Err(format!("unknown operator {}", op)),
        },
        (a, b) if op == "+" => match (a.as_string(), b.as_string()) {
            (Ok(a), Ok(b)) => Ok(Value::string(format!("{}{}", a, b))),
            _ => Err("bad operands".to_string()),
        },
        _ => Err("bad operands".to_string()),
    }
}

fn less(a: &Value, b: &Value) -> Result<bool, String> {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Ok(a < b),
        (Value::Double(a), Value::Double(b)) => Ok(a < b),
        _ => Err("bad comparison".to_string()),
    }
}

/// Index of each record keyed by its byte offset.
fn offsets<O>(records: &[Decompilation<O>]) -> HashMap<usize, usize> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| (record.offset, index))
        .collect()
}

/// Run Target-A code. Booleans are words, so only numeric output is meaningful.
fn run_a(chunk: &Chunk) -> Result<Vec<String>, String> {
    let records = Decompiler::<OpA>::new(chunk)
        .decompile()
        .map_err(|e| e.to_string())?;
    let index = offsets(&records);
    let word = |v: bool| Value::Int(i64::from(v));
    let truthy = |v: &Value| !matches!(v, Value::Int(0));

    let mut stack: Vec<Value> = Vec::new();
    let mut slots: HashMap<i64, Value> = HashMap::new();
    let mut output = Vec::new();
    let mut pc = 0;

    for _ in 0..STEP_LIMIT {
        let record = records.get(pc).ok_or("ran off the end")?;
        let mut next = record.next_offset();
        let pop = |stack: &mut Vec<Value>| stack.pop().ok_or("stack underflow".to_string());

        match record.opcode {
            OpA::PushWord => stack.push(record.constant.clone().ok_or("no literal")?),
            OpA::GetVar => {
                let slot = record.operand.ok_or("no slot")?;
                stack.push(slots.get(&slot).cloned().ok_or("unset slot")?);
            }
            OpA::SetVar => {
                let value = pop(&mut stack)?;
                slots.insert(record.operand.ok_or("no slot")?, value);
            }
            OpA::Add | OpA::Sub | OpA::Mul | OpA::Div => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                let op = match record.opcode {
                    OpA::Add => "+",
                    OpA::Sub => "-",
                    OpA::Mul => "*",
                    _ => "/",
                };
                stack.push(arithmetic(op, a, b)?);
            }
            OpA::Negate => match pop(&mut stack)? {
                Value::Int(n) => stack.push(Value::Int(-n)),
                _ => return Err("bad negate".to_string()),
            },
            OpA::Not => {
                let v = pop(&mut stack)?;
                stack.push(word(!truthy(&v)));
            }
            OpA::Eq | OpA::Neq | OpA::Gt | OpA::Ge | OpA::Lt | OpA::Le => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                let result = match record.opcode {
                    OpA::Eq => a == b,
                    OpA::Neq => a != b,
                    OpA::Gt => less(&b, &a)?,
                    OpA::Ge => !less(&a, &b)?,
                    OpA::Lt => less(&a, &b)?,
                    _ => !less(&b, &a)?,
                };
                stack.push(word(result));
            }
            OpA::Pop => {
                pop(&mut stack)?;
            }
            OpA::Dup => {
                let top = stack.last().cloned().ok_or("stack underflow")?;
                stack.push(top);
            }
            OpA::Print => output.push(pop(&mut stack)?.to_string()),
            OpA::Jump => next = record.jump_target().ok_or("bad jump")?,
            OpA::JumpUnless => {
                if !truthy(&pop(&mut stack)?) {
                    next = record.jump_target().ok_or("bad jump")?;
                }
            }
            OpA::JumpIf => {
                if truthy(&pop(&mut stack)?) {
                    next = record.jump_target().ok_or("bad jump")?;
                }
            }
            OpA::StopScript => {
                assert!(stack.is_empty(), "stack not balanced: {:?}", stack);
                return Ok(output);
            }
        }

        pc = *index.get(&next).ok_or("jump into an instruction")?;
    }

    Err("step limit reached".to_string())
}

/// Run Target-B code with full value semantics.
fn run_b(chunk: &Chunk) -> Result<Vec<String>, String> {
    let records = Decompiler::<OpB>::new(chunk)
        .decompile()
        .map_err(|e| e.to_string())?;
    let index = offsets(&records);

    let mut stack: Vec<Value> = Vec::new();
    let mut globals: HashMap<String, Value> = HashMap::new();
    let mut output = Vec::new();
    let mut pc = 0;

    for _ in 0..STEP_LIMIT {
        let record = records.get(pc).ok_or("ran off the end")?;
        let mut next = record.next_offset();
        let pop = |stack: &mut Vec<Value>| stack.pop().ok_or("stack underflow".to_string());
        let name = || -> Result<String, String> {
            match &record.constant {
                Some(value) => value.as_string().map(str::to_string).map_err(|e| e.to_string()),
                None => Err("no name".to_string()),
            }
        };
        let slot = || -> Result<usize, String> {
            record
                .operand
                .and_then(|s| usize::try_from(s).ok())
                .ok_or("no slot".to_string())
        };

        match record.opcode {
            OpB::Constant => stack.push(record.constant.clone().ok_or("no constant")?),
            OpB::Nil => stack.push(Value::Nil),
            OpB::True => stack.push(Value::Bool(true)),
            OpB::False => stack.push(Value::Bool(false)),
            OpB::Pop => {
                pop(&mut stack)?;
            }
            OpB::GetLocal => {
                let value = stack.get(slot()?).cloned().ok_or("bad local")?;
                stack.push(value);
            }
            OpB::SetLocal => {
                let value = stack.last().cloned().ok_or("stack underflow")?;
                *stack.get_mut(slot()?).ok_or("bad local")? = value;
            }
            OpB::GetGlobal => {
                let value = globals.get(&name()?).cloned().ok_or("undefined global")?;
                stack.push(value);
            }
            OpB::DefineGlobal => {
                let value = pop(&mut stack)?;
                globals.insert(name()?, value);
            }
            OpB::SetGlobal => {
                let key = name()?;
                if !globals.contains_key(&key) {
                    return Err("undefined global".to_string());
                }
                let value = stack.last().cloned().ok_or("stack underflow")?;
                globals.insert(key, value);
            }
            OpB::Equal => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                stack.push(Value::Bool(a == b));
            }
            OpB::Greater | OpB::Less => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                let result = if record.opcode == OpB::Greater {
                    less(&b, &a)?
                } else {
                    less(&a, &b)?
                };
                stack.push(Value::Bool(result));
            }
            OpB::Add | OpB::Subtract | OpB::Multiply | OpB::Divide => {
                let b = pop(&mut stack)?;
                let a = pop(&mut stack)?;
                let op = match record.opcode {
                    OpB::Add => "+",
                    OpB::Subtract => "-",
                    OpB::Multiply => "*",
                    _ => "/",
                };
                stack.push(arithmetic(op, a, b)?);
            }
            OpB::Not => {
                let v = pop(&mut stack)?;
                stack.push(Value::Bool(!v.is_truthy()));
            }
            OpB::Negate => match pop(&mut stack)? {
                Value::Int(n) => stack.push(Value::Int(-n)),
                Value::Double(n) => stack.push(Value::Double(-n)),
                _ => return Err("bad negate".to_string()),
            },
            OpB::Print => output.push(pop(&mut stack)?.to_string()),
            OpB::Jump | OpB::Loop => next = record.jump_target().ok_or("bad jump")?,
            OpB::JumpIfFalse => {
                if !stack.last().ok_or("stack underflow")?.is_truthy() {
                    next = record.jump_target().ok_or("bad jump")?;
                }
            }
            OpB::Return => {
                assert!(stack.is_empty(), "stack not balanced: {:?}", stack);
                return Ok(output);
            }
        }

        pc = *index.get(&next).ok_or("jump into an instruction")?;
    }

    Err("step limit reached".to_string())
}

/// Programs whose printed values are plain integers on every target.
const NUMERIC_PROGRAMS: &[&str] = &[
    "print 1 + 2 * 3;",
    "print (1 + 2) * 3 - 4 / 2;",
    "var x = 10; var y = 3; print x / y; print x - y * 2; print -x + 4;",
    "var i = 0; var sum = 0; while (i < 10) { sum = sum + i; i = i + 1; } print sum;",
    "var n = 6; var f = 1; while (n > 0) { f = f * n; n = n - 1; } print f;",
    "var a = 5; if (a > 3) print a * 2; else print 0; if (a == 4) print 1; else print a - 1;",
    "var a = 5; if (a <= 5) { print 1; } if (a >= 6) { print 2; } if (a != 5) print 3;",
    "{ var x = 5; x = x + 1; print x; } var x = 2; print x;",
    "var x = 1; { var x = 2; { var x = 3; print x; } print x; } print x;",
    "print 2 and 3; print 2 or 3; var t = 4; print t and t + 1;",
    "var i = 0; while (i < 3) { var j = i * 2; print j; i = i + 1; }",
    "var a; a = 7; var b = a = 8; print a + b;",
    "{ var a = 1; var a = a + 1; print a; a = a * 5; print a; }",
];

#[test]
fn test_targets_agree_with_interpreter_on_arithmetic() {
    for source in NUMERIC_PROGRAMS {
        let expected = interpreter_output(source);

        let chunk_a = retroscript::compile(source, &config(Target::A)).unwrap();
        assert_eq!(run_a(&chunk_a), Ok(expected.clone()), "Target-A: {}", source);

        let chunk_b = retroscript::compile(source, &config(Target::B)).unwrap();
        assert_eq!(run_b(&chunk_b), Ok(expected), "Target-B: {}", source);
    }
}

#[test]
fn test_target_b_agrees_on_all_value_kinds() {
    let programs = [
        "print \"ab\" + \"cd\";",
        "print 1.5 * 2.0;",
        "print 1 < 2; print !nil; print nil == false;",
        "var s = \"x\"; { var t = s + \"y\"; print t; } print s;",
        "print false or \"fallback\"; print nil and 1;",
        "var i = 0; while (i < 2) { print i == 1; i = i + 1; }",
    ];

    for source in programs {
        let expected = interpreter_output(source);
        let chunk = retroscript::compile(source, &config(Target::B)).unwrap();
        assert_eq!(run_b(&chunk), Ok(expected), "{}", source);
    }
}

#[test]
fn test_division_by_zero_on_every_path() {
    let source = "print 1 / 0;";
    assert!(matches!(
        retroscript::interpret(source, &CompilerConfig::default()),
        Err(CompileError::Runtime(RuntimeError::DivisionByZero(1)))
    ));

    let chunk_a = retroscript::compile(source, &config(Target::A)).unwrap();
    assert_eq!(run_a(&chunk_a), Err("division by zero".to_string()));

    let chunk_b = retroscript::compile(source, &config(Target::B)).unwrap();
    assert_eq!(run_b(&chunk_b), Err("division by zero".to_string()));
}

#[test]
fn test_generated_code_always_decodes() {
    for source in NUMERIC_PROGRAMS {
        for target in [Target::A, Target::B] {
            let chunk = retroscript::compile(source, &config(target)).unwrap();
            let lines = retroscript::disassemble(&chunk, target).unwrap();
            assert!(!lines.is_empty());
        }
    }
}

#[test]
fn test_precedence_under_both_strategies() {
    for strategy in [ParserStrategy::RecursiveDescent, ParserStrategy::Pratt] {
        let config = CompilerConfig::new(strategy, Target::B);
        let program = retroscript::parse("1 + 2 * 3;", &config).unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0].kind {
            StmtKind::Expression(expr) => assert_eq!(expr.to_string(), "(+ 1 (* 2 3))"),
            other => panic!("expected an expression statement, got {:?}", other),
        }
        assert_eq!(
            retroscript::evaluate("1 + 2 * 3;", &config).unwrap(),
            Value::Int(7)
        );
    }
}

#[test]
fn test_block_scope_scenario() {
    let mut out = Vec::new();
    let result = retroscript::interpret_with_writer(
        "{ var x = 5; x = x + 1; print x; }\nprint x;",
        &CompilerConfig::default(),
        &mut out,
    );

    assert_eq!(out, b"6\n");
    assert!(matches!(
        result,
        Err(CompileError::Runtime(RuntimeError::UndefinedVariable(ref name, 2))) if name == "x"
    ));
}

#[test]
fn test_unterminated_string_scenario() {
    let (tokens, errors) = scan("\"abc");
    assert_eq!(errors, vec![LexerError::UnterminatedString(1)]);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn test_missing_paren_scenario() {
    for strategy in [ParserStrategy::RecursiveDescent, ParserStrategy::Pratt] {
        let config = CompilerConfig::new(strategy, Target::B);
        match retroscript::parse("\n(1 + 2", &config) {
            Err(CompileError::Parser(errors)) => assert!(
                matches!(
                    errors.first(),
                    Some(ParserError::MissingClosingParenthesis { line: 2, .. })
                ),
                "{:?}",
                errors
            ),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }
}

#[test]
fn test_target_a_negative_literal_scenario() {
    let chunk = retroscript::compile("-5;", &config(Target::A)).unwrap();
    let records = Decompiler::<OpA>::new(&chunk).decompile().unwrap();

    assert_eq!(records[0].opcode, OpA::PushWord);
    assert_eq!(records[0].constant, Some(Value::Int(5)));
    assert_eq!(records[1].opcode, OpA::Negate);
}

#[test]
fn test_constant_pool_limit() {
    let mut chunk = Chunk::new();
    for n in 0..MAX_CONSTANTS {
        let index = chunk.add_constant(Value::Int(n as i64)).unwrap();
        assert_eq!(chunk.read_constant(usize::from(index)), Ok(&Value::Int(n as i64)));
    }

    assert_eq!(
        chunk.add_constant(Value::Int(-1)),
        Err(ChunkError::TooManyConstants {
            limit: MAX_CONSTANTS
        })
    );
    assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
}

#[test]
fn test_write_then_read_agree() {
    let mut chunk = Chunk::new();
    let bytes = [0x01u8, 0xFF, 0x00, 0x7F, 0xA0];
    for (i, byte) in bytes.iter().enumerate() {
        chunk.write(*byte, i as i32 + 1).unwrap();
    }

    for (offset, byte) in bytes.iter().enumerate() {
        assert_eq!(chunk.read(offset), Ok(*byte));
        assert_eq!(chunk.line_at(offset), Ok(offset as i32 + 1));
    }
    assert_eq!(chunk.lines(), &[1, 2, 3, 4, 5]);
}

#[test]
fn test_line_numbers_follow_source() {
    let chunk = retroscript::compile("print 1\n+\n2;", &config(Target::B)).unwrap();
    assert_eq!(chunk.lines(), &[1, 1, 3, 3, 2, 1, 1]);
}
