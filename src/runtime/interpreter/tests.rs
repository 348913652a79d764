use super::*;
use crate::language::parser::parse;
use num_integer::Integer;

fn run(program: &[u8]) -> RuntimeResult<Vec<Value>> {
    let block = parse(program).expect("program parses");
    let mut interpreter =
        Interpreter::new(Rc::from(program), b"", Some(7)).with_stack(Vec::new());
    interpreter.evaluate(&block)?;
    Ok(interpreter.into_stack())
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::int(*v)).collect()
}

fn list(values: &[i64]) -> Value {
    Value::List(ints(values))
}

#[test]
fn integer_arithmetic_floors() {
    assert_eq!(run(&[0x15, 0x13, 0x30]).unwrap(), ints(&[8]));
    let stack = run(&[0x17, 0x20, 0x12, 0x33, 0x17, 0x20, 0x12, 0x34]).unwrap();
    assert_eq!(stack, ints(&[-4, 1]));
}

#[test]
fn division_by_zero_is_reported() {
    assert_eq!(
        run(&[0x15, 0x10, 0x33]),
        Err(RuntimeError::DivisionByZero {
            opcode: opcode::name(0x33)
        })
    );
}

#[test]
fn fold_and_scan_over_a_list() {
    let fold = run(&[0x11, 0x12, 0x13, 0x14, 0x14, 0x0e, 0x08, 0x30, 0x09, 0x32]).unwrap();
    assert_eq!(fold, ints(&[10]));
    let scan = run(&[0x11, 0x12, 0x13, 0x14, 0x14, 0x0e, 0x08, 0x30, 0x09, 0x6d]).unwrap();
    assert_eq!(scan, vec![list(&[1, 3, 6, 10])]);
}

#[test]
fn map_and_filter_collect_results() {
    let mapped = run(&[0x11, 0x12, 0x13, 0x13, 0x0e, 0x08, 0x27, 0x09, 0x34]).unwrap();
    assert_eq!(mapped, vec![list(&[2, 3, 4])]);
    let odd = run(&[
        0x11, 0x12, 0x13, 0x14, 0x14, 0x0e, 0x08, 0x12, 0x34, 0x09, 0x35,
    ])
    .unwrap();
    assert_eq!(odd, vec![list(&[1, 3])]);
}

#[test]
fn dup_on_empty_stack_underflows() {
    assert_eq!(
        run(&[0x40]),
        Err(RuntimeError::StackUnderflow { opcode: "dup" })
    );
}

#[test]
fn popped_values_are_recallable_as_junk() {
    assert_eq!(run(&[0x15, 0x16, 0x30, 0xa0]).unwrap(), ints(&[11, 5]));
    assert!(matches!(
        run(&[0xa3]),
        Err(RuntimeError::IndexOutOfRange { .. })
    ));
}

#[test]
fn registers_and_counter() {
    assert_eq!(run(&[0x15, 0xcc, 0xd0, 0xd0, 0x30]).unwrap(), ints(&[10]));
    assert_eq!(run(&[0xb2, 0xb2, 0xb2]).unwrap(), ints(&[1, 2, 3]));

    let program: Rc<[u8]> = Rc::from(&b"\x00"[..]);
    let interpreter = Interpreter::new(program, b"ab", Some(1));
    assert_eq!(interpreter.register(0), Some(&Value::text(b"ab")));
    assert_eq!(interpreter.register(1), Some(&Value::int(2)));
    assert_eq!(interpreter.register(2), Some(&Value::text(b"\x00")));
    assert!(matches!(interpreter.register(3), Some(Value::Int(n)) if n <= &BigInt::from(2)));
}

#[test]
fn exit_stops_evaluation() {
    assert_eq!(run(&[0x15, 0x0f, 0x16]).unwrap(), ints(&[5]));
    let mapped = run(&[0x11, 0x12, 0x12, 0x0e, 0x08, 0x0f, 0x09, 0x34]).unwrap();
    assert_eq!(mapped, vec![list(&[1])]);
}

#[test]
fn make_array_captures_child_output() {
    let stack = run(&[0x15, 0x08, 0x16, 0x17, 0x09, 0x0e]).unwrap();
    assert_eq!(stack, vec![Value::int(5), list(&[6, 7])]);
    let wrapped = run(&[0x15, 0x16, 0x12, 0x0e]).unwrap();
    assert_eq!(wrapped, vec![list(&[5, 6])]);
}

#[test]
fn both_runs_block_on_each_operand() {
    assert_eq!(run(&[0x15, 0x16, 0x08, 0x2c, 0x09, 0x38]).unwrap(), ints(&[25, 36]));
    assert_eq!(run(&[0x15, 0x16, 0x38]).unwrap(), ints(&[5]));
}

#[test]
fn zip_with_pairs_up_lists() {
    let stack = run(&[
        0x11, 0x12, 0x12, 0x0e, 0x13, 0x14, 0x12, 0x0e, 0x08, 0x30, 0x09, 0xb1,
    ])
    .unwrap();
    assert_eq!(stack, vec![list(&[4, 6])]);
}

#[test]
fn operands_are_canonicalised() {
    let taken = run(&[0x12, 0x11, 0x12, 0x13, 0x13, 0x0e, 0x3c]).unwrap();
    assert_eq!(taken, vec![list(&[1, 2])]);
    let indexed = run(&[0x10, 0x11, 0x12, 0x13, 0x13, 0x0e, 0x35]).unwrap();
    assert_eq!(indexed, ints(&[1]));
}

#[test]
fn string_literals_and_text_ops() {
    let doubled = run(b"\x04hi\x05\x40\x30").unwrap();
    assert_eq!(render_stack(&doubled).unwrap(), b"hihi");
    let formatted = run(b"\x15\x04n=%d\x9b").unwrap();
    assert_eq!(render_stack(&formatted).unwrap(), b"n=5");
    let replaced = run(b"\x04a-b\x05\x04-\x07+\x9d").unwrap();
    assert_eq!(render_stack(&replaced).unwrap(), b"a+b");
    let found = run(b"\x04a1b22\x05\x04[0-9]+\x9e").unwrap();
    assert_eq!(found, vec![Value::List(vec![Value::text(b"1"), Value::text(b"22")])]);
}

#[test]
fn sort_by_key_block_is_stable() {
    let sorted = run(&[0x13, 0x11, 0x12, 0x13, 0x0e, 0x08, 0x20, 0x09, 0x2f]).unwrap();
    assert_eq!(sorted, vec![list(&[3, 2, 1])]);
}

#[test]
fn stack_shuffles() {
    assert_eq!(run(&[0x11, 0x12, 0x13, 0x43]).unwrap(), ints(&[2, 3, 1]));
    assert_eq!(run(&[0x11, 0x12, 0x13, 0x44]).unwrap(), ints(&[3, 1, 2]));
    assert_eq!(run(&[0x11, 0x12, 0x47]).unwrap(), ints(&[2, 1, 2]));
    assert_eq!(run(&[0x11, 0x12, 0x48]).unwrap(), ints(&[1, 2, 1, 2]));
    assert_eq!(run(&[0x11, 0x12, 0x13, 0x12, 0x4a]).unwrap(), ints(&[1, 3, 2]));
    assert_eq!(run(&[0x11, 0x12, 0x13, 0x4c]).unwrap(), ints(&[3]));
}

#[test]
fn unknown_bytes_are_rejected() {
    assert_eq!(run(&[0xb3]), Err(RuntimeError::UnknownOpcode { byte: 0xb3 }));
}

#[test]
fn state_is_observable_after_a_run() {
    let program: &[u8] = &[0x15, 0x16, 0x30, 0xb2, 0x0f, 0x40];
    let block = parse(program).unwrap();
    let mut interpreter = Interpreter::new(Rc::from(program), b"", Some(3)).with_stack(Vec::new());
    assert_eq!(interpreter.run(&block).unwrap(), b"111");
    assert_eq!(interpreter.junk(), ints(&[6, 5]).as_slice());
    assert_eq!(interpreter.counter(), &BigInt::from(2));
    assert!(interpreter.is_halted());
    assert_eq!(interpreter.stack(), ints(&[11, 1]).as_slice());
}

#[test]
fn lists_repeat_by_an_integer_count() {
    assert_eq!(
        run(&[0x11, 0x12, 0x12, 0x0e, 0x13, 0x32]).unwrap(),
        vec![list(&[1, 2, 1, 2, 1, 2])]
    );
    assert_eq!(
        run(&[0x11, 0x12, 0x12, 0x0e, 0x11, 0x20, 0x32]).unwrap(),
        vec![list(&[])]
    );
}

#[test]
fn register_save_nip_tuck_and_show() {
    assert_eq!(run(&[0x15, 0xc8, 0xd0]).unwrap(), ints(&[5, 5]));
    assert_eq!(run(&[0x15, 0x16, 0xd5, 0xd1]).unwrap(), ints(&[6, 5]));
    assert_eq!(run(&[0x17, 0xcc, 0x15, 0x16, 0xd8]).unwrap(), ints(&[5, 7, 6]));
    assert_eq!(run(&[0x1b, 0xcc, 0xdc]).unwrap(), vec![Value::text(b"100")]);
    assert!(matches!(
        run(&[0x15, 0xd4]),
        Err(RuntimeError::StackUnderflow { .. })
    ));
}

#[test]
fn get_stack_snapshots_without_consuming() {
    let stack = run(&[0x11, 0x12, 0x12, 0x0e, 0x13, 0x4b]).unwrap();
    assert_eq!(
        stack,
        vec![
            list(&[1, 2]),
            Value::int(3),
            Value::List(vec![list(&[1, 2]), Value::int(3)]),
        ]
    );
}

#[test]
fn leave_top_sends_only_the_discarded_values_to_junk() {
    let program: &[u8] = &[0x11, 0x12, 0x13, 0x4c];
    let block = parse(program).unwrap();
    let mut interpreter = Interpreter::new(Rc::from(program), b"", Some(7)).with_stack(Vec::new());
    interpreter.evaluate(&block).unwrap();
    assert_eq!(interpreter.stack(), ints(&[3]).as_slice());
    assert_eq!(interpreter.junk(), ints(&[1, 2]).as_slice());
}

#[test]
fn regex_match_and_split_kinds() {
    assert_eq!(run(b"\x04abc\x05\x04a.\x9c").unwrap(), ints(&[1]));
    assert_eq!(run(b"\x04xab\x05\x04a.\x9c").unwrap(), ints(&[0]));
    let split = run(b"\x04a1b22c\x05\x04[0-9]+\x9f").unwrap();
    assert_eq!(
        split,
        vec![Value::List(vec![
            Value::text(b"a"),
            Value::text(b"b"),
            Value::text(b"c"),
        ])]
    );
}

/// Runs `combinator` over `items` with `block` and returns the result list.
fn apply(items: &[i64], block: &[u8], combinator: u8) -> Vec<Value> {
    let mut program = vec![opcode::BLOCK_OPEN];
    program.extend_from_slice(block);
    program.push(opcode::BLOCK_CLOSE);
    program.push(combinator);
    let root = parse(&program).unwrap();
    let mut interpreter = Interpreter::new(Rc::from(program.as_slice()), b"", Some(5))
        .with_stack(vec![list(items)]);
    interpreter.evaluate(&root).unwrap();
    match interpreter.into_stack().as_slice() {
        [Value::List(result)] => result.clone(),
        other => panic!("expected one list, got {other:?}"),
    }
}

#[test]
fn map_keeps_length_and_filter_keeps_a_subsequence() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..32 {
        let len = rng.gen_range(0..12);
        let items: Vec<i64> = (0..len).map(|_| rng.gen_range(-50..50)).collect();

        let mapped = apply(&items, &[0x2c], 0x34);
        assert_eq!(mapped.len(), items.len());

        let kept = apply(&items, &[0x12, 0x34], 0x35);
        let mut source = items.iter().map(|n| Value::int(*n));
        assert!(kept.iter().all(|value| source.any(|item| &item == value)));
        assert!(kept.iter().all(|value| matches!(value, Value::Int(n) if n.is_odd())));
    }
}
