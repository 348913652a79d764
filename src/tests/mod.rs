use crate::driver::{run, run_or_echo, ProgramError, RunOptions};
use crate::runtime::error::RuntimeError;

fn output(program: &[u8], input: &[u8]) -> Vec<u8> {
    run(program, input, &RunOptions { seed: Some(11) }).expect("program runs")
}

#[test]
fn empty_program_echoes_input() {
    assert_eq!(output(b"", b"abc"), b"abc");
    assert_eq!(output(&[0x20], b"abc"), b"cba");
}

#[test]
fn strings_concatenate() {
    assert_eq!(output(b"\x04hi\x05\x40\x30", b""), b"hihi");
    assert_eq!(output(b"Hello\x05", b""), b"Hello");
}

#[test]
fn numbers_render_in_decimal() {
    assert_eq!(output(&[0x57, 0x64], b"1 2 3"), b"6");
    assert_eq!(output(&[0x15, 0x20, 0x20], b""), b"5");
    assert_eq!(output(&[0x50, 0xd1], b"abcd"), b"4");
}

#[test]
fn modes_wrap_the_program() {
    assert_eq!(output(&[0x30, 0x20], b"ab\ncd"), b"ba\ndc");
    assert_eq!(output(&[0x31, 0x2e], b"a bb ccc"), b"1 2 3");
    assert_eq!(output(&[0x32, 0x20], b"3\nab\ncd"), b"ba\ndc");
}

#[test]
fn quick_map_sugar_and_formatting() {
    let program = [0x50, 0x11, 0x12, 0x13, 0x13, 0x0e, 0x2c, 0xe8, 0x55];
    assert_eq!(output(&program, b""), b"1 4 9");
    assert_eq!(output(&[0x50, 0x11, 0x12, 0x80, 0x5f], b""), b"[1, 2]");
    assert_eq!(output(&[0x50, 0x68], b""), b"Hello, World!");
}

#[test]
fn failing_programs_echo_themselves() {
    let program = [0x50, 0x50];
    assert_eq!(
        run(&program, b"", &RunOptions::default()),
        Err(ProgramError::Runtime(RuntimeError::StackUnderflow { opcode: "pop" }))
    );
    let mut reported = None;
    let echoed = run_or_echo(&program, b"", &RunOptions::default(), |err| {
        reported = Some(err.clone())
    });
    assert_eq!(echoed, program.to_vec());
    assert!(reported.is_some());

    let unclosed = [0x08, 0x40];
    assert!(matches!(
        run(&unclosed, b"", &RunOptions::default()),
        Err(ProgramError::Syntax(_))
    ));
    assert_eq!(
        run_or_echo(&unclosed, b"", &RunOptions::default(), |_| {}),
        unclosed.to_vec()
    );
}

#[test]
fn seeded_runs_are_reproducible() {
    let options = RunOptions { seed: Some(42) };
    let first = run(&[0x50, 0x1b, 0x25], b"", &options).unwrap();
    let second = run(&[0x50, 0x1b, 0x25], b"", &options).unwrap();
    assert_eq!(first, second);
    let value: u32 = String::from_utf8(first).unwrap().parse().unwrap();
    assert!(value < 100);
}
