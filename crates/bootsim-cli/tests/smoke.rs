use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn run_cli(program: &[u8], extra_args: &[&str], stdin: &[u8]) -> Output {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("boot.bin");
    std::fs::write(&path, program).expect("write program");
    run_cli_path(&path, extra_args, stdin)
}

fn run_cli_path(path: &Path, extra_args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bootsim"))
        .arg("-q")
        .arg("-f")
        .arg(path)
        .args(extra_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn bootsim");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("write stdin");
    child.wait_with_output().expect("wait for bootsim")
}

fn stdout_contains(output: &Output, expected: &str) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(expected),
        "stdout did not contain {expected:?}.\nstdout:\n{stdout}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn dumps_registers_after_soft_halt() {
    // mov eax, 0x12345678; hlt
    let output = run_cli(&[0xB8, 0x78, 0x56, 0x34, 0x12, 0xF4], &[], b"");
    assert!(output.status.success(), "{output:?}");
    stdout_contains(&output, "EAX = 0x12345678");
    stdout_contains(&output, "ESP = 0x00007c00");
    stdout_contains(&output, "EIP = 0x00000000");
}

#[test]
fn teletype_renders_ansi_colors() {
    let program = [
        0xB8, 0x41, 0x0E, 0x00, 0x00, // mov eax, 0x0e41
        0xBB, 0x0C, 0x00, 0x00, 0x00, // mov ebx, 0x0c (bright red)
        0xCD, 0x10, //                   int 0x10
        0x6A, 0x00, //                   push 0
        0xC3, //                         ret
    ];
    let output = run_cli(&program, &[], b"");
    assert!(output.status.success(), "{output:?}");
    stdout_contains(&output, "\x1b[1;31mA\x1b[0m");
}

#[test]
fn teletype_prompt_is_visible_before_console_input() {
    const PROMPT: &[u8] = b"\x1b[1;31mA\x1b[0m";
    let program = [
        0xB8, 0x41, 0x0E, 0x00, 0x00, // mov eax, 0x0e41
        0xBB, 0x0C, 0x00, 0x00, 0x00, // mov ebx, 0x0c
        0xCD, 0x10, //                   int 0x10
        0xBA, 0xF8, 0x03, 0x00, 0x00, // mov edx, 0x3f8
        0xEC, //                         in al, dx
        0xF4, //                         hlt
    ];
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prompt.bin");
    std::fs::write(&path, program).expect("write program");

    let mut child = Command::new(env!("CARGO_BIN_EXE_bootsim"))
        .arg("-q")
        .arg("-f")
        .arg(&path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn bootsim");
    let mut stdin = child.stdin.take().expect("stdin is piped");
    let mut stdout = child.stdout.take().expect("stdout is piped");

    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        let mut seen = Vec::new();
        let mut buf = [0u8; 256];
        let mut signalled = false;
        loop {
            match stdout.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    seen.extend_from_slice(&buf[..n]);
                    if !signalled && seen.windows(PROMPT.len()).any(|w| w == PROMPT) {
                        let _ = tx.send(());
                        signalled = true;
                    }
                }
            }
        }
        seen
    });

    if rx.recv_timeout(Duration::from_secs(5)).is_err() {
        let _ = child.kill();
        panic!("teletype output was not flushed while waiting on console input");
    }

    stdin.write_all(b"7\n").expect("write stdin");
    drop(stdin);
    let status = child.wait().expect("wait for bootsim");
    let stdout = reader.join().expect("reader thread");
    assert!(status.success());
    assert!(String::from_utf8_lossy(&stdout).contains("EAX = 0x00000e07"));
}

#[test]
fn serial_echo_reads_decimal_stdin() {
    let program = [
        0xBA, 0xF8, 0x03, 0x00, 0x00, // mov edx, 0x3f8
        0xEC, //                         loop: in al, dx
        0x3C, 0x00, //                   cmp al, 0
        0x74, 0x03, //                   jz done
        0xEE, //                         out dx, al
        0xEB, 0xF8, //                   jmp loop
        0xF4, //                         done: hlt
    ];
    let output = run_cli(&program, &[], b"104 105\n");
    assert!(output.status.success(), "{output:?}");
    stdout_contains(&output, "hi");
}

#[test]
fn instruction_budget_stops_endless_loop() {
    // jmp $
    let output = run_cli(&[0xEB, 0xFE], &["--max-insts", "100"], b"");
    assert!(output.status.success(), "{output:?}");
    stdout_contains(&output, "EIP = 0x00007c00");
}

#[test]
fn unimplemented_group_member_fails() {
    // or eax, 1
    let output = run_cli(&[0x83, 0xC8, 0x01], &[], b"");
    assert!(!output.status.success(), "{output:?}");
    assert!(output.stdout.is_empty());
}

#[test]
fn sib_operand_fails() {
    // mov eax, [esp]
    let output = run_cli(&[0x8B, 0x04, 0x24], &[], b"");
    assert!(!output.status.success(), "{output:?}");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_cli_path(&dir.path().join("missing.bin"), &[], b"");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "stderr:\n{stderr}");
}
