use std::{
    fs,
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
};

const BIN: &str = env!("CARGO_BIN_EXE_xmi2mid");

fn evnt(events: &[u8]) -> Vec<u8> {
    let mut bytes = b"EVNT".to_vec();
    bytes.extend((events.len() as u32).to_be_bytes());
    bytes.extend(events);
    bytes
}

fn two_sequences() -> Vec<u8> {
    let mut bytes = b"FORM\0\0\0\0XMID".to_vec();
    bytes.extend(evnt(&[0xC0, 0x10, 0x90, 60, 100, 0x3C, 0x3C, 0xFF, 0x2F, 0x00]));
    bytes.extend(evnt(&[0xC1, 0x20, 0x91, 67, 90, 0x1E, 0x1E, 0xFF, 0x2F, 0x00]));
    bytes
}

fn convert(dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .current_dir(dir)
        .arg("convert")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn writes_one_file_per_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let xmi = two_sequences();
    fs::write(dir.path().join("song.xmi"), &xmi).unwrap();

    let output = convert(dir.path(), &["song.xmi"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded song.xmi"));
    assert!(stderr.contains("Converted and saved song.xmi to song_1.mid"));

    let expected = xmi2mid::transcode(&xmi);
    assert_eq!(fs::read(dir.path().join("song_0.mid")).unwrap(), expected[0]);
    assert_eq!(fs::read(dir.path().join("song_1.mid")).unwrap(), expected[1]);
    assert!(!dir.path().join("song_2.mid").exists());
}

#[test]
fn output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();
    fs::write(dir.path().join("a.xmi"), two_sequences()).unwrap();

    let output = convert(dir.path(), &["-o", "out", "a.xmi"]);
    assert!(output.status.success());
    assert!(out.join("a_0.mid").exists());
    assert!(out.join("a_1.mid").exists());
    assert!(!dir.path().join("a_0.mid").exists());
}

#[test]
fn failures_do_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty.xmi"), b"FORM\0\0\0\x04XDIR").unwrap();
    fs::write(dir.path().join("good.xmi"), two_sequences()).unwrap();

    let output = convert(dir.path(), &["missing.xmi", "empty.xmi", "good.xmi"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not load missing.xmi"));
    assert!(stderr.contains("Could not convert empty.xmi"));
    assert!(stderr.contains("2 of 3 files failed to convert"));
    assert!(dir.path().join("good_0.mid").exists());
    assert!(dir.path().join("good_1.mid").exists());
}

#[test]
fn failed_save_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("song.xmi"), two_sequences()).unwrap();
    // A directory in place of the first output file.
    fs::create_dir(dir.path().join("song_0.mid")).unwrap();

    let output = convert(dir.path(), &["song.xmi"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not save song_0.mid"));
    assert!(dir.path().join("song_1.mid").is_file());
}

fn dump(xmi: &[u8]) -> Output {
    let mut child = Command::new(BIN)
        .arg("dump")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(xmi).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn dump_reads_stdin() {
    let output = dump(&two_sequences());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("## Sequence 0"));
    assert!(stdout.contains("## Sequence 1"));
    assert!(stdout.contains("60 pulses per quarter note"));
    assert!(stdout.contains("NoteOn"));
    assert!(stdout.contains("EndOfTrack"));
}

#[test]
fn dump_wraps_long_text() {
    let text = b"verse two begins here and the band keeps playing until the long awaited finale";
    let mut events = vec![0xFF, 0x06, text.len() as u8];
    events.extend(text);
    events.extend([0xFF, 0x2F, 0x00]);
    let output = dump(&evnt(&events));
    assert!(output.status.success());

    // Piped output wraps to the default 80 columns.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    let marker = lines
        .iter()
        .position(|line| line.contains(r#"Meta(Marker("verse"#))
        .unwrap();
    let last = lines
        .iter()
        .position(|line| line.contains(r#"finale"))"#))
        .unwrap();
    assert!(last > marker);
    assert!(lines[marker + 1..=last]
        .iter()
        .all(|line| line.trim_start().len() < line.len()));
}

#[test]
fn dump_without_sequences_fails() {
    let output = dump(b"FORM");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no convertible EVNT chunks"));
}
