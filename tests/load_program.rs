//! Program loading through the top-level crate

use gcodelink::{extract_path, load_program, Config, GcodeError};
use std::io::Write;

#[test]
fn test_load_allowed_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".GCODE")
        .tempfile()
        .expect("tempfile");
    writeln!(file, "G28\n; move\nG1 X10 Y0 Z0\nG1 Y5\nG0 X0").expect("write");

    let config = Config::default();
    let program = load_program(file.path(), &config.files.allowed_extensions).expect("load");
    assert_eq!(program.commands.len(), 4);

    let path = extract_path(&program.commands).expect("path");
    let coords: Vec<_> = path.iter().map(|p| p.as_tuple()).collect();
    assert_eq!(coords, vec![(10.0, 0.0, 0.0), (10.0, 5.0, 0.0)]);
}

#[test]
fn test_rejects_other_extensions() {
    let file = tempfile::Builder::new()
        .suffix(".stl")
        .tempfile()
        .expect("tempfile");

    let config = Config::default();
    let err = load_program(file.path(), &config.files.allowed_extensions).expect_err("rejected");
    assert!(matches!(
        err,
        gcodelink::Error::Gcode(GcodeError::FileError { .. })
    ));
}
