//! Recent files are only written to an explicitly chosen config file

use gcodelink::{remember_recent_file, Config};
use std::path::Path;

#[test]
fn test_without_config_path_nothing_is_written() {
    let mut config = Config::default();

    let saved = remember_recent_file(&mut config, None, Path::new("part.gcode")).expect("remember");

    assert!(!saved);
    assert_eq!(config.files.recent_files, vec![Path::new("part.gcode")]);
}

#[test]
fn test_explicit_config_path_is_updated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("gcodelink.toml");
    let mut config = Config::default();
    config.connection.baud_rate = 250_000;
    config.save_to_file(&path).expect("save");

    let saved = remember_recent_file(&mut config, Some(&path), Path::new("bracket.gcode"))
        .expect("remember");

    assert!(saved);
    let reloaded = Config::load_from_file(&path).expect("reload");
    assert_eq!(reloaded.files.recent_files, vec![Path::new("bracket.gcode")]);
    assert_eq!(reloaded.connection.baud_rate, 250_000);
}
