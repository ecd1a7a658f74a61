use std::fs;
use std::process::Command;

use panorama::spatial::BlockPos;
use panorama::world::{DirectoryBackend, MapBlockEncoder, Node};

#[test]
fn report_on_stdout_stays_parseable_with_logging_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let blocks = dir.path().join("blocks");
    fs::create_dir(&blocks).unwrap();

    let backend = DirectoryBackend::open(&blocks).unwrap();
    let mut stone = MapBlockEncoder::new();
    stone.set_mapping(1, "default:stone").fill(Node {
        id: 1,
        param1: 0,
        param2: 0,
    });
    backend
        .store(BlockPos::ZERO, &stone.encode().unwrap())
        .unwrap();

    let config = dir.path().join("panorama.json");
    fs::write(&config, r#"{ "world_path": "blocks", "worker_count": 1 }"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_panorama"))
        .arg(&config)
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["blocks"].as_array().unwrap().len(), 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Logger initialized"));
}
