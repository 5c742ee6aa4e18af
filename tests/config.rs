use std::sync::Mutex;

use tempfile::NamedTempFile;

use waste_sorter::config::SorterConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "WASTE_SORTER_CONFIG",
        "WASTE_SORTER_DB",
        "WASTE_SORTER_MODEL",
        "WASTE_SORTER_CAMERA",
        "WASTE_SORTER_UPLOAD_CONF",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "db_path": "sorter_prod.db",
        "upload_confidence": 0.35,
        "live_confidence": 0.6,
        "model": {
            "path": "models/yolov8n-waste.onnx",
            "input_size": 320,
            "class_names": ["paper", " plastic ", "glass"]
        },
        "camera": {
            "device": "/dev/video2",
            "width": 1280,
            "height": 720
        },
        "animations": {
            "enabled": false,
            "timeout_secs": 2
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("WASTE_SORTER_CONFIG", file.path());
    std::env::set_var("WASTE_SORTER_CAMERA", "stub://bench");
    std::env::set_var("WASTE_SORTER_UPLOAD_CONF", "0.25");

    let cfg = SorterConfig::load().expect("load config");

    assert_eq!(cfg.db_path, "sorter_prod.db");
    assert_eq!(cfg.upload_confidence, 0.25);
    assert_eq!(cfg.live_confidence, 0.6);
    assert_eq!(cfg.model.path, "models/yolov8n-waste.onnx");
    assert_eq!(cfg.model.input_size, 320);
    assert_eq!(cfg.model.class_names, vec!["paper", "plastic", "glass"]);
    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    assert!(!cfg.animations.enabled);
    assert_eq!(cfg.animations.timeout.as_secs(), 2);

    let spec = cfg.model_spec();
    assert_eq!(spec.path, "models/yolov8n-waste.onnx");
    assert_eq!(spec.class_names.len(), 3);

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();
    std::env::set_var("WASTE_SORTER_DB", "file:defaults?mode=memory&cache=shared");
    std::env::set_var("WASTE_SORTER_MODEL", "stub://plastic");

    let cfg = SorterConfig::load().expect("load config");

    assert_eq!(cfg.db_path, "file:defaults?mode=memory&cache=shared");
    assert_eq!(cfg.model.path, "stub://plastic");
    assert_eq!(cfg.upload_confidence, 0.4);
    assert_eq!(cfg.live_confidence, 0.5);
    assert_eq!(cfg.camera.device, "/dev/video0");
    assert_eq!(cfg.model.class_names.first().map(String::as_str), Some("battery"));

    clear_env();
}

#[test]
fn rejects_invalid_thresholds_and_files() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("WASTE_SORTER_UPLOAD_CONF", "1.7");
    assert!(SorterConfig::load().is_err());

    std::env::set_var("WASTE_SORTER_UPLOAD_CONF", "high");
    assert!(SorterConfig::load().is_err());
    std::env::remove_var("WASTE_SORTER_UPLOAD_CONF");

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("WASTE_SORTER_CONFIG", file.path());
    assert!(SorterConfig::load().is_err());

    std::env::set_var("WASTE_SORTER_CONFIG", "/nonexistent/waste_sorter.json");
    assert!(SorterConfig::load().is_err());

    clear_env();
}
