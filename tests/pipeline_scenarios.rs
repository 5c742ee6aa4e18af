use anyhow::Result;

use waste_sorter::{
    classify, normalize_class_name, shared_memory_uri, CaptureDevice, Dashboard, DetectionAdapter,
    Frame, InMemoryWasteLogStore, LiveLoop, LiveSettings, LiveState, NewLogEntry, Pipeline,
    ProcessOutcome, RecordingSink, SorterError, SqliteWasteLogStore, Status, StopReason,
    StopToken, StubBackend, SyntheticCamera, WasteCategory, WasteLogStore,
};

#[test]
fn mixed_log_aggregates_one_per_item() -> Result<()> {
    let mut store = SqliteWasteLogStore::open(&shared_memory_uri())?;
    for (label, confidence) in [("plastic", 0.91), ("Banana Peel ", 0.3), ("cardboard", 0.77)] {
        let name = normalize_class_name(label);
        store.append(&NewLogEntry::new(name.clone(), classify(&name), confidence))?;
    }

    let entries = store.read_all()?;
    assert_eq!(entries[1].class_name(), "banana peel");
    assert_eq!(entries[1].waste_type(), "Unknown");
    assert_eq!(entries[2].waste_type(), "Biodegradable");

    let dashboard = Dashboard::load(&store)?;
    assert_eq!(dashboard.total_items, 3);
    for name in ["plastic", "banana peel", "cardboard"] {
        assert_eq!(dashboard.count_for(name), 1, "{name}");
    }
    assert_eq!(Dashboard::load(&store)?, dashboard);
    Ok(())
}

#[test]
fn upload_flow_persists_to_sqlite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("waste_data.db");
    let image_path = dir.path().join("item.png");
    Frame::filled(32, 24, [120, 90, 60]).save(&image_path)?;

    {
        let mut store = SqliteWasteLogStore::open(db_path.to_str().unwrap_or_default())?;
        let mut adapter = DetectionAdapter::new(StubBackend::from_uri("stub://glass:0.83")?);
        let mut sink = RecordingSink::new();
        let frame = Frame::open(&image_path)?;
        let outcome =
            Pipeline::new(&mut adapter, &mut store, &mut sink).process_image(&frame, 0.4)?;
        assert!(matches!(outcome, ProcessOutcome::Classified { log_id: Some(_), .. }));
        assert_eq!(sink.verdicts()[0].category, WasteCategory::NonBiodegradable);
    }

    let reopened = SqliteWasteLogStore::open(db_path.to_str().unwrap_or_default())?;
    let entries = reopened.read_all()?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].class_name(), "glass");
    assert!((entries[0].confidence() - 0.83).abs() < 1e-6);
    Ok(())
}

#[test]
fn threshold_filters_weak_detections() -> Result<()> {
    let mut store = InMemoryWasteLogStore::new();
    let mut adapter = DetectionAdapter::new(StubBackend::from_uri("stub://paper:0.35")?);
    let mut sink = RecordingSink::new();
    let frame = Frame::filled(8, 8, [0, 0, 0]);

    let outcome = Pipeline::new(&mut adapter, &mut store, &mut sink).process_image(&frame, 0.4)?;

    assert_eq!(outcome, ProcessOutcome::NoDetection);
    assert!(store.is_empty());
    assert_eq!(
        sink.statuses(),
        vec![&Status::Info("No trash detected in this frame.".to_string())]
    );
    Ok(())
}

#[test]
fn unopenable_database_is_a_storage_failure() {
    let err = SqliteWasteLogStore::open("/nonexistent-dir/waste_data.db")
        .err()
        .expect("open must fail");
    assert!(matches!(
        SorterError::of(&err),
        Some(SorterError::StorageFailure(_))
    ));
}

#[test]
fn live_loop_survives_camera_unplug() -> Result<()> {
    let mut store = SqliteWasteLogStore::open(&shared_memory_uri())?;
    let mut adapter = DetectionAdapter::new(StubBackend::from_uri("stub://biological,none,metal")?);
    let mut sink = RecordingSink::new();
    let mut camera = SyntheticCamera::from_uri("stub://cam?frames=3", 16, 16)?;

    let report = LiveLoop::new(
        Pipeline::new(&mut adapter, &mut store, &mut sink),
        LiveSettings::default(),
    )
    .run(&mut camera, &StopToken::new());

    assert_eq!(
        report.transitions,
        vec![LiveState::Running, LiveState::Stopped]
    );
    assert!(matches!(report.stop_reason, StopReason::CaptureFailed(_)));
    assert_eq!(report.frames_processed, 3);
    assert_eq!(report.items_logged, 2);
    assert_eq!(camera.stats().opens, 1);
    assert_eq!(camera.stats().releases, 1);

    let statuses = sink.statuses();
    assert_eq!(statuses[0], &Status::Success("BIOLOGICAL (BIO)".to_string()));
    assert_eq!(statuses[1], &Status::Info("Scanning...".to_string()));
    assert_eq!(statuses[2], &Status::Warning("METAL (NON-BIO)".to_string()));
    assert!(statuses[3].is_error());

    let dashboard = Dashboard::load(&store)?;
    assert_eq!(dashboard.count_for("biological"), 1);
    assert_eq!(dashboard.count_for("metal"), 1);
    Ok(())
}
