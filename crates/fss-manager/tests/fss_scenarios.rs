mod common;

use std::fs;
use std::time::Duration;

use common::Harness;

#[test]
fn create_event_mirrors_new_file_to_target() {
    let harness = Harness::start(5);

    harness.send(&format!("add {} {}", harness.source_path(), harness.target_path()));
    harness.wait_for_output("Monitoring started", Duration::from_secs(5));

    fs::write(harness.source_dir.path().join("a.txt"), b"hello world").unwrap();
    harness.wait_for_file("a.txt", b"hello world", Duration::from_secs(5));

    harness.shutdown();
}

#[test]
fn cancel_stops_further_mirroring_and_reports_inactive_status() {
    let harness = Harness::start(5);

    harness.send(&format!("add {} {}", harness.source_path(), harness.target_path()));
    harness.wait_for_output("Monitoring started", Duration::from_secs(5));

    harness.send(&format!("cancel {}", harness.source_path()));
    harness.wait_for_output("Monitoring stopped", Duration::from_secs(5));

    fs::write(harness.source_dir.path().join("b.txt"), b"should not mirror").unwrap();
    harness.assert_file_absent_after_settle("b.txt", Duration::from_millis(500));

    harness.send(&format!("status {}", harness.source_path()));
    let out = harness.wait_for_output("Status: Inactive", Duration::from_secs(5));
    assert!(out.contains("Status: Inactive"));

    harness.shutdown();
}

#[test]
fn modified_event_overwrites_existing_mirrored_file() {
    let harness = Harness::start(5);

    harness.send(&format!("add {} {}", harness.source_path(), harness.target_path()));
    harness.wait_for_output("Monitoring started", Duration::from_secs(5));

    let path = harness.source_dir.path().join("c.txt");
    fs::write(&path, b"version one").unwrap();
    harness.wait_for_file("c.txt", b"version one", Duration::from_secs(5));

    fs::write(&path, b"version two, a bit longer").unwrap();
    harness.wait_for_file("c.txt", b"version two, a bit longer", Duration::from_secs(5));

    harness.shutdown();
}

#[test]
fn adding_the_same_source_twice_is_rejected() {
    let harness = Harness::start(5);

    harness.send(&format!("add {} {}", harness.source_path(), harness.target_path()));
    harness.wait_for_output("Monitoring started", Duration::from_secs(5));

    harness.send(&format!("add {} {}", harness.source_path(), harness.target_path()));
    harness.wait_for_output("Already in queue", Duration::from_secs(5));

    harness.shutdown();
}
