//! End-to-end tests for the `pages` command.

mod fixtures;

use fixtures::{create_temp_config, homedeck_bin, write_snapshot, LIVING_ROOM, LIVING_ROOM_STATES};
use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn pages_json(config: &Path, extra: &[&str]) -> Value {
    let output = Command::new(homedeck_bin())
        .args(["pages", "--config", config.to_str().unwrap(), "--json"])
        .args(extra)
        .output()
        .expect("Failed to execute command");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Invalid JSON output")
}

fn many_buttons(count: usize) -> String {
    let mut yaml = String::from("pages:\n  $root:\n    buttons:\n");
    for index in 0..count {
        yaml.push_str(&format!("      - name: B{index}\n"));
    }
    yaml
}

#[test]
fn test_pages_root_with_snapshot() {
    let (config_path, temp_dir) = create_temp_config(LIVING_ROOM);
    let snapshot = write_snapshot(temp_dir.path(), LIVING_ROOM_STATES);

    let pages = pages_json(
        &config_path,
        &["--page", "$root", "--snapshot", snapshot.to_str().unwrap()],
    );

    let pages = pages.as_array().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["page"], "$root");

    let sub_pages = pages[0]["sub_pages"].as_array().unwrap();
    assert_eq!(sub_pages.len(), 1);
    let slots = sub_pages[0].as_array().unwrap();
    assert_eq!(slots.len(), 15);

    assert_eq!(slots[0]["kind"], "button");
    assert_eq!(slots[0]["name"], "Living Room");
    assert_eq!(slots[1]["name"], "Rooms");
    assert_eq!(slots[1]["tap_action"], "$page.go_to");
    // visible because the temperature is 21
    assert_eq!(slots[2]["kind"], "button");
    assert_eq!(slots[3]["kind"], "empty");
    assert!(slots[4..].iter().all(|slot| slot["kind"] == "empty"));
}

#[test]
fn test_pages_gone_button_collapses() {
    let (config_path, temp_dir) = create_temp_config(LIVING_ROOM);
    let snapshot = write_snapshot(
        temp_dir.path(),
        r#"[
          {"entity_id": "light.living_room", "state": "off", "attributes": {}},
          {"entity_id": "sensor.temperature", "state": "19", "attributes": {}}
        ]"#,
    );

    let pages = pages_json(
        &config_path,
        &["--page", "$root", "--snapshot", snapshot.to_str().unwrap()],
    );
    let slots = pages[0]["sub_pages"][0].as_array().unwrap();

    assert_eq!(slots[1]["name"], "Rooms");
    // the sensor is gone, so the explicit empty slot moves up
    assert_eq!(slots[2]["kind"], "empty");
    assert_eq!(slots[3]["kind"], "empty");
}

#[test]
fn test_pages_sub_page_has_back_button() {
    let (config_path, _temp_dir) = create_temp_config(LIVING_ROOM);

    let pages = pages_json(&config_path, &["--page", "rooms"]);
    let slots = pages[0]["sub_pages"][0].as_array().unwrap();

    assert_eq!(slots[0]["kind"], "system");
    assert_eq!(slots[0]["name"], "Back");
    assert_eq!(slots[0]["tap_action"], "$page.back");
    assert_eq!(slots[1]["name"], "Kitchen");
    assert_eq!(slots[4]["name"], "Garage");
    assert_eq!(slots[5]["kind"], "empty");
}

#[test]
fn test_pages_split_into_sub_pages() {
    let (config_path, _temp_dir) = create_temp_config(&many_buttons(20));

    let pages = pages_json(&config_path, &[]);
    let sub_pages = pages[0]["sub_pages"].as_array().unwrap();
    assert_eq!(sub_pages.len(), 2);

    let first = sub_pages[0].as_array().unwrap();
    assert_eq!(first[0]["name"], "B0");
    assert_eq!(first[13]["name"], "B13");
    assert_eq!(first[14]["kind"], "system");
    assert_eq!(first[14]["tap_action"], "$page.next");

    let second = sub_pages[1].as_array().unwrap();
    assert_eq!(second.len(), 15);
    assert_eq!(second[0]["tap_action"], "$page.previous");
    assert_eq!(second[1]["name"], "B14");
    assert_eq!(second[6]["name"], "B19");
    assert_eq!(second[7]["kind"], "empty");
}

#[test]
fn test_pages_smaller_panel() {
    let (config_path, _temp_dir) = create_temp_config(&many_buttons(7));

    let pages = pages_json(&config_path, &["--keys", "6"]);
    let sub_pages = pages[0]["sub_pages"].as_array().unwrap();

    // next sits on the last key because position 15 is past the end
    assert_eq!(sub_pages.len(), 2);
    assert_eq!(sub_pages[0][5]["tap_action"], "$page.next");
    assert_eq!(sub_pages[1][0]["tap_action"], "$page.previous");
    assert_eq!(sub_pages[1][1]["name"], "B5");
}

#[test]
fn test_pages_text_output() {
    let (config_path, _temp_dir) = create_temp_config(LIVING_ROOM);

    let output = Command::new(homedeck_bin())
        .args(["pages", "--config", config_path.to_str().unwrap(), "--page", "rooms"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rooms (1 sub-page(s))"));
    assert!(stdout.contains("Kitchen"));
    assert!(stdout.contains("$page.back"));
}

#[test]
fn test_pages_unknown_page() {
    let (config_path, _temp_dir) = create_temp_config(LIVING_ROOM);

    let output = Command::new(homedeck_bin())
        .args(["pages", "--config", config_path.to_str().unwrap(), "--page", "attic"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Page 'attic' does not exist"));
}

#[test]
fn test_pages_bad_snapshot() {
    let (config_path, temp_dir) = create_temp_config(LIVING_ROOM);
    let snapshot = write_snapshot(temp_dir.path(), "{not json");

    let output = Command::new(homedeck_bin())
        .args([
            "pages",
            "--config",
            config_path.to_str().unwrap(),
            "--snapshot",
            snapshot.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid snapshot file"));
}
