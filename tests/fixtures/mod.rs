//! Shared test fixtures for integration and E2E CLI tests.
#![allow(dead_code)] // not every test file uses every fixture

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path to the homedeck binary.
pub fn homedeck_bin() -> &'static str {
    env!("CARGO_BIN_EXE_homedeck")
}

/// A living-room panel: presets, a state override, templates, a sub-page.
pub const LIVING_ROOM: &str = r#"
brightness: 80
sleep:
  dim_brightness: 20
  dim_timeout: 30
  sleep_timeout: 300
label_style:
  size: 12
presets:
  big:
    icon_size: "64 64"
  red:
    icon_color: FF0000
  blue:
    icon_color: "/0000FF"
pages:
  $root:
    buttons:
      - entity_id: light.living_room
        name: "{{ state_attr('light.living_room', 'friendly_name') }}"
        presets: [big, red, blue]
        icon: none
        states:
          "on":
            icon_background_color: FFC107
      - name: Rooms
        presets: $page.go_to
        tap_action:
          action: $page.go_to
          data: rooms
      - entity_id: sensor.temperature
        text: "{{ states('sensor.temperature') }}°"
        visibility: "{{ 'visible' if is_state('sensor.temperature', '21') else 'gone' }}"
      - null
  rooms:
    buttons:
      - name: Kitchen
      - name: Bedroom
      - name: Office
      - name: Garage
"#;

/// Hub states matching [`LIVING_ROOM`].
pub const LIVING_ROOM_STATES: &str = r#"[
  {"entity_id": "light.living_room", "state": "on",
   "attributes": {"friendly_name": "Living Room", "icon": "mdi:sofa"}},
  {"entity_id": "sensor.temperature", "state": "21", "attributes": {}}
]"#;

/// Writes `yaml` to a temp `configuration.yml`.
pub fn create_temp_config(yaml: &str) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("configuration.yml");
    fs::write(&path, yaml).expect("Failed to write config file");
    (path, temp_dir)
}

/// Writes a snapshot file next to the config.
pub fn write_snapshot(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("states.json");
    fs::write(&path, json).expect("Failed to write snapshot file");
    path
}

/// Writes a solid-color PNG under `<dir>/assets/<name>`.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
    let path = dir.join("assets").join(name);
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create assets dir");
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
        .save(&path)
        .expect("Failed to write PNG");
    path
}
