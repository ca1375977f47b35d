//! End-to-end tests for the `render` command.

mod fixtures;

use fixtures::{create_temp_config, homedeck_bin, write_png, LIVING_ROOM};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const SWATCHES: &str = r#"
pages:
  $root:
    buttons:
      - name: Red
        icon: local:red.png
      - name: Blue
        icon: none
        icon_background_color: 0000FF
      - null
"#;

fn render(config: &Path, dir: &Path, extra: &[&str]) -> Output {
    let output = dir.join("out");
    Command::new(homedeck_bin())
        .args([
            "render",
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--assets",
            dir.join("assets").to_str().unwrap(),
            "--cache",
            dir.join("cache").to_str().unwrap(),
            "--key-size",
            "32x32",
            "--offline",
        ])
        .args(extra)
        .output()
        .expect("Failed to execute command")
}

fn center_pixel(path: &Path) -> [u8; 4] {
    let image = image::open(path).expect("Failed to open key image").to_rgba8();
    image.get_pixel(image.width() / 2, image.height() / 2).0
}

#[test]
fn test_render_writes_every_key() {
    let (config_path, temp_dir) = create_temp_config(SWATCHES);
    write_png(temp_dir.path(), "red.png", 8, 8, [255, 0, 0, 255]);

    let output = render(&config_path, temp_dir.path(), &["--keys", "4"]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("✓ Rendered page '$root' 1/1"));

    let out = temp_dir.path().join("out");
    for slot in 0..4 {
        assert!(out.join(format!("key-{slot:02}.png")).exists(), "key {slot} missing");
    }
    assert!(!out.join("key-04.png").exists());

    assert_eq!(center_pixel(&out.join("key-00.png")), [255, 0, 0, 255]);
    assert_eq!(center_pixel(&out.join("key-01.png")), [0, 0, 255, 255]);
    assert_eq!(center_pixel(&out.join("key-02.png"))[3], 0);

    let titles = fs::read_to_string(out.join("titles.json")).unwrap();
    assert!(titles.contains("Red"));
    assert!(titles.contains("Blue"));
}

#[test]
fn test_render_missing_local_icon_still_renders() {
    let (config_path, temp_dir) = create_temp_config(
        "pages:\n  $root:\n    buttons:\n      - icon: local:nope.png\n        icon_background_color: 00FF00\n",
    );

    let output = render(&config_path, temp_dir.path(), &["--keys", "2"]);

    assert_eq!(output.status.code(), Some(0));
    let key = temp_dir.path().join("out").join("key-00.png");
    assert_eq!(center_pixel(&key), [0, 255, 0, 255]);
}

#[test]
fn test_render_sub_page() {
    let mut yaml = String::from("pages:\n  $root:\n    buttons:\n");
    for index in 0..6 {
        yaml.push_str(&format!("      - name: B{index}\n"));
    }
    let (config_path, temp_dir) = create_temp_config(&yaml);

    let output = render(&config_path, temp_dir.path(), &["--keys", "4", "--sub-page", "2"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("2/2"));
    let titles = fs::read_to_string(temp_dir.path().join("out").join("titles.json")).unwrap();
    assert!(titles.contains("Previous"));
    assert!(titles.contains("B3"));
    assert!(!titles.contains("B0"));
}

#[test]
fn test_render_named_page() {
    let (config_path, temp_dir) = create_temp_config(LIVING_ROOM);

    let output = render(&config_path, temp_dir.path(), &["--page", "rooms"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("✓ Rendered page 'rooms' 1/1"));
    let titles = fs::read_to_string(temp_dir.path().join("out").join("titles.json")).unwrap();
    assert!(titles.contains("Back"));
    assert!(titles.contains("Kitchen"));
}

#[test]
fn test_render_unknown_page() {
    let (config_path, temp_dir) = create_temp_config(LIVING_ROOM);

    let output = render(&config_path, temp_dir.path(), &["--page", "attic"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_render_rejects_bad_key_size() {
    let (config_path, temp_dir) = create_temp_config(LIVING_ROOM);

    let output = Command::new(homedeck_bin())
        .args([
            "render",
            "--config",
            config_path.to_str().unwrap(),
            "--output",
            temp_dir.path().join("out").to_str().unwrap(),
            "--key-size",
            "huge",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid key size"));
}
