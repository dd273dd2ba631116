//! TOML save/load round trips for the bunker config.

use bunkermap::config::PlacementSpec;
use bunkermap::{BackgroundFit, BunkerConfig, ComposeError, ObjectKind, SegmentMethod};

use crate::helpers::{BUNKER_TOML, load_config, write_bunker};

#[test]
fn saved_config_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("bunker.toml");

    let mut config = BunkerConfig::default();
    config.assets.background = Some("art/bg.png".into());
    config.grid.floor_height = Some(679);
    config.grid.objects.water_purifier.scale = 1.2;
    config.grid.objects.water_purifier.y_offset = -12.5;
    config.segmentation.garden = SegmentMethod::ChromaKey {
        threshold: 220,
        soft_band: 20,
        dark_threshold: Some(15),
    };
    config.layout.max_scene_height = Some(4000);
    config.layout.background_fit = BackgroundFit::Tile;
    config.placements.push(PlacementSpec {
        kind: ObjectKind::WaterPurifier,
        start_slot: 3,
        slot_span: 2,
        rooms: Some(vec![0, 2]),
    });
    config.batch.workers = Some(3);
    config.save_to_file(&path).unwrap();

    let back = BunkerConfig::from_file(&path).unwrap();
    back.validate().unwrap();
    assert_eq!(back.assets.background, config.assets.background);
    assert_eq!(back.grid.floor_height, Some(679));
    assert_eq!(back.grid.objects.water_purifier, config.grid.objects.water_purifier);
    assert_eq!(back.segmentation.garden, config.segmentation.garden);
    assert_eq!(back.segmentation.room, config.segmentation.room);
    assert_eq!(back.layout.max_scene_height, Some(4000));
    assert_eq!(back.layout.background_fit, BackgroundFit::Tile);
    assert_eq!(back.placements, config.placements);
    assert_eq!(back.batch.workers, Some(3));
}

#[test]
fn fixture_config_parses_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&write_bunker(dir.path(), BUNKER_TOML));

    assert_eq!(config.layout.room_count, 3);
    assert_eq!(config.grid.vertical_padding, -40);
    assert_eq!(config.grid.slot_count, 8);
    assert_eq!(config.placements.len(), 2);
    assert_eq!(config.placements[0].rooms, None);
    assert_eq!(config.placements[1].slot_span, 1);
    assert_eq!(config.output.file_prefix, "scene");
}

#[test]
fn segmentation_method_is_tagged_in_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bunker.toml");
    std::fs::write(
        &path,
        r#"
[segmentation.room]
method = "none"

[segmentation.scrap_machine]
method = "flood_fill"
threshold = 240
"#,
    )
    .unwrap();

    let config = BunkerConfig::from_file(&path).unwrap();
    assert_eq!(config.segmentation.room, SegmentMethod::None);
    assert_eq!(
        config.segmentation.scrap_machine,
        SegmentMethod::FloodFill {
            threshold: 240,
            fringe_threshold: None,
        }
    );
}

#[test]
fn unknown_object_kind_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bunker.toml");
    std::fs::write(&path, "[[placements]]\nkind = \"reactor\"\nstart_slot = 0\n").unwrap();

    assert!(matches!(
        BunkerConfig::from_file(&path),
        Err(ComposeError::Config(_))
    ));
}
