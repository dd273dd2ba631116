//! Splitting one bunker into several scenes must not move anything.

use bunkermap::{AssetSet, BunkerConfig, RenderedScene, pipeline, scene};

use crate::helpers::{BUNKER_TOML, SKY, load_config, write_bunker};

fn render(config: &BunkerConfig, dir: &std::path::Path) -> Vec<RenderedScene> {
    let assets = AssetSet::load(&config.assets, dir).unwrap();
    pipeline::compose(&assets, config, None)
        .unwrap()
        .into_result()
        .unwrap()
}

#[test]
fn split_rooms_match_the_unsplit_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    let whole = render(&config, dir.path());
    assert_eq!(whole.len(), 1);
    let whole = &whole[0].image;

    config.layout.rooms_per_scene = Some(1);
    let parts = render(&config, dir.path());
    assert_eq!(parts.len(), 3);

    for part in &parts {
        let origin = part.plan.origin_y;
        let room = part.plan.rooms[0];
        // Rows covered only by this room's own walls and objects.
        for y in room.y + 20..room.y + 360 {
            for x in 140..660 {
                let local = part.image.get_pixel(x, y as u32);
                let global = whole.get_pixel(x, (y + origin) as u32);
                assert_eq!(
                    local, global,
                    "scene {} pixel ({x}, {y}) differs from global ({x}, {})",
                    part.plan.index,
                    y + origin
                );
            }
        }
    }
}

#[test]
fn max_scene_height_partitions_rooms() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    config.layout.max_scene_height = Some(900);

    let assets = AssetSet::load(&config.assets, dir.path()).unwrap();
    let prepared = pipeline::prepare(&assets, &config).unwrap();
    let dims = prepared.dims();

    let groups = scene::partition_rooms(&config, &dims);
    assert_eq!(groups, vec![0..2, 2..3]);

    let plans = scene::plan_scenes(&config, &dims).unwrap();
    assert!(plans.iter().all(|p| p.height <= 900));
    // Split scenes are sized to their rooms, not to the 600px background.
    assert_eq!(plans[0].height, 840);
    assert_eq!(plans[1].height, 30 + 400 + 50);

    let global = scene::global_layout(&config, &dims).unwrap();
    let stitched: Vec<_> = plans.iter().flat_map(|p| p.global_rooms()).collect();
    assert_eq!(stitched, global.rooms);
}

#[test]
fn tall_background_is_cropped_to_each_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    config.layout.max_scene_height = Some(900);
    image::RgbaImage::from_pixel(800, 2000, SKY)
        .save(dir.path().join("bg.png"))
        .unwrap();

    let scenes = render(&config, dir.path());
    assert_eq!(scenes.len(), 2);
    for scene in &scenes {
        let height = scene.image.height();
        assert!(height <= 900, "scene {} is {height}px", scene.plan.index);
        assert_eq!(scene.image.height(), scene.plan.height);
    }
}

#[test]
fn rooms_per_scene_takes_precedence_over_max_height() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    config.layout.max_scene_height = Some(900);
    config.layout.rooms_per_scene = Some(3);

    let scenes = render(&config, dir.path());
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].plan.rooms.len(), 3);
}
