//! Config file to PNG on disk, through every stage.

use std::sync::{Arc, Mutex};

use bunkermap::compositor::SkippedPlacement;
use bunkermap::output::{self, ManifestEntry};
use bunkermap::{AssetSet, ObjectKind, ProgressCallback, ProgressEvent, pipeline, scene};
use image::Rgba;

use crate::helpers::{BUNKER_TOML, DOOR, LEAF, SKY, WALL, framed, load_config, write_bunker};

fn close(actual: &Rgba<u8>, expected: Rgba<u8>, tolerance: u8) -> bool {
    actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| a.abs_diff(*e) <= tolerance)
}

#[test]
fn short_background_is_extended_to_fit_the_stack() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    let assets = AssetSet::load(&config.assets, dir.path()).unwrap();

    let scenes = pipeline::compose(&assets, &config, None)
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(scenes.len(), 1);
    let scene = &scenes[0];

    // Rooms at y = 30, 390, 750; the last ends at 1150 plus a 50px margin.
    let ys: Vec<i32> = scene.plan.rooms.iter().map(|r| r.y).collect();
    assert_eq!(ys, vec![30, 390, 750]);
    assert!(scene.plan.rooms.iter().all(|r| r.x == 120 && r.width == 560));
    assert_eq!(scene.image.dimensions(), (800, 1200));
    assert!(scene.image.height() >= 30 + 3 * (400 - 40) + 50);

    // Room walls cover the background; margins and keyed borders show sky.
    assert_eq!(*scene.image.get_pixel(400, 230), WALL);
    assert_eq!(*scene.image.get_pixel(400, 590), WALL);
    assert!(close(scene.image.get_pixel(60, 100), SKY, 2));
    assert!(close(scene.image.get_pixel(125, 100), SKY, 2));
    assert!(close(scene.image.get_pixel(60, 1180), SKY, 2));

    // The garden spans slots 0-1 of each room and stands on the floor line.
    assert!(close(scene.image.get_pixel(249, 338), LEAF, 8));
    assert!(close(scene.image.get_pixel(249, 698), LEAF, 8));
}

#[test]
fn missing_sprite_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    let assets = AssetSet::load(&config.assets, dir.path()).unwrap();
    assert!(!assets.objects.contains_key(&ObjectKind::ScrapMachine));

    let report = pipeline::compose(&assets, &config, None).unwrap();
    assert!(report.is_success());
    let scenes = report.into_result().unwrap();
    assert_eq!(
        scenes[0].skipped,
        vec![SkippedPlacement {
            room: 1,
            kind: ObjectKind::ScrapMachine,
        }]
    );
}

#[test]
fn entrance_is_painted_over_the_first_room() {
    let dir = tempfile::tempdir().unwrap();
    let text = BUNKER_TOML.replace("[assets.objects]", "entrance = \"entrance.png\"\n\n[assets.objects]");
    let path = write_bunker(dir.path(), &text);
    // Full-height walls so the entrance and first room overlap on opaque rows.
    framed(560, 400, 20, 0, WALL).save(dir.path().join("room.png")).unwrap();
    framed(560, 300, 20, 0, DOOR).save(dir.path().join("entrance.png")).unwrap();

    let config = load_config(&path);
    let assets = AssetSet::load(&config.assets, dir.path()).unwrap();
    let scenes = pipeline::compose(&assets, &config, None)
        .unwrap()
        .into_result()
        .unwrap();
    let plan = &scenes[0].plan;

    let entrance = plan.entrance.unwrap();
    assert_eq!((entrance.x, entrance.y), (120, 30));
    // 30 + 300 - 40
    assert_eq!(plan.rooms[0].y, 290);
    assert_eq!(*scenes[0].image.get_pixel(400, 310), DOOR);
    assert_eq!(*scenes[0].image.get_pixel(400, 340), WALL);
}

#[test]
fn identical_inputs_render_identical_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&write_bunker(dir.path(), BUNKER_TOML));
    let assets = AssetSet::load(&config.assets, dir.path()).unwrap();

    let first = pipeline::compose(&assets, &config, None).unwrap().into_result().unwrap();
    let second = pipeline::compose(&assets, &config, None).unwrap().into_result().unwrap();
    assert_eq!(first[0].image, second[0].image);
}

#[test]
fn scenes_and_manifest_land_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let text = BUNKER_TOML.replace("trailing_margin = 50", "trailing_margin = 50\nrooms_per_scene = 2");
    let config = load_config(&write_bunker(dir.path(), &text));
    let assets = AssetSet::load(&config.assets, dir.path()).unwrap();
    let prepared = pipeline::prepare(&assets, &config).unwrap();
    let plans = scene::plan_scenes(&config, &prepared.dims()).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback = Box::new(move |event| {
        if let Ok(mut guard) = sink.lock() {
            guard.push(event);
        }
    });

    let out = dir.path().join("out");
    let prefix = config.output.file_prefix.clone();
    let report = pipeline::render_all(&plans, &prepared, &config, Some(&callback), |rendered| {
        output::write_scene(&rendered, &out, &prefix)?;
        Ok(ManifestEntry::from_scene(&rendered, &prefix))
    })
    .unwrap();
    assert!(report.is_success());

    let entries: Vec<ManifestEntry> = report.succeeded().map(|(_, e)| e.clone()).collect();
    let manifest = output::write_manifest(&out, entries).unwrap();

    assert!(out.join("scene_1.png").is_file());
    assert!(out.join("scene_2.png").is_file());
    assert!(!out.join("scene_3.png").exists());

    let back = output::read_manifest(&manifest).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].rooms, vec![0, 1]);
    assert_eq!(back[1].rooms, vec![2]);
    assert_eq!(back[1].origin_y, 720);

    let decoded = image::open(out.join("scene_2.png")).unwrap().to_rgba8();
    assert_eq!(decoded.width(), 800);
    assert_eq!(decoded.height(), back[1].height);

    let events = events.lock().unwrap_or_else(|e| e.into_inner());
    let finished = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::SceneFinished { .. }))
        .count();
    assert_eq!(finished, 2);
}
