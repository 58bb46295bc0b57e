//! Performance benchmarks for the reconciliation path

use client::backend::RecordingBackend;
use client::entities::EntityStore;
use client::visuals::VisualBindings;
use shared::{Components, Entity, EntityUpdate, Level, Sprite, TileCode};
use std::time::Instant;

fn drawable(id: u64, x: f32) -> Entity {
    Entity::new(
        id,
        Components::default()
            .with_position(x, 0.0)
            .with_sprite(Sprite::default()),
    )
}

fn level() -> Level {
    Level {
        tile_width: 32,
        tile_height: 32,
        width: 64,
        height: 64,
        tileset: "t".to_string(),
        tiles: vec![TileCode::from(0); 64 * 64],
        camera_zoom: 1.0,
    }
}

/// Benchmarks update batches against a large store
#[test]
fn benchmark_apply_updates() {
    let entity_count = 10_000u64;
    let mut store = EntityStore::new();
    store.replace_all((0..entity_count).map(|id| drawable(id, 0.0)).collect());

    let iterations = 100;
    let start = Instant::now();

    for i in 0..iterations {
        let updates = (0..1_000u64)
            .map(|n| {
                let id = (n * 7 + i) % entity_count;
                EntityUpdate::components(id, drawable(id, i as f32).components)
            })
            .collect();
        store.apply_updates(updates);
    }

    let duration = start.elapsed();
    println!(
        "Apply updates: {} batches of 1000 in {:?} ({:.2} μs/batch)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(store.len(), entity_count as usize);
    // Lookup is by id, so this stays far below a linear scan per update
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks visual sync when nothing changed
#[test]
fn benchmark_idle_sync() {
    let mut store = EntityStore::new();
    store.replace_all((0..5_000u64).map(|id| drawable(id, id as f32)).collect());
    let level = level();
    let mut visuals = VisualBindings::new();
    let mut backend = RecordingBackend::new();
    visuals.sync(&store, &level, &mut backend);
    backend.take_calls();

    let iterations = 100;
    let start = Instant::now();

    for _ in 0..iterations {
        visuals.sync(&store, &level, &mut backend);
    }

    let duration = start.elapsed();
    println!(
        "Idle sync: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(backend.calls().is_empty());
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks retiring most of a large store in one batch
#[test]
fn benchmark_mass_retirement() {
    let mut store = EntityStore::new();
    store.replace_all((0..20_000u64).map(|id| drawable(id, 0.0)).collect());

    let start = Instant::now();
    let report = store.apply_updates((0..19_000u64).map(EntityUpdate::retire).collect());
    let duration = start.elapsed();

    println!("Mass retirement: 19000 entities in {:?}", duration);

    assert_eq!(report.removed.len(), 19_000);
    assert_eq!(store.len(), 1_000);
    assert!(duration.as_millis() < 1000);
}
