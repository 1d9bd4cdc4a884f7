use chrono::NaiveDate;
use openingtree_core::{GameRecord, GameResult, VariationTree};
use openingtree_service::{
    BuildConfig, BuildJob, BuildStep, ByteSlot, CoordinateEngine, FinishedBuild, LoadOutcome,
    MemorySlot, OpeningTreeService, ParameterChange, Publication, TreeMetadata, encode,
    should_rebuild,
};
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

fn record(id: &str, moves: &str) -> GameRecord {
    GameRecord {
        id: id.to_string(),
        moves: moves.to_string(),
        white: "alice".to_string(),
        black: "bob".to_string(),
        result: GameResult::Draw,
        date: NaiveDate::from_ymd_opt(2024, 3, 17).expect("valid date"),
        url: format!("https://example.org/game/{id}"),
        white_elo: None,
        black_elo: None,
    }
}

fn two_games() -> Vec<GameRecord> {
    vec![record("g1", "e2e4 e7e5"), record("g2", "e2e4 c7c5")]
}

fn small_chunks() -> BuildConfig {
    BuildConfig {
        chunk_size: 2,
        snapshot_every: 1,
        ..BuildConfig::default()
    }
}

fn service(games: Vec<GameRecord>) -> OpeningTreeService<Vec<GameRecord>, MemorySlot> {
    OpeningTreeService::new(games, MemorySlot::new(), small_chunks())
}

fn finish(job: &mut BuildJob) -> FinishedBuild {
    loop {
        match job.tick(&CoordinateEngine) {
            BuildStep::Progress(_) => {}
            BuildStep::Finished(finished) => return finished,
            BuildStep::Idle => panic!("job was already finished"),
        }
    }
}

fn published(service: &OpeningTreeService<Vec<GameRecord>, MemorySlot>) -> std::sync::Arc<VariationTree> {
    service.current_tree().expect("a tree is published")
}

fn frequency(tree: &VariationTree, labels: &[&str]) -> Option<usize> {
    let node_id = tree.find_by_san(labels)?;
    tree.node(node_id).ok().map(|node| node.frequency())
}

#[test]
fn build_counts_games_along_each_variation() {
    let mut service = service(two_games());
    let job = service.rebuild(2, 1).expect("store lists games");
    let publication = service
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    assert!(matches!(publication, Publication::Published { .. }));
    let tree = published(&service);
    assert_eq!(frequency(&tree, &[]), Some(2));
    assert_eq!(frequency(&tree, &["e4"]), Some(2));
    assert_eq!(frequency(&tree, &["e4", "e5"]), Some(1));
    assert_eq!(frequency(&tree, &["e4", "c5"]), Some(1));
}

#[test]
fn min_games_prunes_rare_replies() {
    let mut service = service(two_games());
    let job = service.rebuild(2, 2).expect("store lists games");
    service
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    let tree = published(&service);
    assert_eq!(tree.node_count(), 2);
    assert_eq!(frequency(&tree, &["e4"]), Some(2));
    assert_eq!(frequency(&tree, &["e4", "e5"]), None);
    assert_eq!(frequency(&tree, &["e4", "c5"]), None);
}

#[test]
fn malformed_game_is_skipped_without_failing_the_build() {
    let games = vec![
        record("g1", "e2e4 e7e5"),
        record("g2", "d2d4 d7d5"),
        record("g3", "e2e4 e7e5 d1d8"),
        record("g4", "c2c4"),
        record("g5", "e2e4 c7c5"),
    ];
    let mut service = service(games);
    let mut job = service.rebuild(3, 1).expect("store lists games");

    let finished = finish(&mut job);
    assert_eq!(finished.report.added, 4);
    assert_eq!(finished.report.skipped.len(), 1);
    assert_eq!(finished.report.skipped[0].game_id, "g3");

    service.complete(finished).expect("publication succeeds");
    let tree = published(&service);
    assert_eq!(frequency(&tree, &[]), Some(4));
    assert_eq!(frequency(&tree, &["e4"]), Some(2));
    assert!(tree.game("g3").is_none());
}

#[test]
fn stale_game_count_or_deeper_request_forces_rebuild() {
    let games: Vec<GameRecord> = (0..101)
        .map(|idx| record(&format!("g{idx}"), "e2e4"))
        .collect();

    assert!(should_rebuild(
        Some(&TreeMetadata::new(100, 10, 1)),
        &games,
        10,
        1
    ));
    assert!(should_rebuild(
        Some(&TreeMetadata::new(101, 5, 1)),
        &games,
        10,
        1
    ));
    assert!(!should_rebuild(
        Some(&TreeMetadata::new(101, 10, 1)),
        &games,
        6,
        2
    ));
}

#[test]
fn superseded_build_is_discarded() {
    let mut service = service(two_games());
    let mut first = service.build(two_games(), 2, 1);
    let mut second = service.build(vec![record("g9", "d2d4")], 2, 1);

    let stale = finish(&mut first);
    let publication = service.complete(stale).expect("complete succeeds");
    assert_eq!(
        publication,
        Publication::Discarded {
            generation: first.generation(),
            current: second.generation(),
        }
    );
    assert!(service.current_tree().is_none());
    assert_eq!(service.slot().load().expect("memory slot"), None);

    let fresh = finish(&mut second);
    let publication = service.complete(fresh).expect("complete succeeds");
    assert_eq!(
        publication,
        Publication::Published {
            generation: second.generation()
        }
    );
    assert!(published(&service).game("g9").is_some());
}

#[test]
fn progress_is_monotonic_and_snapshots_are_periodic() {
    let games: Vec<GameRecord> = (0..25)
        .map(|idx| record(&format!("g{idx}"), "e2e4 e7e5"))
        .collect();
    let config = BuildConfig {
        chunk_size: 10,
        snapshot_every: 2,
        ..BuildConfig::default()
    };
    let mut service = OpeningTreeService::new(games, MemorySlot::new(), config);
    let job = service.rebuild(2, 1).expect("store lists games");
    assert_eq!(job.handle().total(), 25);

    let mut seen = Vec::new();
    service
        .run(job, &CoordinateEngine, |progress| {
            seen.push((progress.processed, progress.snapshot.clone()));
        })
        .expect("build completes");

    let processed: Vec<usize> = seen.iter().map(|(processed, _)| *processed).collect();
    assert_eq!(processed, vec![10, 20, 25]);

    let snapshot = seen[1].1.as_ref().expect("second chunk carries a snapshot");
    assert_eq!(frequency(snapshot, &["e4"]), Some(20));
    assert!(seen[0].1.is_none());
    assert!(seen[2].1.is_none());
}

#[test]
fn finished_job_goes_idle() {
    let mut service = service(two_games());
    let mut job = service.rebuild(2, 1).expect("store lists games");
    let _ = finish(&mut job);

    assert!(job.is_finished());
    assert!(matches!(job.tick(&CoordinateEngine), BuildStep::Idle));
}

#[test]
fn parameter_changes_reprune_or_rebuild() {
    let games = vec![
        record("g1", "e2e4 e7e5 g1f3"),
        record("g2", "e2e4 e7e5 f1c4"),
        record("g3", "e2e4 c7c5"),
    ];
    let mut service = service(games);
    let job = service.rebuild(3, 1).expect("store lists games");
    service
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    let change = service.apply_parameters(2, 2).expect("store lists games");
    assert!(matches!(change, ParameterChange::Repruned));
    let tree = published(&service);
    assert_eq!(frequency(&tree, &["e4", "e5"]), Some(2));
    assert_eq!(frequency(&tree, &["e4", "c5"]), None);
    assert_eq!(frequency(&tree, &["e4", "e5", "Nf3"]), None);
    let metadata = service.current_metadata().expect("metadata is published");
    assert_eq!(metadata.max_depth, Some(2));
    assert_eq!(metadata.min_games, Some(2));

    let change = service.apply_parameters(2, 2).expect("store lists games");
    assert!(matches!(change, ParameterChange::Unchanged));

    let change = service.apply_parameters(3, 1).expect("store lists games");
    let ParameterChange::Rebuild(job) = change else {
        panic!("lower threshold needs a rebuild");
    };
    service
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");
    assert_eq!(frequency(&published(&service), &["e4", "e5", "Nf3"]), Some(1));
}

#[test]
fn reprune_supersedes_a_build_in_flight() {
    let mut service = service(two_games());
    let job = service.rebuild(2, 1).expect("store lists games");
    service
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    let mut in_flight = service.rebuild(2, 1).expect("store lists games");
    let change = service.apply_parameters(1, 1).expect("store lists games");
    assert!(matches!(change, ParameterChange::Repruned));

    let finished = finish(&mut in_flight);
    let publication = service.complete(finished).expect("complete succeeds");
    assert!(matches!(publication, Publication::Discarded { .. }));
    assert_eq!(published(&service).node_count(), 2);
}

#[test]
fn load_reuses_or_reprunes_the_persisted_tree() {
    let mut first = service(two_games());
    let job = first.rebuild(2, 1).expect("store lists games");
    first
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");
    let bytes = first
        .slot()
        .load()
        .expect("memory slot")
        .expect("build was persisted");

    let mut second =
        OpeningTreeService::new(two_games(), MemorySlot::with_bytes(bytes.clone()), small_chunks());
    let outcome = second.load(2, 1).expect("load succeeds");
    assert!(matches!(outcome, LoadOutcome::Reused));
    assert_eq!(*published(&second), *published(&first));

    let mut third =
        OpeningTreeService::new(two_games(), MemorySlot::with_bytes(bytes), small_chunks());
    let outcome = third.load(1, 1).expect("load succeeds");
    assert!(matches!(outcome, LoadOutcome::Repruned));
    assert_eq!(published(&third).node_count(), 2);
}

#[test]
fn load_rebuilds_when_games_were_added() {
    let mut first = service(two_games());
    let job = first.rebuild(2, 1).expect("store lists games");
    first
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");
    let bytes = first
        .slot()
        .load()
        .expect("memory slot")
        .expect("build was persisted");

    let mut games = two_games();
    games.push(record("g3", "d2d4"));
    let mut second = OpeningTreeService::new(games, MemorySlot::with_bytes(bytes), small_chunks());
    let outcome = second.load(2, 1).expect("load succeeds");

    let LoadOutcome::Rebuild(job) = outcome else {
        panic!("game count changed");
    };
    assert_eq!(job.total(), 3);
    assert!(second.current_tree().is_none());
}

#[test]
fn corrupt_payload_is_cleared_and_rebuilt() {
    let mut service = OpeningTreeService::new(
        two_games(),
        MemorySlot::with_bytes(b"{ not json".to_vec()),
        small_chunks(),
    );

    let outcome = service.load(2, 1).expect("load succeeds");
    assert!(matches!(outcome, LoadOutcome::Rebuild(_)));
    assert_eq!(service.slot().load().expect("memory slot"), None);
}

#[test]
fn payload_with_mismatched_depth_is_cleared_and_rebuilt() {
    let mut tree = VariationTree::new(2);
    tree.extend(&two_games(), &CoordinateEngine);
    let bytes = encode(&tree, &TreeMetadata::new(2, 10, 1)).expect("encode succeeds");

    let mut service =
        OpeningTreeService::new(two_games(), MemorySlot::with_bytes(bytes), small_chunks());
    let outcome = service.load(10, 1).expect("load succeeds");

    let LoadOutcome::Rebuild(job) = outcome else {
        panic!("a depth 2 tree cannot serve depth 10");
    };
    assert_eq!(job.total(), 2);
    assert!(service.current_tree().is_none());
    assert_eq!(service.slot().load().expect("memory slot"), None);
}

#[test]
fn legacy_payload_always_rebuilds() {
    let mut tree = VariationTree::new(2);
    tree.extend(&two_games(), &CoordinateEngine);
    let bytes = encode(&tree, &TreeMetadata::legacy()).expect("encode succeeds");

    let mut service =
        OpeningTreeService::new(two_games(), MemorySlot::with_bytes(bytes), small_chunks());
    let outcome = service.load(2, 1).expect("load succeeds");

    assert!(matches!(outcome, LoadOutcome::Rebuild(_)));
}

#[test]
fn final_tree_does_not_depend_on_input_order() {
    let openings = [
        "e2e4 e7e5 g1f3",
        "e2e4 c7c5 g1f3",
        "d2d4 d7d5 c2c4",
        "d2d4 g8f6 c2c4",
        "c2c4 e7e5",
        "g1f3 d7d5",
    ];
    let games: Vec<GameRecord> = (0..40)
        .map(|idx| record(&format!("g{idx}"), openings[idx % openings.len()]))
        .collect();
    let mut shuffled = games.clone();
    shuffled.shuffle(&mut ChaCha8Rng::seed_from_u64(7));

    let mut ordered = service(games);
    let job = ordered.rebuild(3, 2).expect("store lists games");
    ordered
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    let mut scrambled = service(shuffled);
    let job = scrambled.rebuild(3, 2).expect("store lists games");
    scrambled
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    assert_eq!(*published(&ordered), *published(&scrambled));
}

#[test]
fn configured_parameters_drive_default_build_and_load() {
    let games = vec![
        record("g1", "e2e4 e7e5 g1f3"),
        record("g2", "e2e4 e7e5 b1c3"),
        record("g3", "d2d4"),
    ];
    let config = BuildConfig {
        max_depth: 2,
        min_games: 2,
        ..small_chunks()
    };
    let mut first = OpeningTreeService::new(games.clone(), MemorySlot::new(), config.clone());
    let job = first.rebuild_default().expect("store lists games");
    first
        .run(job, &CoordinateEngine, |_| {})
        .expect("build completes");

    let tree = published(&first);
    assert_eq!(tree.max_depth(), 2);
    assert_eq!(frequency(&tree, &["e4", "e5"]), Some(2));
    assert_eq!(frequency(&tree, &["d4"]), None);
    let metadata = first.current_metadata().expect("metadata is published");
    assert_eq!((metadata.max_depth, metadata.min_games), (Some(2), Some(2)));

    let bytes = first
        .slot()
        .load()
        .expect("memory slot")
        .expect("build was persisted");
    let mut second = OpeningTreeService::new(games, MemorySlot::with_bytes(bytes), config);
    let outcome = second.load_default().expect("load succeeds");
    assert!(matches!(outcome, LoadOutcome::Reused));
    assert_eq!(*published(&second), *tree);
}
