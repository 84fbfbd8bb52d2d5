use hierbenches::schema::{
    FlattenedRow, LtreePlayerRow, LtreeRecordRow, LtreeRelationRow, PlayerRow, RecordRow,
    RelationRow, TableRow, ALL_TABLES,
};
use hierbenches::{
    run, BalanceMode, Error, Generator, GeneratorConfig, Level, MemoryStore, NodePath, Phase,
    Phases, RowCounts, StoreError,
};
use std::collections::{HashMap, HashSet};

fn config(shape: [usize; 5], batch_size: usize) -> GeneratorConfig {
    let [companies, subsystems, web_ids, players, records] = shape;
    GeneratorConfig::builder()
        .companies(companies)
        .subsystems_per_company(subsystems)
        .web_ids_per_subsystem(web_ids)
        .players_per_web_id(players)
        .records_per_player(records)
        .batch_size(batch_size)
        .build()
        .unwrap()
}

fn count_level(store: &MemoryStore, table: &str, level: i32) -> usize {
    store
        .rows(table)
        .iter()
        .filter(|row| row.int("level") == Some(level))
        .count()
}

#[tokio::test]
async fn small_tree_end_to_end() {
    let config = config([2, 1, 1, 2, 3], 2000);
    let mut store = MemoryStore::new();
    let summary = run(&config, &mut store).await.unwrap();

    for table in [RelationRow::TABLE, LtreeRelationRow::TABLE] {
        assert_eq!(count_level(&store, table, 0), 1, "{table}");
        assert_eq!(count_level(&store, table, 1), 2, "{table}");
        assert_eq!(count_level(&store, table, 2), 2, "{table}");
        assert_eq!(count_level(&store, table, 3), 2, "{table}");
    }
    assert_eq!(store.row_count(PlayerRow::TABLE), 4);
    assert_eq!(store.row_count(LtreePlayerRow::TABLE), 4);
    assert_eq!(store.row_count(RecordRow::TABLE), 12);
    assert_eq!(store.row_count(LtreeRecordRow::TABLE), 12);
    assert_eq!(store.row_count(FlattenedRow::TABLE), 12);

    let mut combinations: HashMap<(String, String, String, String), usize> = HashMap::new();
    for row in store.rows(FlattenedRow::TABLE) {
        assert_eq!(row.int("balance"), Some(10));
        let key = (
            row.text("company").unwrap().to_string(),
            row.text("sub_system").unwrap().to_string(),
            row.text("web_id").unwrap().to_string(),
            row.text("player_name").unwrap().to_string(),
        );
        *combinations.entry(key).or_default() += 1;
    }
    let expected: HashMap<_, _> = [
        ("Company1", "Player1_1_1_1"),
        ("Company1", "Player1_1_1_2"),
        ("Company2", "Player2_1_1_1"),
        ("Company2", "Player2_1_1_2"),
    ]
    .into_iter()
    .map(|(company, player)| {
        (
            (
                company.to_string(),
                "Subsystem1".to_string(),
                "WebId1".to_string(),
                player.to_string(),
            ),
            3,
        )
    })
    .collect();
    assert_eq!(combinations, expected);

    let expected_counts = RowCounts::expected(&config.shape);
    for phase in [Phase::Flattened, Phase::Adjacency, Phase::MaterializedPath] {
        assert_eq!(summary.phase(phase).unwrap().counts, expected_counts, "{phase}");
    }
    assert!(summary.phase(Phase::Clear).is_some());
}

fn assert_parent_links(store: &MemoryStore) {
    let nodes: HashMap<i32, (i32, i32)> = store
        .rows(RelationRow::TABLE)
        .iter()
        .map(|row| (row.id, (row.int("parent_id").unwrap(), row.int("level").unwrap())))
        .collect();
    for (id, (parent_id, level)) in &nodes {
        if *level == 0 {
            assert_eq!(*parent_id, 0);
            continue;
        }
        let (_, parent_level) = nodes[parent_id];
        assert_eq!(parent_level, level - 1, "node {id}");
        assert!(parent_id < id, "parent {parent_id} inserted after child {id}");
    }

    let players: HashMap<i32, i32> = store
        .rows(PlayerRow::TABLE)
        .iter()
        .map(|row| (row.id, row.int("relation_id").unwrap()))
        .collect();
    for web_id in players.values() {
        assert_eq!(nodes[web_id].1, 3);
    }
    for record in store.rows(RecordRow::TABLE) {
        let player_id = record.int("player_id").unwrap();
        assert_eq!(Some(&record.int("relation_id").unwrap()), players.get(&player_id));
    }
}

fn assert_paths_well_formed(store: &MemoryStore) {
    let nodes = store.rows(LtreeRelationRow::TABLE);
    let by_path: HashMap<&NodePath, (i32, i32)> = nodes
        .iter()
        .map(|row| (row.path("path").unwrap(), (row.id, row.int("level").unwrap())))
        .collect();
    assert_eq!(by_path.len(), nodes.len(), "paths are not unique");

    for (path, (id, level)) in &by_path {
        assert_eq!(path.last(), *id);
        assert_eq!(path.depth() as i32, *level);
        if *level > 0 {
            let parent = path.parent().unwrap();
            let (_, parent_level) = by_path[&parent];
            assert_eq!(parent_level, level - 1);
            assert_eq!(&parent.child(*id), *path);
        }
    }

    let segments: HashSet<i32> = nodes.iter().map(|row| row.path("path").unwrap().last()).collect();
    assert_eq!(segments.len(), nodes.len());

    let web_id_paths: HashMap<i32, &NodePath> = nodes
        .iter()
        .filter(|row| row.int("level") == Some(3))
        .map(|row| (row.id, row.path("path").unwrap()))
        .collect();
    let players: HashMap<i32, i32> = store
        .rows(LtreePlayerRow::TABLE)
        .iter()
        .map(|row| (row.id, row.int("relation_id").unwrap()))
        .collect();
    for record in store.rows(LtreeRecordRow::TABLE) {
        let web_id = players[&record.int("player_id").unwrap()];
        assert_eq!(record.path("path"), Some(web_id_paths[&web_id]));
    }
}

#[tokio::test]
async fn adjacency_rows_reference_inserted_parents() {
    let config = config([3, 2, 2, 2, 2], 3);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    assert_parent_links(&store);
}

#[tokio::test]
async fn paths_extend_their_parent_by_one_segment() {
    let config = config([3, 2, 3, 2, 1], 4);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    assert_paths_well_formed(&store);
}

#[tokio::test]
async fn node_levels_wider_than_a_batch_span_several_requests() {
    let config = config([5, 3, 1, 1, 1], 2);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    assert_parent_links(&store);
    assert_paths_well_formed(&store);

    // root, then ceil(5/2) company chunks, ceil(3/2) per company, one per subsystem
    let node_requests = 1 + 3 + 5 * 2 + 15;
    for table in [RelationRow::TABLE, LtreeRelationRow::TABLE] {
        assert_eq!(count_level(&store, table, 1), 5, "{table}");
        assert_eq!(count_level(&store, table, 2), 15, "{table}");
        assert_eq!(count_level(&store, table, 3), 15, "{table}");
        assert_eq!(store.requests(table), node_requests, "{table}");
    }
}

#[tokio::test]
async fn renumbered_path_nodes_are_reported() {
    let config = GeneratorConfig::builder()
        .companies(2)
        .subsystems_per_company(1)
        .web_ids_per_subsystem(1)
        .players_per_web_id(1)
        .records_per_player(1)
        .phases(Phases::parse("path").unwrap())
        .build()
        .unwrap();
    let mut store = MemoryStore::new();
    store.ignore_explicit_ids(LtreeRelationRow::TABLE);

    let err = run(&config, &mut store).await.unwrap_err();
    assert_eq!(err.location(), Some((Phase::MaterializedPath, Level::Company)));
    // ids 3 and 4 were allocated, the store handed out 5 and 6
    assert!(matches!(
        err,
        Error::Store {
            source: StoreError::IdentityMismatch {
                expected: 3,
                returned: 5,
                ..
            },
            ..
        }
    ));
    assert_eq!(store.row_count(LtreePlayerRow::TABLE), 0);
}

#[tokio::test]
async fn first_company_paths_match_sequential_identities() {
    let config = config([2, 1, 1, 1, 1], 10);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    let paths: Vec<String> = store
        .rows(LtreeRelationRow::TABLE)
        .iter()
        .map(|row| row.path("path").unwrap().to_string())
        .collect();
    assert_eq!(paths, ["1", "1.2", "1.3", "1.2.4", "1.2.4.5", "1.3.6", "1.3.6.7"]);
}

#[tokio::test]
async fn player_names_are_unique_across_a_run() {
    let config = config([3, 3, 2, 4, 1], 5);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    for table in [PlayerRow::TABLE, LtreePlayerRow::TABLE] {
        let names: HashSet<&str> = store
            .rows(table)
            .iter()
            .map(|row| row.text("player_name").unwrap())
            .collect();
        assert_eq!(names.len(), config.shape.players(), "{table}");
        assert_eq!(store.row_count(table), config.shape.players(), "{table}");
    }
}

#[tokio::test]
async fn record_counts_are_conserved_for_every_encoding() {
    let config = config([2, 3, 2, 3, 5], 7);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    let records = 2 * 3 * 2 * 3 * 5;
    assert_eq!(store.row_count(FlattenedRow::TABLE), records);
    assert_eq!(store.row_count(RecordRow::TABLE), records);
    assert_eq!(store.row_count(LtreeRecordRow::TABLE), records);

    // flattened rows are partitioned across the whole table, not per web id
    assert_eq!(store.requests(FlattenedRow::TABLE), (records + 6) / 7);
}

#[tokio::test]
async fn clear_twice_leaves_only_the_roots() {
    let config = config([2, 2, 1, 1, 1], 100);
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    let mut generator = Generator::new(&mut store, &config);
    generator.clear().await.unwrap();
    generator.clear().await.unwrap();

    for table in ALL_TABLES {
        let expected = match *table {
            RelationRow::TABLE | LtreeRelationRow::TABLE => 1,
            _ => 0,
        };
        assert_eq!(store.row_count(table), expected, "{table}");
    }
    let root = &store.rows(LtreeRelationRow::TABLE)[0];
    assert_eq!(root.text("name"), Some("all"));
    assert_eq!(root.path("path").map(ToString::to_string), Some("1".to_string()));
    assert_eq!(store.rows(RelationRow::TABLE)[0].int("parent_id"), Some(0));
}

#[tokio::test]
async fn generating_before_clear_reports_missing_root() {
    let config = config([1, 1, 1, 1, 1], 10);
    let mut store = MemoryStore::new();
    let mut generator = Generator::new(&mut store, &config);

    let err = generator.adjacency().await.unwrap_err();
    assert_eq!(err.location(), Some((Phase::Adjacency, Level::Root)));
    assert!(matches!(
        err,
        Error::Store {
            source: StoreError::MissingRoot { .. },
            ..
        }
    ));

    let err = generator.materialized_path().await.unwrap_err();
    assert_eq!(err.location(), Some((Phase::MaterializedPath, Level::Root)));
}

#[tokio::test]
async fn insert_failure_names_phase_and_level() {
    let config = config([2, 1, 1, 2, 2], 10);
    let mut store = MemoryStore::new();
    store.reject_inserts_into(LtreePlayerRow::TABLE);

    let err = run(&config, &mut store).await.unwrap_err();
    assert_eq!(err.location(), Some((Phase::MaterializedPath, Level::Player)));
    assert!(err.to_string().starts_with("materialized-path phase failed at player level"));

    // earlier phases completed, the failing level wrote nothing
    assert_eq!(store.row_count(RecordRow::TABLE), 8);
    assert_eq!(store.row_count(LtreePlayerRow::TABLE), 0);
    assert_eq!(store.row_count(LtreeRecordRow::TABLE), 0);
}

#[tokio::test]
async fn random_balances_stay_in_range() {
    let config = GeneratorConfig::builder()
        .companies(1)
        .subsystems_per_company(2)
        .web_ids_per_subsystem(2)
        .players_per_web_id(5)
        .records_per_player(10)
        .balance(BalanceMode::Random { min: 1, max: 9_999 })
        .balance_seed(42)
        .build()
        .unwrap();
    let mut store = MemoryStore::new();
    run(&config, &mut store).await.unwrap();

    for table in [FlattenedRow::TABLE, RecordRow::TABLE, LtreeRecordRow::TABLE] {
        let balances: Vec<i32> = store
            .rows(table)
            .iter()
            .map(|row| row.int("balance").unwrap())
            .collect();
        assert_eq!(balances.len(), 200);
        assert!(balances.iter().all(|b| (1..=9_999).contains(b)), "{table}");
        assert!(balances.iter().any(|b| *b != balances[0]), "{table}");
    }
}

#[tokio::test]
async fn disabled_phases_leave_their_tables_empty() {
    let config = GeneratorConfig::builder()
        .companies(2)
        .subsystems_per_company(1)
        .web_ids_per_subsystem(1)
        .players_per_web_id(1)
        .records_per_player(1)
        .phases(Phases::parse("path").unwrap())
        .build()
        .unwrap();
    let mut store = MemoryStore::new();
    let summary = run(&config, &mut store).await.unwrap();

    assert_eq!(store.row_count(FlattenedRow::TABLE), 0);
    assert_eq!(store.row_count(RelationRow::TABLE), 1);
    assert_eq!(store.row_count(LtreeRecordRow::TABLE), 2);
    assert!(summary.phase(Phase::Adjacency).is_none());
    assert!(summary.phase(Phase::MaterializedPath).is_some());
}

#[tokio::test]
async fn empty_fanout_only_seeds_roots() {
    let config = config([0, 25, 30, 20, 40], 2000);
    let mut store = MemoryStore::new();
    let summary = run(&config, &mut store).await.unwrap();

    assert_eq!(store.row_count(RelationRow::TABLE), 1);
    assert_eq!(store.row_count(LtreeRelationRow::TABLE), 1);
    assert_eq!(store.row_count(FlattenedRow::TABLE), 0);
    assert_eq!(store.requests(FlattenedRow::TABLE), 0);
    assert_eq!(summary.phase(Phase::Adjacency).unwrap().counts, RowCounts::default());
}
