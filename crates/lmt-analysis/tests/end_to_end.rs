use lmt_analysis::{
    batch::Trial,
    exclusion::Exclusion,
    heading::{HeadingCollector, HeadingConfig},
    occupancy::{OccupancyAnalysis, OccupancyConfig},
    role::{RoleAssignment, RoleSelection, RoleTable},
    transition::{TransitionAggregator, TransitionConfig},
    zone::{Zone, ZoneId, ZoneRegistry},
};
use lmt_table::{
    BinningConfig, Detection, EventJoinConfig, EventLog, IdentityMap, Tag, TimeBinner,
    WideTable, WideTableBuilder,
};

const PRESS_MS: i64 = 1_000_000;
const EVENT_LOG: &str = "id_lever;lever;01-01-1970 00:16:40:000;101\n\
                         door;door;01-01-1970 00:16:41:000;102\n";

fn zones() -> ZoneRegistry {
    ZoneRegistry::new(vec![
        Zone::new("A", (0.0, 0.0), (10.0, 10.0)),
        Zone::new("B", (20.0, 0.0), (30.0, 10.0)),
    ])
    .unwrap()
}

/// X presses the lever at `PRESS_MS`. Y walks from A to B, Z from B to A.
fn build_table() -> WideTable {
    let before = PRESS_MS - 5_000 + 30;
    let after = PRESS_MS + 3_000 + 10;
    let detections = vec![
        Detection::new(1, 1, PRESS_MS).with_mass(15.0, 15.0),
        Detection::new(0, 2, before).with_mass(5.0, 5.0),
        Detection::new(2, 2, after).with_mass(25.0, 5.0),
        Detection::new(0, 3, before).with_mass(25.0, 5.0),
        Detection::new(2, 3, after).with_mass(5.0, 5.0),
    ];
    let identities = [(1, "101"), (2, "102"), (3, "103")]
        .into_iter()
        .map(|(id, raw)| (id, Tag::zero_padded(raw, 12)))
        .collect::<IdentityMap>();

    let binner = TimeBinner::new(BinningConfig::default()).unwrap();
    let mut table = WideTableBuilder::new()
        .with_identities(identities)
        .build(&binner.bin(&detections))
        .unwrap();

    let config = EventJoinConfig::default();
    let events = EventLog::parse(EVENT_LOG).events(&config);
    let report = table.attach_events(&events, config.tolerance_ms).unwrap();
    assert_eq!(report.matched, 1);
    table
}

#[test]
fn transition_from_detections_to_summary() {
    let table = build_table();
    let timestamps = table
        .rows()
        .iter()
        .map(|row| row.timestamp_ms)
        .collect::<Vec<_>>();
    assert_eq!(timestamps, [PRESS_MS - 5_000, PRESS_MS, PRESS_MS + 3_000]);

    let zones = zones();
    let config = TransitionConfig {
        source_zones: vec![ZoneId::new("A")],
        ..TransitionConfig::default()
    };
    let roles = RoleAssignment::Positional(vec!["1".to_owned(), "3".to_owned()]);
    let aggregator = TransitionAggregator::new(config, &zones, roles).unwrap();
    let outcome = aggregator.run(&[
        Trial::new("first", table.clone()),
        Trial::new("second", table),
    ]);

    // Y transitioned A -> B in both trials; Z never started in a source zone
    assert_eq!(outcome.by_role["1"], [true, true]);
    assert!(outcome.by_role["3"].is_empty());
    assert_eq!(outcome.exclusions.count(Exclusion::OutsideSourceZone), 2);
    assert_eq!(outcome.samples[1].trial, "second");

    let summary = outcome.summary();
    assert_eq!(summary.by_role["1"].percentage, 100.0);
    assert_eq!(summary.by_role["1"].ci95, 0.0);
    assert!(summary.by_role["3"].insufficient_data);
}

#[test]
fn occupancy_with_role_table() {
    let table = build_table();
    let roles = RoleTable::from_csv(
        "ID_Animal,rank\n\"101\",\"1\"\n\"102\",\"1\"\n\"103\",\"2\"\n",
        3,
    )
    .unwrap();

    let zones = zones();
    let config = OccupancyConfig {
        post_ms: 3_000,
        ..OccupancyConfig::default()
    };
    let analysis = OccupancyAnalysis::new(config, &zones).unwrap();
    let report = analysis
        .run(&[Trial::new("t", table)], &roles, &RoleSelection::new(["1"]))
        .unwrap();

    assert_eq!(report.events, 1);
    assert_eq!(report.pre.counts, [1, 0]);
    assert_eq!(report.post.counts, [0, 1]);
    // X sits outside every zone in the press row
    assert_eq!(report.baseline_exclusions.count(Exclusion::OutsideZone), 1);
    assert!(!report.insufficient_data);
}

#[test]
fn heading_snapshots_need_a_direction() {
    let table = build_table();
    let collector = HeadingCollector::new(HeadingConfig::default()).unwrap();
    let snapshots = collector.run(&[Trial::new("t", table)]).unwrap();
    // No back or front points were tracked, so no heading is known
    assert!(snapshots.samples.is_empty());
    assert_eq!(snapshots.exclusions.count(Exclusion::MissingCoordinate), 6);
}

#[test]
fn wide_table_csv_header() {
    let table = build_table();
    let mut csv = Vec::new();
    table.write_csv(&mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("FORMATTED_TIME,TIMESTAMP,MASS_X_000000000101,"));
    assert!(header.ends_with(",LEVER_PRESS"));
}
