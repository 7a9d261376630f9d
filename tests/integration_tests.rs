//! Integration tests for student-pathway-rs.
//!
//! These tests run the complete pipeline: enrollment records through
//! semester assignment, sequence matrix and tensor construction, transition
//! counting and normalization, down to cohort projection.

use std::collections::BTreeSet;

use ndarray::array;
use student_pathway_rs::{
    adjacency, assign_terms, project, EnrollmentTable, Key, Normalization, Occupancy,
    PathwayError, ProjectionConfig, SequenceConfig, SequenceMatrix, SequenceTensor,
    TransitionMatrix, UnitSource,
};

/// Build a parsed enrollment table keyed on `unit_name`.
fn enrollment_table(rows: &[(i64, &str, &str)]) -> EnrollmentTable {
    let mut table = EnrollmentTable::new(["student_id", "unit_code", "unit_name", "outcome_date"]);
    for &(id, unit, date) in rows {
        let code = format!("{}101", &unit[..3].to_uppercase());
        table
            .push_row(vec![id.into(), code.into(), unit.into(), date.into()])
            .unwrap();
    }
    table.parse_dates("outcome_date", "%Y-%m-%d").unwrap();
    table
}

/// Five students, four units, no repeats.
fn five_students() -> EnrollmentTable {
    enrollment_table(&[
        (111, "Physics", "2019-06-30"),
        (111, "Chemistry", "2019-11-30"),
        (222, "Physics", "2019-11-30"),
        (222, "Chemistry", "2019-11-30"),
        (222, "Maths", "2019-06-30"),
        (333, "Physics", "2019-11-30"),
        (333, "Chemistry", "2019-11-30"),
        (333, "Maths", "2019-06-30"),
        (333, "Biology", "2019-11-30"),
        (444, "Physics", "2019-06-30"),
        (555, "Chemistry", "2020-06-30"),
        (555, "Maths", "2020-06-30"),
        (555, "Biology", "2020-11-30"),
    ])
}

/// Ten students across 2016-2017 with Maths retakes, then a fresh 2018
/// intake of four.
fn cohort_history() -> EnrollmentTable {
    let mut rows = Vec::new();
    for id in 1..=10_i64 {
        rows.push((id, "Maths", "2016-06-30"));
        if id % 3 == 0 {
            // Failed and retook Maths in the second semester.
            rows.push((id, "Maths", "2016-11-30"));
            rows.push((id, "Physics", "2017-06-30"));
        } else if id % 2 == 0 {
            rows.push((id, "Physics", "2016-11-30"));
            rows.push((id, "Mechanics", "2017-06-30"));
        } else {
            rows.push((id, "Chemistry", "2016-11-30"));
        }
    }
    for id in 11..=14_i64 {
        rows.push((id, "Maths", "2018-06-30"));
    }
    enrollment_table(&rows)
}

#[test]
fn test_sequence_matrix_fixture() {
    let seq = SequenceMatrix::build(&five_students(), &SequenceConfig::by_unit_name()).unwrap();

    assert_eq!(seq.shape(), (5, 4));
    assert_eq!(
        seq.students(),
        &[
            Key::from(111),
            Key::from(222),
            Key::from(333),
            Key::from(444),
            Key::from(555)
        ]
    );
    assert_eq!(
        seq.units(),
        &[
            Key::from("Physics"),
            Key::from("Chemistry"),
            Key::from("Maths"),
            Key::from("Biology")
        ]
    );
    assert_eq!(
        seq.matrix(),
        &array![
            [1, 2, 0, 0],
            [2, 2, 1, 0],
            [2, 2, 1, 2],
            [1, 0, 0, 0],
            [0, 1, 1, 2]
        ]
    );
}

#[test]
fn test_adjacency_fixture() {
    let seq = SequenceMatrix::build(&five_students(), &SequenceConfig::by_unit_name()).unwrap();
    let transitions = TransitionMatrix::from_sequence(&seq);

    assert_eq!(transitions.counts().dim(), (4, 4));
    assert_eq!(transitions.counts().row(0).to_vec(), vec![0, 1, 0, 0]);
    assert_eq!(transitions.units(), seq.units());

    let p = transitions.probabilities(Normalization::BySource);
    let q = transitions.probabilities(Normalization::Global);
    assert!((p[[0, 1]] - 0.25).abs() < 1e-2);
    assert!((q[[0, 1]] - 0.2).abs() < 1e-2);
    for (&actual, expected) in q.row(2).iter().zip([0.4, 0.4, 0.0, 0.4]) {
        assert!((actual - expected).abs() < 1e-2);
    }
}

#[test]
fn test_matrix_cells_are_bounded_and_non_negative() {
    let seq = SequenceMatrix::build(&cohort_history(), &SequenceConfig::by_unit_name()).unwrap();
    let transitions = TransitionMatrix::from_sequence(&seq);

    for ((i, _), &count) in transitions.counts().indexed_iter() {
        assert!(count <= transitions.takers()[i]);
    }
    let p = transitions.probabilities(Normalization::BySource);
    assert!(p.iter().all(|&x| (0.0..=1.0).contains(&x)));
}

#[test]
fn test_tensor_counts_every_record() {
    let table = cohort_history();
    let tensor = SequenceTensor::build(&table, None, &SequenceConfig::by_unit_name()).unwrap();

    assert_eq!(tensor.num_layers(), 2);
    assert_eq!(tensor.shape(), (14, 4));
    assert_eq!(tensor.occurrences().sum() as usize, table.len());

    let maths = tensor
        .units()
        .iter()
        .position(|u| *u == Key::from("Maths"))
        .unwrap();
    let retakers = tensor.layers()[1].column(maths).iter().filter(|&&t| t != 0).count();
    assert_eq!(retakers, 3);
}

#[test]
fn test_tensor_transitions_include_retakes() {
    let tensor =
        SequenceTensor::build(&cohort_history(), None, &SequenceConfig::by_unit_name()).unwrap();
    let transitions = TransitionMatrix::from_tensor(&tensor);
    let units = tensor.units();
    let idx = |name: &str| units.iter().position(|u| *u == Key::from(name)).unwrap();

    let counts = transitions.counts();
    assert_eq!(counts[[idx("Maths"), idx("Maths")]], 3);
    // Evens that are not multiples of three: 2, 4, 8, 10.
    assert_eq!(counts[[idx("Maths"), idx("Physics")]], 4);
    assert_eq!(counts[[idx("Physics"), idx("Mechanics")]], 4);
    // Odds that are not multiples of three: 1, 5, 7.
    assert_eq!(counts[[idx("Maths"), idx("Chemistry")]], 3);

    let p = transitions.probabilities(Normalization::BySource);
    assert!((p[[idx("Maths"), idx("Maths")]] - 3.0 / 14.0).abs() < 1e-9);
    assert!((p[[idx("Physics"), idx("Mechanics")]] - 4.0 / 7.0).abs() < 1e-9);
}

#[test]
fn test_project_later_cohort_from_earlier_years() {
    let history = cohort_history();
    let config = SequenceConfig::by_unit_name();

    let earlier = history.between_years("outcome_date", 2016, 2017).unwrap();
    let later = history.between_years("outcome_date", 2018, 2018).unwrap();

    // Fit on the earlier window, using its units as the shared vocabulary.
    let reference_config = config.clone().with_unit_source(UnitSource::Reference);
    let trained = SequenceTensor::build(&earlier, None, &config).unwrap();
    let current = SequenceTensor::build(&later, Some(&earlier), &reference_config).unwrap();
    assert_eq!(trained.units(), current.units());

    let p = TransitionMatrix::from_tensor(&trained).probabilities(Normalization::BySource);
    let snapshot = Occupancy::latest_from_tensor(&current);
    assert_eq!(snapshot.get(&Key::from("Maths")).unwrap().len(), 4);

    let projection = project(&snapshot, p.view(), &ProjectionConfig::default()).unwrap();
    // 4 students in Maths: 4 * 3/10, 4 * 4/10 and 4 * 3/10 round to 1, 2 and 1.
    assert_eq!(projection.count(&Key::from("Maths")), 1);
    assert_eq!(projection.count(&Key::from("Physics")), 2);
    assert_eq!(projection.count(&Key::from("Chemistry")), 1);
    assert_eq!(projection.count(&Key::from("Mechanics")), 0);

    let pool: BTreeSet<Key> = (11..=14_i64).map(Key::from).collect();
    for students in projection.students().values() {
        assert!(students.is_subset(&pool));
    }
}

#[test]
fn test_projection_fixture() {
    let everyone: BTreeSet<Key> = [111, 222, 333, 444].into_iter().map(Key::from).collect();
    let snapshot = Occupancy::from_sets([
        (Key::from("P"), everyone.clone()),
        (Key::from("C"), BTreeSet::new()),
        (Key::from("M"), everyone),
        (Key::from("B"), BTreeSet::new()),
    ]);
    let p = array![
        [0.0, 0.25, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.5],
        [0.0, 0.0, 0.0, 0.0]
    ];

    for seed in [0, 1, 42, 1234] {
        let config = ProjectionConfig::default().with_seed(seed);
        let projection = project(&snapshot, p.view(), &config).unwrap();
        assert_eq!(projection.count(&Key::from("C")), 3);
        assert_eq!(projection.count(&Key::from("P")), 0);
    }
}

#[test]
fn test_edge_export_serializes() {
    let seq = SequenceMatrix::build(&five_students(), &SequenceConfig::by_unit_name()).unwrap();
    let transitions = TransitionMatrix::from_sequence(&seq);

    let edges = transitions.edges(Normalization::Global, 0.3);
    assert_eq!(edges.len(), 3);
    assert!(edges.iter().all(|e| e.source == Key::from("Maths")));

    let json = serde_json::to_string(&edges).unwrap();
    assert!(json.contains("\"source\":\"Maths\""));
    assert!(json.contains("\"target\":\"Biology\""));

    let p = transitions.probabilities(Normalization::BySource);
    let same = adjacency::edges(p.view(), seq.units(), 0.0).unwrap();
    assert_eq!(same, transitions.edges(Normalization::BySource, 0.0));
}

#[test]
fn test_single_record_student_is_first_term() {
    let table = enrollment_table(&[(9, "Physics", "2021-12-01")]);
    let seq = SequenceMatrix::build(&table, &SequenceConfig::by_unit_name()).unwrap();
    assert_eq!(seq.matrix()[[0, 0]], 1);
    assert_eq!(
        assign_terms(&[chrono::NaiveDate::from_ymd_opt(2021, 12, 1).unwrap()], 8),
        vec![1]
    );
}

#[test]
fn test_errors_surface_unchanged() {
    let table = five_students();

    let err = SequenceMatrix::build(&table, &SequenceConfig::default().with_id_header("sid"))
        .unwrap_err();
    assert!(matches!(err, PathwayError::MissingKey(col) if col == "sid"));

    let err = SequenceTensor::build(
        &table,
        None,
        &SequenceConfig::by_unit_name().with_separator_month(0),
    )
    .unwrap_err();
    assert!(matches!(err, PathwayError::InvalidConfig(_)));

    let raw = EnrollmentTable::new(["student_id", "unit_name", "outcome_date"])
        .with_row(vec![1.into(), "Physics".into(), "30/06/2019".into()])
        .unwrap();
    let err = SequenceMatrix::build(&raw, &SequenceConfig::by_unit_name()).unwrap_err();
    assert!(matches!(err, PathwayError::InvalidDateType { row: 0, .. }));
}
