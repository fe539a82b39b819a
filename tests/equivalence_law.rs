//! Property tests: for every stored track, the in-memory matcher accepts it
//! exactly when SQLite returns it for the same filter.

mod common;

use common::*;
use proptest::prelude::*;
use sift::prelude::*;
use tokio::runtime::Runtime;

fn title_value() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        1 => Just(None),
        4 => "[ab]{0,4}".prop_map(Some),
    ]
}

/// Reals whose `%.15g` text uses an exponent or rounds to 15 digits.
const AWKWARD_REALS: [f64; 10] = [
    0.00001,
    -0.000025,
    1.5e-7,
    1e15,
    1e20,
    -2.5e21,
    0.1 + 0.2,
    1.0 / 3.0,
    123456789012345.6,
    1e-300,
];

fn awkward_real() -> impl Strategy<Value = f64> {
    prop::sample::select(AWKWARD_REALS.to_vec())
}

fn length_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
        6 => (-10i32..10).prop_map(|n| Some(f64::from(n) / 2.0)),
        3 => awkward_real().prop_map(Some),
    ]
}

fn year_value() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![1 => Just(None), 4 => (-12i64..12).prop_map(Some)]
}

fn tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec((title_value(), length_value(), year_value()), 0..12).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (title, length, year))| Track {
                    id: i as i64,
                    title,
                    length,
                    year,
                })
                .collect()
        },
    )
}

fn operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(Operator::ALL.to_vec())
}

fn comparison() -> impl Strategy<Value = Filter<Track>> {
    prop_oneof![
        (operator(), "[ab]{0,3}")
            .prop_map(|(op, s)| Filter::compare(&TITLE, op, s).unwrap()),
        (operator(), -10i32..10)
            .prop_map(|(op, n)| Filter::compare(&LENGTH, op, f64::from(n) / 2.0).unwrap()),
        (operator(), awkward_real())
            .prop_map(|(op, v)| Filter::compare(&LENGTH, op, v).unwrap()),
        (operator(), -5i64..5).prop_map(|(op, n)| Filter::compare(&LENGTH, op, n).unwrap()),
        (operator(), -12i64..12).prop_map(|(op, n)| Filter::compare(&YEAR, op, n).unwrap()),
    ]
}

fn filter() -> impl Strategy<Value = Filter<Track>> {
    comparison().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|children| Filter::and(children)),
            inner.prop_map(|child| Filter::not(child)),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matcher_agrees_with_sqlite(tracks in tracks(), filter in filter()) {
        let rt = Runtime::new().unwrap();
        let stored = rt.block_on(async {
            let backend = backend_with(&tracks).await;
            stored_ids(&backend, &filter).await
        });
        prop_assert_eq!(matched_ids(&tracks, &filter), stored);
    }

    #[test]
    fn get_agrees_with_matches(tracks in tracks(), filter in filter()) {
        let query = Query::new(Ids, filter);
        for track in &tracks {
            prop_assert_eq!(query.get(track).is_some(), query.matches(track));
        }
    }

    #[test]
    fn negation_is_complement(tracks in tracks(), filter in filter()) {
        let negated = Filter::not(filter.clone());
        for track in &tracks {
            prop_assert_ne!(filter.matches(track), negated.matches(track));
        }
    }
}

#[test]
fn awkward_reals_agree_under_every_operator() {
    let tracks: Vec<Track> = AWKWARD_REALS
        .iter()
        .enumerate()
        .map(|(i, v)| Track::new(i as i64, "a", Some(*v), None))
        .collect();
    let rt = Runtime::new().unwrap();
    let backend = rt.block_on(backend_with(&tracks));

    for literal in AWKWARD_REALS {
        for op in Operator::ALL {
            let filter = Filter::compare(&LENGTH, op, literal).unwrap();
            let stored = rt.block_on(stored_ids(&backend, &filter));
            assert_eq!(matched_ids(&tracks, &filter), stored, "{filter}");
        }
    }
}
