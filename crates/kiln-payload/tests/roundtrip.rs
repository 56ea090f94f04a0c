//! Property tests for payload token round-trips.

use kiln_model::AnnotatedTest;
use kiln_payload::{decode, encode};
use proptest::prelude::*;

fn record_strategy() -> impl Strategy<Value = AnnotatedTest> {
    (
        "test/[a-z_]{1,12}\\.c",
        prop::collection::vec("\\PC{0,12}", 0..6),
        any::<i64>(),
        prop::collection::vec("[^\n]{0,24}", 0..5),
        any::<bool>(),
    )
        .prop_map(|(path, run_args, code, lines, enabled)| AnnotatedTest {
            path,
            run_args,
            expected_return_code: code,
            expected_text: lines.iter().map(|l| format!("{l}\n")).collect(),
            enabled,
        })
}

proptest! {
    #[test]
    fn decode_inverts_encode(record in record_strategy()) {
        let token = encode(&record).unwrap();
        prop_assert!(!token.contains('\n'));
        prop_assert!(token.is_ascii());
        prop_assert_eq!(decode(&token).unwrap(), record);
    }

    #[test]
    fn arbitrary_text_survives(text in any::<String>(), code in any::<i64>()) {
        let mut record = AnnotatedTest::new("test/any.c");
        record.expected_text = text;
        record.expected_return_code = code;
        let token = encode(&record).unwrap();
        prop_assert_eq!(decode(&token).unwrap(), record);
    }
}

#[test]
fn signal_derived_and_out_of_range_codes() {
    for code in [-11, -6, 255, 256, i64::from(i32::MIN) - 1, i64::MAX] {
        let mut record = AnnotatedTest::new("test/crash.c");
        record.expected_return_code = code;
        let token = encode(&record).unwrap();
        assert_eq!(decode(&token).unwrap().expected_return_code, code);
    }
}
