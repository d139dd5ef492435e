mod common;

use common::{init_logging, manual_source, site, RecordingBackend, SharedBuffer};
use duplicate_queries::{
    detect_duplicate_queries, Connection, DetectOptions, DuplicateDetector, QueryError, StackFrame,
    StackSnapshot,
};
use pretty_assertions::assert_eq;

fn options(buffer: &SharedBuffer) -> DetectOptions {
    DetectOptions::new().with_color(false).with_output(buffer.clone())
}

#[test]
fn test_scenario_a_single_execution() {
    init_logging();
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();
    let source = manual_source(site("shop::views::index", 10));

    detect_duplicate_queries(&connection, options(&buffer).with_stack_source(source), |detector| {
        connection.execute("SELECT 1", &[])?;
        assert!(!detector.has_duplicates());
        Ok::<_, QueryError>(())
    })
    .unwrap();

    assert_eq!(buffer.contents(), "");
}

#[test]
fn test_scenario_b_same_site_twice() {
    init_logging();
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();
    let source = manual_source(site("shop::views::index", 10));

    detect_duplicate_queries(&connection, options(&buffer).with_stack_source(source), |detector| {
        connection.execute("SELECT 1", &[])?;
        connection.execute("SELECT 1", &[])?;

        assert!(detector.has_duplicates());
        assert_eq!(detector.registry().len(), 1);
        assert_eq!(detector.registry().repeat_count(0), Some(1));
        Ok::<_, QueryError>(())
    })
    .unwrap();

    assert!(buffer.contents().contains("^^ The above query was executed 2 times ^^"));
}

#[test]
fn test_scenario_c_different_sites() {
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();
    let source = manual_source(site("shop::views::index", 10));
    let options = options(&buffer).with_stack_source(source.clone());

    detect_duplicate_queries(&connection, options, |detector| {
        connection.execute("SELECT 1", &[])?;
        source.set(site("shop::views::detail", 20));
        connection.execute("SELECT 1", &[])?;

        assert!(!detector.has_duplicates());
        assert_eq!(detector.registry().len(), 2);
        Ok::<_, QueryError>(())
    })
    .unwrap();

    assert_eq!(buffer.contents(), "");
}

#[test]
fn test_different_sql_same_site() {
    let connection = Connection::new(RecordingBackend::default());
    let source = manual_source(site("shop::views::index", 10));
    let options = options(&SharedBuffer::default()).with_stack_source(source);

    let has_duplicates = detect_duplicate_queries(&connection, options, |detector| {
        connection.execute("SELECT 1", &[])?;
        connection.execute("SELECT 2", &[])?;
        Ok::<_, QueryError>(detector.has_duplicates())
    })
    .unwrap();

    assert!(!has_duplicates);
}

#[test]
fn test_parameters_do_not_affect_identity() {
    let connection = Connection::new(RecordingBackend::default());
    let source = manual_source(site("shop::views::index", 10));
    let options = options(&SharedBuffer::default()).with_stack_source(source);

    let executions = detect_duplicate_queries(&connection, options, |detector| {
        for id in 1..=4i64 {
            connection.execute("SELECT * FROM author WHERE id = ?1", &[id.into()])?;
        }
        connection.execute_many("SELECT * FROM author WHERE id = ?1", &[vec![5i64.into()]])?;
        Ok::<_, QueryError>(detector.total_executions())
    })
    .unwrap();

    assert_eq!(executions, 5);
}

#[test]
fn test_repeat_counters_are_occurrences_minus_one() {
    let connection = Connection::new(RecordingBackend::default());
    let source = manual_source(site("shop::views::index", 10));
    let options = options(&SharedBuffer::default()).with_stack_source(source.clone());

    detect_duplicate_queries(&connection, options, |detector| {
        for _ in 0..3 {
            connection.execute("SELECT a", &[])?;
        }
        source.set(site("shop::views::detail", 20));
        for _ in 0..5 {
            connection.execute("SELECT b", &[])?;
        }
        connection.execute("SELECT c", &[])?;

        let registry = detector.registry();
        assert_eq!(registry.repeat_count(0), Some(2));
        assert_eq!(registry.repeat_count(1), Some(4));
        assert_eq!(registry.repeat_count(2), None);
        assert_eq!(registry.total_executions(), 8);
        Ok::<_, QueryError>(())
    })
    .unwrap();
}

#[test]
fn test_report_follows_first_seen_order() {
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();
    let source = manual_source(site("shop::views::index", 10));
    let options = options(&buffer).with_stack_source(source.clone());

    detect_duplicate_queries(&connection, options, |_| {
        connection.execute("SELECT first", &[])?;
        source.set(site("shop::views::detail", 20));
        connection.execute("SELECT second", &[])?;
        connection.execute("SELECT second", &[])?;
        source.set(site("shop::views::index", 10));
        connection.execute("SELECT first", &[])?;
        Ok::<_, QueryError>(())
    })
    .unwrap();

    let text = buffer.contents();
    let first = text.find("SQL: SELECT first").unwrap();
    let second = text.find("SQL: SELECT second").unwrap();
    assert!(first < second);
    assert!(text.ends_with("Total of 2 duplicate queries (4 executions)\n"));
}

#[test]
fn test_full_text_report() {
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();
    let source = manual_source(site("shop::views::index", 10));

    detect_duplicate_queries(&connection, options(&buffer).with_stack_source(source), |_| {
        connection.execute("SELECT 1", &[])?;
        connection.execute("SELECT 1", &[])?;
        connection.execute("SELECT 1", &[])?;
        Ok::<_, QueryError>(())
    })
    .unwrap();

    let expected = "
Duplicate queries detected!
  .
  File \"src/main.rs\", line 12, in shop::main
  .
  File \"src/views.rs\", line 10, in shop::views::index
  SQL: SELECT 1

^^ The above query was executed 3 times ^^

Total of 1 duplicate queries (3 executions)
";
    assert_eq!(buffer.contents(), expected);
}

#[test]
fn test_native_stack_same_line_in_loop_is_duplicate() {
    init_logging();
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();

    detect_duplicate_queries(&connection, options(&buffer), |detector| {
        for _ in 0..2 {
            connection.execute("SELECT 1", &[])?;
        }
        assert!(detector.has_duplicates());
        Ok::<_, QueryError>(())
    })
    .unwrap();

    let text = buffer.contents();
    assert!(text.contains("detector_tests.rs"));
    assert!(text.contains("executed 2 times"));
}

#[test]
fn test_native_stack_separate_lines_are_not_duplicates() {
    let connection = Connection::new(RecordingBackend::default());
    let buffer = SharedBuffer::default();

    detect_duplicate_queries(&connection, options(&buffer), |detector| {
        connection.execute("SELECT 1", &[])?;
        connection.execute("SELECT 1", &[])?;
        assert!(!detector.has_duplicates());
        Ok::<_, QueryError>(())
    })
    .unwrap();

    assert_eq!(buffer.contents(), "");
}

#[test]
fn test_detector_used_directly_as_wrapper() {
    let connection = Connection::new(RecordingBackend::default());
    let detector = std::rc::Rc::new(DuplicateDetector::with_source(manual_source(site("shop::jobs::run", 5))));

    {
        let _handle = connection.execute_wrapper(detector.clone());
        connection.execute("SELECT 1", &[]).unwrap();
        connection.execute("SELECT 1", &[]).unwrap();
    }
    connection.execute("SELECT 1", &[]).unwrap();

    assert_eq!(detector.total_executions(), 2);
    assert_eq!(connection.with_backend(|backend| backend.executed.len()).unwrap(), 3);
}

#[test]
fn test_unresolved_call_sites_are_told_apart_by_address() {
    let unresolved = |address| {
        StackSnapshot::from_frames(vec![
            StackFrame::new("<unknown>", 0).with_address(0x4000),
            StackFrame::new("<unknown>", 0).with_address(address),
        ])
    };
    let connection = Connection::new(RecordingBackend::default());
    let source = manual_source(unresolved(0x5010));
    let options = options(&SharedBuffer::default()).with_stack_source(source.clone());

    detect_duplicate_queries(&connection, options, |detector| {
        connection.execute("SELECT 1", &[])?;
        source.set(unresolved(0x5074));
        connection.execute("SELECT 1", &[])?;
        assert!(!detector.has_duplicates());

        connection.execute("SELECT 1", &[])?;
        assert!(detector.has_duplicates());
        Ok::<_, QueryError>(())
    })
    .unwrap();
}
