use super::*;

#[test]
fn report_default_is_zero() {
    let report = MetricsReport::default();
    assert_eq!(report.items, 0);
    assert_eq!(report.concrete_trees, 0);
}

#[test]
fn attempt_success_rate() {
    let mut report = MetricsReport::default();
    assert_eq!(report.attempt_success_rate(), 1.0);

    report.concretize_attempts = 4;
    report.concretize_failures = 1;
    assert!((report.attempt_success_rate() - 0.75).abs() < 0.001);
}

#[test]
fn report_display_lists_sections() {
    let report = MetricsReport {
        items: 42,
        backtracks: 7,
        ..Default::default()
    };
    let output = format!("{}", report);
    assert!(output.contains("Items:"));
    assert!(output.contains("42"));
    assert!(output.contains("Backtracks:"));
}

#[cfg(not(feature = "tracing"))]
#[test]
fn noop_metrics_always_report_zero() {
    let metrics = Metrics::new();
    metrics.record_item();
    metrics.record_scan();
    assert_eq!(metrics.report(), MetricsReport::default());
}

#[cfg(feature = "tracing")]
#[test]
fn counters_accumulate_and_reset() {
    let metrics = Metrics::new();
    metrics.record_item();
    metrics.record_item();
    metrics.record_prediction();
    metrics.record_backtrack();

    let report = metrics.report();
    assert_eq!(report.items, 2);
    assert_eq!(report.predictions, 1);
    assert_eq!(report.backtracks, 1);

    metrics.reset();
    assert_eq!(metrics.report(), MetricsReport::default());
}
