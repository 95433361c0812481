//! End-to-end tests: CSV files on disk through features, fitting and scoring.

mod common;

use chrono::Duration;
use load_forecast::app::pipeline::{model_file, prepare_data, run_forecast, run_forecast_with_data, run_predict};
use load_forecast::domain::{COL_LAG_HOUR, COL_LOAD, LagSpec, ModelKind};
use load_forecast::features::compute_lag;
use load_forecast::io::{read_load_table, read_model_json, write_model_json, write_predictions_csv};

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[test]
fn linear_run_partitions_at_cutoff_and_forecasts_well() {
    let dir = common::scratch_dir("linear");
    let (load, weather) = common::write_sample(&dir, 28, 1);
    let cutoff = common::cutoff("2008-01-22");
    let config = common::forecast_config(&load, &weather, ModelKind::Linear, cutoff);

    let run = run_forecast(&config).unwrap();

    assert_eq!(run.summary.train_rows + run.summary.test_rows, run.summary.joined_rows);
    assert!(run.train.timestamps.iter().all(|t| *t <= cutoff));
    assert!(run.test.timestamps.iter().all(|t| *t > cutoff));
    // The first week has no prior-week lag.
    assert!(run.train.skipped > 100);
    assert_eq!(run.predictions.len(), run.test.n_obs());
    assert!(run.fitted.training.is_none());

    let m = &run.metrics;
    assert!(m.mae.is_finite() && m.rmse.is_finite());
    assert!(m.mape.unwrap() < 10.0, "mape {:?}", m.mape);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn network_run_beats_constant_forecast_and_is_reproducible() {
    let dir = common::scratch_dir("network");
    let (load, weather) = common::write_sample(&dir, 28, 2);
    let config = common::forecast_config(&load, &weather, ModelKind::Network, common::cutoff("2008-01-22"));
    let data = prepare_data(&load, &weather, "NYC", common::est(), &config.lags).unwrap();

    let a = run_forecast_with_data(&config, &data).unwrap();
    let b = run_forecast_with_data(&config, &data).unwrap();
    assert_eq!(a.predictions, b.predictions);

    let report = a.fitted.training.as_ref().unwrap();
    assert!(report.epochs_run >= 1 && report.epochs_run <= config.network.epochs);
    assert!(report.n_validation > 0);

    let actual: Vec<f64> = a.predictions.iter().map(|r| r.actual).collect();
    assert!(a.metrics.rmse < std_dev(&actual), "rmse {}", a.metrics.rmse);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn saved_model_reproduces_run_predictions() {
    let dir = common::scratch_dir("saved");
    let (load, weather) = common::write_sample(&dir, 21, 3);
    let cutoff = common::cutoff("2008-01-15");

    for kind in [ModelKind::Linear, ModelKind::Network] {
        let config = common::forecast_config(&load, &weather, kind, cutoff);
        let run = run_forecast(&config).unwrap();

        let path = dir.join(format!("{kind:?}.json"));
        write_model_json(&path, &model_file(&config, &run)).unwrap();
        let saved = read_model_json(&path).unwrap();
        assert_eq!(saved.trained_through, cutoff);
        assert_eq!(saved.params.kind(), kind);

        let lags = saved
            .lags
            .iter()
            .map(|l| l.to_spec())
            .collect::<Result<Vec<LagSpec>, _>>()
            .unwrap();
        let data = prepare_data(&load, &weather, "nyc", common::est(), &lags).unwrap();
        let scored = run_predict(&saved, &data, Some(saved.trained_through)).unwrap();

        assert_eq!(scored.predictions.len(), run.predictions.len());
        for (p, q) in scored.predictions.iter().zip(&run.predictions) {
            assert_eq!(p.timestamp, q.timestamp);
            assert!((p.predicted - q.predicted).abs() < 1e-6);
        }

        let all = run_predict(&saved, &data, None).unwrap();
        assert!(all.predictions.len() > scored.predictions.len());
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn predictions_export_has_one_line_per_row() {
    let dir = common::scratch_dir("export");
    let (load, weather) = common::write_sample(&dir, 14, 4);
    let config = common::forecast_config(&load, &weather, ModelKind::Linear, common::cutoff("2008-01-12"));
    let run = run_forecast(&config).unwrap();

    let out = dir.join("predictions.csv");
    write_predictions_csv(&out, &run.predictions).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("timestamp,actual,predicted,residual"));
    assert_eq!(lines.count(), run.predictions.len());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn hourly_lag_over_a_gap_from_csv() {
    let csv = "timestamp,NYC\n\
               2008-01-01 00:00,10\n\
               2008-01-01 01:00,20\n\
               2008-01-01 02:00,30\n\
               2008-01-01 04:00,50\n\
               2008-01-01 05:00,60\n";
    let ingested = read_load_table(csv.as_bytes(), "NYC", common::est()).unwrap();
    let lag = compute_lag(&ingested.table, COL_LOAD, Duration::hours(1)).unwrap();
    assert_eq!(lag, vec![None, Some(10.0), Some(20.0), None, Some(50.0)]);

    let specs = [LagSpec::hours(COL_LAG_HOUR, COL_LOAD, 1)];
    let mut table = ingested.table.clone();
    load_forecast::features::apply_lags(&mut table, &specs).unwrap();
    assert_eq!(table.value(4, COL_LAG_HOUR), Some(50.0));
}

#[test]
fn failures_map_to_exit_codes() {
    let dir = common::scratch_dir("errors");
    let (load, weather) = common::write_sample(&dir, 10, 5);

    let missing = dir.join("nope.csv");
    let err = prepare_data(&missing, &weather, "NYC", common::est(), &LagSpec::defaults()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    let err = prepare_data(&load, &weather, "BOS", common::est(), &LagSpec::defaults()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    // Cutoff after the data: nothing to test on.
    let config = common::forecast_config(&load, &weather, ModelKind::Linear, common::cutoff("2009-01-01"));
    assert_eq!(run_forecast(&config).unwrap_err().exit_code(), 3);

    // Weather from another year: empty join.
    let other = common::scratch_dir("errors-other");
    let shifted = load_forecast::data::SampleConfig {
        start: common::start() + Duration::days(400),
        days: 2,
        seed: 5,
        zone: "NYC".to_string(),
        load_gap_prob: 0.0,
        weather_gap_prob: 0.0,
    };
    let data = load_forecast::data::generate_sample(&shifted).unwrap();
    let (_, far_weather) = load_forecast::data::write_sample_csv(&other, &data).unwrap();
    let err = prepare_data(&load, &far_weather, "NYC", common::est(), &LagSpec::defaults()).unwrap_err();
    assert_eq!(err.exit_code(), 3);

    let _ = std::fs::remove_dir_all(&dir);
    let _ = std::fs::remove_dir_all(&other);
}
