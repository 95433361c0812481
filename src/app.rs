//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - runs the forecast pipeline or scores with a saved model
//! - generates synthetic samples
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ForecastArgs, GenerateArgs, PredictArgs};
use crate::data::{SampleConfig, generate_sample, write_sample_csv};
use crate::domain::{ForecastConfig, LagFile, LagSpec, NetworkOptions, PredictionRow};
use crate::error::AppError;
use crate::io::{parse_cutoff, parse_utc_offset};

pub mod pipeline;

/// Entry point for the `lf` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Predict(args) => handle_predict(args),
        Command::Generate(args) => handle_generate(args),
        Command::Tui(args) => handle_tui(args),
    }
}

/// Log to stderr so stdout stays clean for reports. `RUST_LOG` wins over flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_run(args: ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args)?;
    let run = pipeline::run_forecast(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));
    if config.plot {
        print_plots(&run.predictions, config.plot_width, config.plot_height);
    }

    if let Some(path) = &config.export_predictions {
        crate::io::write_predictions_csv(path, &run.predictions)?;
        info!(path = %path.display(), rows = run.predictions.len(), "exported predictions");
    }
    if let Some(path) = &config.export_model {
        crate::io::write_model_json(path, &pipeline::model_file(&config, &run))?;
        info!(path = %path.display(), "exported model");
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let model_file = crate::io::read_model_json(&args.model_file)?;
    let offset = parse_utc_offset(&args.input.utc_offset).map_err(AppError::input)?;

    let lags = model_file
        .lags
        .iter()
        .map(LagFile::to_spec)
        .collect::<Result<Vec<LagSpec>, _>>()?;
    let data = pipeline::prepare_data(
        &args.input.load_csv,
        &args.input.weather_csv,
        &args.input.zone,
        offset,
        &lags,
    )?;

    let from = match (&args.from, args.all) {
        (_, true) => None,
        (Some(s), false) => Some(parse_cutoff(s, offset).map_err(AppError::input)?),
        (None, false) => Some(model_file.trained_through),
    };
    let output = pipeline::run_predict(&model_file, &data, from)?;

    println!("{}", crate::report::format_predict_summary(&output, &model_file));
    if !args.no_plot {
        print_plots(&output.predictions, args.width, args.height);
    }

    if let Some(path) = &args.export {
        crate::io::write_predictions_csv(path, &output.predictions)?;
        info!(path = %path.display(), rows = output.predictions.len(), "exported predictions");
    }
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let offset = parse_utc_offset(&args.utc_offset).map_err(AppError::input)?;
    let start = parse_cutoff(&args.start, offset).map_err(AppError::input)?;

    let config = SampleConfig {
        start,
        days: args.days,
        seed: args.seed,
        zone: args.zone.clone(),
        load_gap_prob: args.load_gap_prob,
        weather_gap_prob: args.weather_gap_prob,
    };
    let data = generate_sample(&config)?;
    let (load_path, weather_path) = write_sample_csv(&args.out, &data)?;

    println!(
        "Wrote {} hours of sample data:\n  {}\n  {}",
        data.rows.len(),
        load_path.display(),
        weather_path.display()
    );
    Ok(())
}

fn handle_tui(args: ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(&args)?;
    crate::tui::run(config)
}

fn print_plots(rows: &[PredictionRow], width: usize, height: usize) {
    println!("{}", crate::plot::render_load_plot(rows, width, height));
    println!("{}", crate::plot::render_residual_plot(rows, width, height));
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> Result<ForecastConfig, AppError> {
    let utc_offset = parse_utc_offset(&args.input.utc_offset).map_err(AppError::input)?;
    let cutoff = parse_cutoff(&args.cutoff, utc_offset).map_err(AppError::input)?;

    Ok(ForecastConfig {
        load_csv: args.input.load_csv.clone(),
        weather_csv: args.input.weather_csv.clone(),
        zone: args.input.zone.clone(),
        utc_offset,
        cutoff,
        model: args.model,
        network: NetworkOptions {
            hidden: args.hidden,
            epochs: args.epochs,
            learning_rate: args.learning_rate,
            validation_fraction: args.validation_fraction,
            max_fail: args.max_fail,
            seed: args.seed,
        },
        lags: LagSpec::defaults(),
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_predictions: args.export.clone(),
        export_model: args.export_model.clone(),
    })
}

/// Rewrite argv so bare flags default to `lf run`.
///
/// Rules:
/// - `lf`                      -> `lf run` (clap then reports the missing inputs,
///   which may also come from `LF_*` variables)
/// - `lf --cutoff 2008-06-01`  -> `lf run --cutoff 2008-06-01`
/// - `lf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "predict" | "generate" | "tui");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_run() {
        assert_eq!(rewrite_args(argv(&["lf"])), argv(&["lf", "run"]));
        assert_eq!(
            rewrite_args(argv(&["lf", "--cutoff", "2008-06-01"])),
            argv(&["lf", "run", "--cutoff", "2008-06-01"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(argv(&["lf", "tui"])), argv(&["lf", "tui"]));
        assert_eq!(rewrite_args(argv(&["lf", "--help"])), argv(&["lf", "--help"]));
    }

    #[test]
    fn config_from_args_resolves_offset_and_cutoff() {
        let cli = crate::cli::Cli::try_parse_from([
            "lf",
            "run",
            "--load",
            "l.csv",
            "--weather",
            "w.csv",
            "--cutoff",
            "2008-06-01",
            "--utc-offset",
            "+01:00",
            "--no-plot",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = forecast_config_from_args(&args).unwrap();
        assert_eq!(config.cutoff.to_rfc3339(), "2008-06-01T00:00:00+01:00");
        assert!(!config.plot);
        assert_eq!(config.lags, LagSpec::defaults());
    }

    #[test]
    fn bad_cutoff_is_input_error() {
        let cli = crate::cli::Cli::try_parse_from([
            "lf", "run", "--load", "l.csv", "--weather", "w.csv", "--cutoff", "June",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(forecast_config_from_args(&args).unwrap_err().exit_code(), 2);
    }
}
