//! Ratatui-based terminal UI.
//!
//! Shows the test window of a run as two stacked charts (actual vs. predicted
//! load, and residuals) with the run metrics in the header. The data is read
//! once; switching model or seed refits on the prepared table.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::warn;

use crate::app::pipeline::{PreparedData, RunOutput, prepare_data, run_forecast_with_data};
use crate::domain::{ForecastConfig, PredictionRow};
use crate::error::AppError;
use crate::report::format_metrics;

mod plotters_chart;

use plotters_chart::{ChartSeries, SeriesStyle, TimeSeriesChart};

/// Smallest visible window, in hours.
const MIN_SPAN_HOURS: f64 = 6.0;

const ACTUAL_COLOR: RGBColor = RGBColor(255, 255, 255);
const PREDICTED_COLOR: RGBColor = RGBColor(0, 255, 255);
const RESIDUAL_COLOR: RGBColor = RGBColor(255, 200, 0);
const ZERO_COLOR: RGBColor = RGBColor(128, 128, 128);

/// Start the TUI.
pub fn run(config: ForecastConfig) -> Result<(), AppError> {
    // Read inputs before taking over the terminal so ingest errors print normally.
    let data = prepare_data(
        &config.load_csv,
        &config.weather_csv,
        &config.zone,
        config.utc_offset,
        &config.lags,
    )?;
    let mut app = App::new(config, data)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Visible slice of the test window, in hours since its first timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Viewport {
    start: f64,
    span: f64,
    total: f64,
}

impl Viewport {
    fn full(total: f64) -> Self {
        let total = total.max(MIN_SPAN_HOURS);
        Self {
            start: 0.0,
            span: total,
            total,
        }
    }

    fn bounds(&self) -> [f64; 2] {
        [self.start, self.start + self.span]
    }

    /// Move by a fraction of the visible span; negative pans left.
    fn pan(&mut self, frac: f64) {
        self.start = (self.start + frac * self.span).clamp(0.0, self.total - self.span);
    }

    /// Scale the span around its centre; `factor < 1` zooms in.
    fn zoom(&mut self, factor: f64) {
        let centre = self.start + self.span / 2.0;
        self.span = (self.span * factor).clamp(MIN_SPAN_HOURS.min(self.total), self.total);
        self.start = (centre - self.span / 2.0).clamp(0.0, self.total - self.span);
    }
}

/// Chart-ready series derived from a run's test predictions.
#[derive(Debug, Clone, Default)]
struct ChartData {
    actual: Vec<(f64, f64)>,
    predicted: Vec<(f64, f64)>,
    residual: Vec<(f64, f64)>,
    total_hours: f64,
}

impl ChartData {
    fn from_rows(rows: &[PredictionRow]) -> Self {
        let Some(t0) = rows.first().map(|r| r.timestamp) else {
            return Self::default();
        };
        let hours = |r: &PredictionRow| (r.timestamp - t0).num_seconds() as f64 / 3600.0;

        let mut data = Self::default();
        for r in rows {
            let x = hours(r);
            data.actual.push((x, r.actual));
            data.predicted.push((x, r.predicted));
            data.residual.push((x, r.residual));
            data.total_hours = data.total_hours.max(x);
        }
        data
    }
}

struct App {
    config: ForecastConfig,
    data: PreparedData,
    run: Option<RunOutput>,
    chart: ChartData,
    view: Viewport,
    status: String,
}

impl App {
    fn new(config: ForecastConfig, data: PreparedData) -> Result<Self, AppError> {
        let mut app = Self {
            config,
            data,
            run: None,
            chart: ChartData::default(),
            view: Viewport::full(0.0),
            status: String::new(),
        };
        // The first fit must succeed; later refits only report failures.
        let run = run_forecast_with_data(&app.config, &app.data)?;
        app.install(run);
        app.status = "Ready.".to_string();
        Ok(app)
    }

    fn install(&mut self, run: RunOutput) {
        self.chart = ChartData::from_rows(&run.predictions);
        self.view = Viewport::full(self.chart.total_hours);
        self.run = Some(run);
    }

    fn refit(&mut self) {
        self.status = "Fitting...".to_string();
        match run_forecast_with_data(&self.config, &self.data) {
            Ok(run) => {
                self.install(run);
                self.status = format!(
                    "model: {} | seed: {}",
                    self.config.model.display_name(),
                    self.config.network.seed
                );
            }
            Err(err) => {
                warn!(error = %err, "refit failed");
                self.status = format!("Fit failed: {err}");
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.view.pan(-0.25),
            KeyCode::Right => self.view.pan(0.25),
            KeyCode::Char('+') | KeyCode::Char('=') => self.view.zoom(0.5),
            KeyCode::Char('-') => self.view.zoom(2.0),
            KeyCode::Home => self.view = Viewport::full(self.chart.total_hours),
            KeyCode::Char('m') => {
                self.config.model = self.config.model.next();
                self.refit();
            }
            KeyCode::Char('r') => {
                self.config.network.seed = self.config.network.seed.wrapping_add(1);
                self.refit();
            }
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("lf", Style::default().fg(Color::Cyan)),
            Span::raw(" — hourly load forecast"),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "zone: {} | model: {} | cutoff: {} | joined rows: {}",
                self.config.zone,
                self.config.model.display_name(),
                self.config.cutoff.to_rfc3339(),
                self.data.summary.joined_rows,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            lines.push(Line::from(Span::styled(
                format!(
                    "test {} | train obs={} test obs={}",
                    format_metrics(&run.metrics),
                    run.train.n_obs(),
                    run.test.n_obs(),
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let x_bounds = self.view.bounds();
        let zero = [(x_bounds[0], 0.0), (x_bounds[1], 0.0)];

        let load_series = [
            ChartSeries {
                points: &self.chart.actual,
                color: ACTUAL_COLOR,
                style: SeriesStyle::Line,
            },
            ChartSeries {
                points: &self.chart.predicted,
                color: PREDICTED_COLOR,
                style: SeriesStyle::Line,
            },
        ];
        let residual_series = [
            ChartSeries {
                points: &zero,
                color: ZERO_COLOR,
                style: SeriesStyle::Line,
            },
            ChartSeries {
                points: &self.chart.residual,
                color: RESIDUAL_COLOR,
                style: SeriesStyle::Dots,
            },
        ];

        self.draw_chart(
            frame,
            chunks[0],
            "Load: actual (white) vs predicted (cyan)",
            "load",
            &load_series,
        );
        self.draw_chart(frame, chunks[1], "Residual: actual - predicted", "residual", &residual_series);
    }

    fn draw_chart(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        title: &str,
        y_label: &str,
        series: &[ChartSeries<'_>],
    ) {
        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.run.is_none() || self.chart.actual.is_empty() {
            let msg = Paragraph::new("No predictions.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let x_bounds = self.view.bounds();
        let y_bounds = visible_y_bounds(series, x_bounds);
        let widget = TimeSeriesChart {
            series,
            x_bounds,
            y_bounds,
            x_label: "hours into test window",
            y_label,
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ pan  +/- zoom  Home reset  m model  r reseed  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Y range over the points inside `x_bounds`, padded by 5%.
fn visible_y_bounds(series: &[ChartSeries<'_>], x_bounds: [f64; 2]) -> [f64; 2] {
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in series {
        for &(x, y) in s.points {
            if x >= x_bounds[0] && x <= x_bounds[1] {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
    }

    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
        if !y_min.is_finite() || !y_max.is_finite() {
            return [0.0, 1.0];
        }
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    [y_min - pad, y_max + pad]
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}h")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.0}")
}
