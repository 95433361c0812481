//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Two plots over time (x = hours since the first prediction):
//! - load: actual `o`, predicted `+`, both in one cell `#`
//! - residual: `*`, with the zero line drawn as `.`

use crate::domain::{PredictionRow, Timestamp};

/// Actual and predicted load over time.
pub fn render_load_plot(rows: &[PredictionRow], width: usize, height: usize) -> String {
    let Some(t0) = rows.first().map(|r| r.timestamp) else {
        return "No predictions to plot.\n".to_string();
    };
    let actual = series(rows, t0, |r| r.actual);
    let predicted = series(rows, t0, |r| r.predicted);

    let (x_min, x_max) = x_range(&actual);
    let (y_min, y_max) = y_range(actual.iter().chain(&predicted)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let (width, height) = (width.max(10), height.max(5));
    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        x_min,
        x_max,
        y_min,
        y_max,
    };
    draw_series(&mut grid, &actual, &frame, 'o', None);
    draw_series(&mut grid, &predicted, &frame, '+', Some('#'));

    let header = format!(
        "Load: t=[{x_min:.1}, {x_max:.1}]h from {} | y=[{y_min:.2}, {y_max:.2}] | o actual  + predicted  # both\n",
        t0.to_rfc3339()
    );
    finish(header, grid)
}

/// Residual (`actual - predicted`) over time.
pub fn render_residual_plot(rows: &[PredictionRow], width: usize, height: usize) -> String {
    let Some(t0) = rows.first().map(|r| r.timestamp) else {
        return "No predictions to plot.\n".to_string();
    };
    let residual = series(rows, t0, |r| r.residual);

    let (x_min, x_max) = x_range(&residual);
    let zero = [(x_min, 0.0), (x_max, 0.0)];
    let (y_min, y_max) = y_range(residual.iter().chain(&zero)).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let (width, height) = (width.max(10), height.max(5));
    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        x_min,
        x_max,
        y_min,
        y_max,
    };
    draw_series(&mut grid, &residual, &frame, '*', None);
    draw_series(&mut grid, &zero, &frame, '.', None);

    let header = format!(
        "Residual: t=[{x_min:.1}, {x_max:.1}]h from {} | y=[{y_min:.2}, {y_max:.2}] | * actual-predicted  . zero\n",
        t0.to_rfc3339()
    );
    finish(header, grid)
}

struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

fn finish(header: String, grid: Vec<Vec<char>>) -> String {
    let mut out = header;
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// `(hours since t0, value)` pairs.
fn series(rows: &[PredictionRow], t0: Timestamp, value: impl Fn(&PredictionRow) -> f64) -> Vec<(f64, f64)> {
    rows.iter()
        .map(|r| ((r.timestamp - t0).num_seconds() as f64 / 3600.0, value(r)))
        .collect()
}

fn x_range(points: &[(f64, f64)]) -> (f64, f64) {
    let min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() && max > min {
        (min, max)
    } else {
        (0.0, 1.0)
    }
}

fn y_range<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Connect consecutive points. Cells already holding another glyph become
/// `overlap` when given, otherwise they are left alone.
fn draw_series(grid: &mut [Vec<char>], points: &[(f64, f64)], frame: &Frame, ch: char, overlap: Option<char>) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in points {
        let x = map_x(t, frame.x_min, frame.x_max, width);
        let yy = map_y(y, frame.y_min, frame.y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, ch, overlap),
            None => put(grid, x, yy, ch, overlap),
        }
        prev = Some((x, yy));
    }
}

fn put(grid: &mut [Vec<char>], x: usize, y: usize, ch: char, overlap: Option<char>) {
    let cell = &mut grid[y][x];
    if *cell == ' ' {
        *cell = ch;
    } else if let Some(o) = overlap {
        if *cell != ch {
            *cell = o;
        }
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char, overlap: Option<char>) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            put(grid, x0 as usize, y0 as usize, ch, overlap);
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
