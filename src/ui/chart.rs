use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use crate::ui::query::SeriesFrame;

/// Colors assigned to series in order; the sector page cycles through them.
const SERIES_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightGreen,
];

/// Render one line chart with a series per frame column. Gaps in a series
/// are left out of its dataset rather than drawn as zero.
pub fn render_series_chart(f: &mut Frame, area: Rect, title: &str, frame: &SeriesFrame) {
    let points: Vec<Vec<(f64, f64)>> = frame
        .series
        .iter()
        .map(|(_, values)| {
            values
                .iter()
                .enumerate()
                .filter_map(|(index, value)| value.map(|v| (index as f64, v)))
                .collect()
        })
        .collect();

    let datasets: Vec<Dataset> = frame
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(index, ((name, _), data))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[index % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let (min, max) = value_bounds(frame);
    let x_max = frame.dates.len().saturating_sub(1).max(1) as f64;

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string()),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(date_labels(frame)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([min, max])
                .labels(vec![
                    Span::raw(format!("{:.2}", min)),
                    Span::raw(format!("{:.2}", (min + max) / 2.0)),
                    Span::raw(format!("{:.2}", max)),
                ]),
        );

    f.render_widget(chart, area);
}

fn value_bounds(frame: &SeriesFrame) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (_, values) in &frame.series {
        for value in values.iter().flatten() {
            min = min.min(*value);
            max = max.max(*value);
        }
    }
    if min > max {
        return (0.0, 1.0);
    }
    // Flat series still need a visible band
    let padding = ((max - min) * 0.05).max(f64::EPSILON);
    (min - padding, max + padding)
}

fn date_labels(frame: &SeriesFrame) -> Vec<Span<'static>> {
    match frame.dates.as_slice() {
        [] => Vec::new(),
        [only] => vec![Span::raw(only.format("%Y-%m-%d").to_string())],
        dates => {
            let middle = dates[dates.len() / 2];
            vec![
                Span::raw(dates[0].format("%Y-%m-%d").to_string()),
                Span::raw(middle.format("%Y-%m-%d").to_string()),
                Span::raw(dates[dates.len() - 1].format("%Y-%m-%d").to_string()),
            ]
        }
    }
}
