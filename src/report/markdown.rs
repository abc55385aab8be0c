use markdown_table::{Heading, HeadingAlignment, MarkdownTable};

use crate::error::{Error, Result};
use crate::models::Metric;

use super::Row;

/// GitHub-style table: one `User` column plus one column per selected metric.
pub(crate) fn render_table(metrics: &[Metric], rows: &[Row]) -> Result<String> {
    let headings = std::iter::once(Heading::new("User".to_string(), None))
        .chain(
            metrics
                .iter()
                .map(|m| Heading::new(m.column_title().to_string(), Some(HeadingAlignment::Right))),
        )
        .collect::<Vec<_>>();

    let cells = rows
        .iter()
        .map(|row| {
            let mut line = vec![row.login.clone()];
            line.extend(
                row.values
                    .iter()
                    .zip(metrics)
                    .map(|(value, metric)| format_cell(*metric, *value)),
            );
            line
        })
        .collect::<Vec<_>>();

    let mut table = MarkdownTable::new(cells);
    table.with_headings(headings);
    table
        .as_markdown()
        .map_err(|_| Error::Render("markdown table rendering failed".to_string()))
}

/// Counts render as integers, average size rounds to whole lines, merge time
/// keeps one decimal. Undefined averages stay blank.
fn format_cell(metric: Metric, value: Option<f64>) -> String {
    match (metric, value) {
        (_, None) => String::new(),
        (Metric::AvgMergeTime, Some(v)) => format!("{:.1}", v),
        (Metric::AvgPrSize, Some(v)) => format!("{}", v.round() as u64),
        (_, Some(v)) => format!("{}", v as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(Metric::PrCreated, Some(3.0)), "3");
        assert_eq!(format_cell(Metric::AvgPrSize, Some(30.4)), "30");
        assert_eq!(format_cell(Metric::AvgMergeTime, Some(36.25)), "36.2");
        assert_eq!(format_cell(Metric::AvgMergeTime, None), "");
    }
}
