//! Windowed table rendering: decides which rows and columns of the filtered
//! view fit the viewport and materializes them as text.
//!
//! The output [`Frame`] is plain data; [`crate::widgets::table`] draws it.

use polars::prelude::*;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::filter::{substring_search, Compiled, FilterCompiler, Strategy};
use crate::source::{DataSource, ROW_INDEX};
use crate::view::ViewState;

/// Rows of the table panel not available to data: vertical padding (2),
/// table borders (2), header (1), header margin (1), footer (1).
pub const CHROME: u16 = 7;

/// Header of the synthetic row-index column.
pub const INDEX_HEADER: &str = " ";

/// Horizontal slack needed before an extra, clipped column is admitted.
const MIN_SLACK: usize = 30;
/// Minimum slack per admitted column for the same rule.
const MIN_SLACK_PER_COLUMN: f64 = 4.0;

/// Display widths of a column's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnMeasure {
    /// Widest single word; the column cannot usefully be narrower.
    pub minimum: usize,
    /// Widest line; the column never needs to be wider.
    pub maximum: usize,
}

/// Measure a column from its header and cell texts.
pub fn measure(header: &str, cells: &[String]) -> ColumnMeasure {
    let mut result = ColumnMeasure::default();
    for text in std::iter::once(header).chain(cells.iter().map(String::as_str)) {
        for line in text.lines() {
            result.maximum = result.maximum.max(line.width());
        }
        for word in text.split_whitespace() {
            result.minimum = result.minimum.max(word.width());
        }
    }
    result
}

/// How many leading columns to render given each column's width.
///
/// Columns are admitted while their cumulative width fits. At least one
/// column is always admitted; when a generous amount of space is left over
/// one more column is admitted and rendered clipped.
pub fn fit_columns(widths: &[usize], viewport_width: usize) -> usize {
    let mut cumulative = 0usize;
    let first_overflow = widths.iter().position(|w| {
        cumulative += w;
        cumulative > viewport_width
    });
    let Some(cut) = first_overflow else {
        return widths.len();
    };

    let mut cut = cut.max(1);
    if cut < widths.len() {
        let used: usize = widths[..cut].iter().sum();
        let slack = viewport_width.saturating_sub(used);
        if slack >= MIN_SLACK && slack as f64 / cut as f64 >= MIN_SLACK_PER_COLUMN {
            cut += 1;
        }
    }
    cut
}

/// One rendered page of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Index header followed by the admitted data columns.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Width of each admitted column, separator included.
    pub widths: Vec<usize>,
    /// Rows in the filtered view before paging.
    pub total_rows: usize,
}

impl Frame {
    pub fn footer(&self) -> String {
        format!("... {} total rows", self.total_rows)
    }
}

/// Frame plus how the filter was applied, for diagnostics.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub frame: Frame,
    pub strategy: Strategy,
}

pub struct TableRenderer<'a> {
    compiler: &'a FilterCompiler,
}

impl<'a> TableRenderer<'a> {
    pub fn new(compiler: &'a FilterCompiler) -> Self {
        Self { compiler }
    }

    /// Produce the page for a panel of `width` × `height` cells.
    ///
    /// Records the body height into `view.last_page_size` and the filtered
    /// view's shape into the view's extent, re-clamping its offsets.
    pub fn render(
        &self,
        width: u16,
        height: u16,
        view: &mut ViewState,
        source: &DataSource,
        filter: Option<&str>,
        editor_visible: bool,
    ) -> Rendered {
        let body_height = height.saturating_sub(CHROME + u16::from(editor_visible)) as usize;
        view.last_page_size = body_height;

        let compiled = self.compiler.compile(filter, source);
        let strategy = compiled.strategy;
        match page(&compiled, view, body_height, width as usize) {
            Ok(frame) => Rendered { frame, strategy },
            // Lazy plans can fail only once collected; treat the text as a search instead
            Err(e) if strategy == Strategy::Expression => {
                debug!(error = %e, "expression failed on collect, retrying as substring search");
                let text = filter.unwrap_or_default();
                let fallback = substring_search(text, source);
                let strategy = fallback.strategy;
                let frame = page(&fallback, view, body_height, width as usize)
                    .unwrap_or_else(|e| empty_frame(view, &e));
                Rendered { frame, strategy }
            }
            Err(e) => Rendered {
                frame: empty_frame(view, &e),
                strategy,
            },
        }
    }
}

fn empty_frame(view: &mut ViewState, error: &PolarsError) -> Frame {
    warn!(error = %error, "failed to materialize table page");
    view.set_extent(0, 0);
    Frame {
        headers: vec![INDEX_HEADER.to_string()],
        rows: Vec::new(),
        widths: vec![INDEX_HEADER.width() + 1],
        total_rows: 0,
    }
}

fn page(
    compiled: &Compiled,
    view: &mut ViewState,
    body_height: usize,
    width: usize,
) -> PolarsResult<Frame> {
    let source = &compiled.source;
    let total_rows = source.row_count()?;
    view.set_extent(total_rows, source.column_count());

    let sliced = source.select_columns(view.column_start_at()..)?;
    let df = sliced.iter_rows(view.startat(), body_height)?;

    let mut headers = vec![INDEX_HEADER.to_string()];
    headers.extend(sliced.columns());

    let mut columns: Vec<Vec<String>> = Vec::with_capacity(headers.len());
    columns.push(column_text(&df, ROW_INDEX)?);
    for name in &headers[1..] {
        columns.push(column_text(&df, name)?);
    }

    let widths: Vec<usize> = headers
        .iter()
        .zip(&columns)
        .map(|(header, cells)| measure(header, cells).maximum + 1)
        .collect();
    let admitted = fit_columns(&widths, width);

    let rows = (0..df.height())
        .map(|i| columns[..admitted].iter().map(|c| c[i].clone()).collect())
        .collect();
    headers.truncate(admitted);

    Ok(Frame {
        headers,
        rows,
        widths: widths[..admitted].to_vec(),
        total_rows,
    })
}

fn column_text(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let column = df.column(name)?;
    (0..df.height())
        .map(|i| column.get(i).map(|value| DataSource::stringify(&value)))
        .collect()
}
