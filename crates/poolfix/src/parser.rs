use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::types::{FixtureRecord, WeekEntry};

static FIXTURE_ROWS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#table tbody tr").expect("invalid selector: fixture rows")
});
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: cells"));
static WEEK_OPTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select option").expect("invalid selector: week options"));

const COL_NUMBER: usize = 0;
const COL_HOME: usize = 1;
// column 2 holds the "v" divider between the two teams
const COL_AWAY: usize = 3;
const COL_RESULT: usize = 4;
const COL_STATUS: usize = 5;

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn cell_text(cells: &[ElementRef], index: usize) -> String {
    cells
        .get(index)
        .map(|cell| elem_text(*cell).trim().to_string())
        .unwrap_or_default()
}

/// Reads the fixtures table in document order.
///
/// Rows without a number, home team or away team are skipped. A page without
/// the table yields an empty list.
pub fn parse_fixtures(html: &str) -> Vec<FixtureRecord> {
    let document = Html::parse_document(html);
    let mut fixtures = Vec::new();

    for (i, row) in document.select(&FIXTURE_ROWS).enumerate() {
        let cells: Vec<ElementRef> = row.select(&CELLS).collect();

        let fixture = FixtureRecord {
            number: cell_text(&cells, COL_NUMBER),
            home: cell_text(&cells, COL_HOME),
            away: cell_text(&cells, COL_AWAY),
            result: cell_text(&cells, COL_RESULT),
            status: cell_text(&cells, COL_STATUS),
        };

        if fixture.number.is_empty() || fixture.home.is_empty() || fixture.away.is_empty() {
            log::debug!("Skipping incomplete fixture row {}", i);
            continue;
        }

        log::trace!("{}", fixture);
        fixtures.push(fixture);
    }

    log::debug!("Parsed {} fixture(s)", fixtures.len());
    fixtures
}

/// Reads the week picker. Only options with a date-like (hyphenated) value
/// are kept, which drops placeholders such as "Select week".
pub fn parse_weeks(html: &str) -> Vec<WeekEntry> {
    let document = Html::parse_document(html);

    document
        .select(&WEEK_OPTIONS)
        .filter_map(|option| {
            let value = option.value().attr("value")?;
            value.contains('-').then(|| WeekEntry {
                date: value.to_string(),
                label: elem_text(option).trim().to_string(),
            })
        })
        .collect()
}
