//! Receipts name the month being paid for with a short label such as "Sep-25".

use time::{Date, Month};

const MONTH_ABBREVIATIONS: [(&str, Month); 12] = [
    ("jan", Month::January),
    ("feb", Month::February),
    ("mar", Month::March),
    ("apr", Month::April),
    ("may", Month::May),
    ("jun", Month::June),
    ("jul", Month::July),
    ("aug", Month::August),
    ("sep", Month::September),
    ("oct", Month::October),
    ("nov", Month::November),
    ("dec", Month::December),
];

/// Parse a "Mon-YY" label into a year and month. The month abbreviation is
/// case-insensitive and two digit years are in the 2000s.
///
/// Returns `None` if `label` is not a valid month label.
pub fn parse_month_label(label: &str) -> Option<(i32, Month)> {
    let (month, year) = label.trim().split_once('-')?;

    let month = MONTH_ABBREVIATIONS
        .iter()
        .find(|(abbreviation, _)| abbreviation.eq_ignore_ascii_case(month))
        .map(|(_, month)| *month)?;

    if year.len() != 2 || !year.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let year: i32 = year.parse().ok()?;

    Some((2000 + year, month))
}

/// Format the month of `date` as "YYYY-MM".
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}
