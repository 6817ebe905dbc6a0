use crate::{Error, Result};
use std::collections::HashSet;
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const DMY_FORMAT: &[FormatItem<'static>] = format_description!("[day]/[month]/[year]");
const ISO_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Accepts `dd/MM/yyyy`, `yyyy-MM-dd` or a full RFC 3339 timestamp.
pub fn parse_flexible(input: &str) -> Result<Date> {
    let input = input.trim();
    Date::parse(input, DMY_FORMAT)
        .or_else(|_| Date::parse(input, ISO_FORMAT))
        .or_else(|_| OffsetDateTime::parse(input, &Rfc3339).map(|it| it.date()))
        .map_err(|_| Error::InvalidInput("Invalid test date format".into()))
}

/// Missing dates default to today (UTC).
pub fn normalize_test_date(input: Option<&str>) -> Result<Date> {
    match input {
        Some(raw) if !raw.trim().is_empty() => parse_flexible(raw),
        _ => Ok(OffsetDateTime::now_utc().date()),
    }
}

pub fn format_dmy(date: Date) -> String {
    // The format description is static, formatting a valid date can't fail
    date.format(DMY_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// An inclusive module-duration window, parsed from `"dd/MM/yyyy - dd/MM/yyyy"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationWindow {
    pub start: Date,
    pub end: Date,
}

impl DurationWindow {
    pub fn parse(raw: &str) -> Result<DurationWindow> {
        let (start, end) = raw.split_once('-').ok_or_else(|| {
            Error::InvalidInput(
                "Invalid module_duration format. Expected 'dd/MM/yyyy - dd/MM/yyyy'".into(),
            )
        })?;
        let start = Date::parse(start.trim(), DMY_FORMAT)
            .map_err(|_| Error::InvalidInput("Invalid date in module_duration".into()))?;
        let end = Date::parse(end.trim(), DMY_FORMAT)
            .map_err(|_| Error::InvalidInput("Invalid date in module_duration".into()))?;
        if start > end {
            return Err(Error::InvalidInput(
                "module_duration starts after it ends".into(),
            ));
        }
        Ok(DurationWindow { start, end })
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn total_days(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }

    pub fn days(&self) -> Vec<Date> {
        let mut res = Vec::with_capacity(self.total_days() as usize);
        let mut day = self.start;
        while day <= self.end {
            res.push(day);
            match day.next_day() {
                Some(next) => day = next,
                None => break,
            }
        }
        res
    }

    /// Count of window days on which at least one test was taken.
    pub fn attended_days(&self, test_dates: &HashSet<Date>) -> i64 {
        self.days()
            .iter()
            .filter(|it| test_dates.contains(it))
            .count() as i64
    }

    pub fn label(&self) -> String {
        format!("{} - {}", format_dmy(self.start), format_dmy(self.end))
    }
}

#[cfg(test)]
mod test {
    use super::DurationWindow;
    use crate::Result;
    use std::collections::HashSet;
    use time::macros::date;

    #[test]
    fn parse_flexible_dmy() -> Result<()> {
        assert_eq!(date!(2025 - 02 - 01), super::parse_flexible("01/02/2025")?);
        Ok(())
    }

    #[test]
    fn parse_flexible_iso() -> Result<()> {
        assert_eq!(date!(2025 - 02 - 01), super::parse_flexible("2025-02-01")?);
        assert_eq!(
            date!(2025 - 02 - 01),
            super::parse_flexible("2025-02-01T10:30:00Z")?,
        );
        Ok(())
    }

    #[test]
    fn parse_flexible_garbage() {
        assert!(super::parse_flexible("02-2025-01").is_err());
        assert!(super::parse_flexible("next tuesday").is_err());
    }

    #[test]
    fn normalize_defaults_to_today() -> Result<()> {
        let today = time::OffsetDateTime::now_utc().date();
        assert_eq!(today, super::normalize_test_date(None)?);
        assert_eq!(today, super::normalize_test_date(Some(""))?);
        Ok(())
    }

    #[test]
    fn window_parse() -> Result<()> {
        let window = DurationWindow::parse("01/02/2025 - 15/02/2025")?;
        assert_eq!(date!(2025 - 02 - 01), window.start);
        assert_eq!(date!(2025 - 02 - 15), window.end);
        assert_eq!(15, window.total_days());
        Ok(())
    }

    #[test]
    fn window_parse_rejects_missing_separator() {
        assert!(DurationWindow::parse("01/02/2025 15/02/2025").is_err());
    }

    #[test]
    fn window_parse_rejects_bad_date() {
        assert!(DurationWindow::parse("01/02/2025 - 32/02/2025").is_err());
    }

    #[test]
    fn window_parse_rejects_inverted_range() {
        assert!(DurationWindow::parse("15/02/2025 - 01/02/2025").is_err());
    }

    #[test]
    fn window_contains() -> Result<()> {
        let window = DurationWindow::parse("01/02/2025 - 15/02/2025")?;
        assert!(window.contains(date!(2025 - 02 - 01)));
        assert!(window.contains(date!(2025 - 02 - 15)));
        assert!(!window.contains(date!(2025 - 01 - 31)));
        assert!(!window.contains(date!(2025 - 02 - 16)));
        Ok(())
    }

    #[test]
    fn window_days_enumeration() -> Result<()> {
        let window = DurationWindow::parse("28/02/2024 - 02/03/2024")?;
        assert_eq!(
            vec![
                date!(2024 - 02 - 28),
                date!(2024 - 02 - 29),
                date!(2024 - 03 - 01),
                date!(2024 - 03 - 02),
            ],
            window.days(),
        );
        Ok(())
    }

    #[test]
    fn attended_days_ignores_dates_outside_window() -> Result<()> {
        let window = DurationWindow::parse("01/02/2025 - 05/02/2025")?;
        let mut dates = HashSet::new();
        dates.insert(date!(2025 - 02 - 02));
        dates.insert(date!(2025 - 02 - 04));
        dates.insert(date!(2025 - 03 - 01));
        assert_eq!(2, window.attended_days(&dates));
        Ok(())
    }

    #[test]
    fn label_round_trips() -> Result<()> {
        let window = DurationWindow::parse("01/02/2025-15/02/2025")?;
        assert_eq!("01/02/2025 - 15/02/2025", window.label());
        Ok(())
    }
}
