use bigdecimal::BigDecimal;
use chrono::{Datelike, Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Calendar week running Sunday through Saturday, both inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    pub fn containing(today: NaiveDate) -> Self {
        let offset = i64::from(today.weekday().num_days_from_sunday());
        let start = today - Duration::days(offset);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// e.g. `Jun 2, 2024 to Jun 8, 2024`
    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%b %-d, %Y"),
            self.end.format("%b %-d, %Y")
        )
    }
}

/// Weekly aggregate, recomputed from scratch on every report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub total_orders: usize,
    pub total_amount: BigDecimal,
    pub average_order_price: BigDecimal,
    pub orders_by_restaurant: IndexMap<String, usize>,
    pub orders_by_person: IndexMap<String, usize>,
    pub daily_totals: IndexMap<String, BigDecimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        // 2024-06-05 is a Wednesday
        let week = WeekWindow::containing(day(2024, 6, 5));
        assert_eq!(week.start, day(2024, 6, 2));
        assert_eq!(week.end, day(2024, 6, 8));
        assert!(week.contains(day(2024, 6, 2)));
        assert!(week.contains(day(2024, 6, 8)));
        assert!(!week.contains(day(2024, 6, 1)));
        assert!(!week.contains(day(2024, 6, 9)));
    }

    #[test]
    fn sunday_and_saturday_anchor_their_own_week() {
        assert_eq!(WeekWindow::containing(day(2024, 6, 2)).start, day(2024, 6, 2));
        assert_eq!(WeekWindow::containing(day(2024, 6, 8)).start, day(2024, 6, 2));
    }

    #[test]
    fn label_reads_like_a_calendar_range() {
        let week = WeekWindow::containing(day(2024, 6, 3));
        assert_eq!(week.label(), "Jun 2, 2024 to Jun 8, 2024");
    }
}
