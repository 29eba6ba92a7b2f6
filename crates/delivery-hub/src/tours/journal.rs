//! Performance journal over completed tours.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{Tour, TourStatus};
use crate::store::Schema;

const RECENT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalPeriod {
    Week,
    #[default]
    Month,
    All,
}

impl JournalPeriod {
    /// First tour date included in the window, if bounded.
    pub fn start(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Week => Some(today - Duration::days(7)),
            Self::Month => Some(today - Duration::days(30)),
            Self::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct JournalQuery {
    #[serde(default)]
    pub period: JournalPeriod,
}

#[derive(Debug, Clone, Serialize)]
pub struct TourJournal {
    pub period: JournalPeriod,
    pub total_tours: usize,
    pub total_km: f64,
    pub total_fuel: f64,
    pub delays_count: usize,
    pub issues_count: usize,
    pub delivered_count: usize,
    pub avg_km_per_tour: f64,
    pub avg_fuel_per_tour: f64,
    /// Most recent first, by tour date.
    pub tours: Vec<Tour>,
}

pub(crate) fn build(schema: &Schema, period: JournalPeriod, today: NaiveDate) -> TourJournal {
    let start = period.start(today);
    let mut tours: Vec<&Tour> = schema
        .tours
        .values()
        .filter(|tour| tour.status == TourStatus::Completed)
        .filter(|tour| start.map_or(true, |start| tour.tour_date >= start))
        .collect();

    let total_tours = tours.len();
    let total_km: f64 = tours.iter().map(|tour| tour.kilometers).sum();
    let total_fuel: f64 = tours.iter().map(|tour| tour.fuel_consumption).sum();
    let delivered_count = schema
        .tour_stops
        .values()
        .filter(|stop| stop.delivered && tours.iter().any(|tour| tour.id == stop.tour_id))
        .count();
    let divisor = total_tours.max(1) as f64;

    tours.sort_by(|a, b| b.tour_date.cmp(&a.tour_date).then(b.id.cmp(&a.id)));
    TourJournal {
        period,
        total_tours,
        total_km,
        total_fuel,
        delays_count: tours.iter().filter(|tour| tour.has_delay).count(),
        issues_count: tours.iter().filter(|tour| tour.has_technical_issue).count(),
        delivered_count,
        avg_km_per_tour: total_km / divisor,
        avg_fuel_per_tour: total_fuel / divisor,
        tours: tours.into_iter().take(RECENT_LIMIT).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_and_month_windows_reach_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).expect("date");
        assert_eq!(
            JournalPeriod::Week.start(today),
            NaiveDate::from_ymd_opt(2026, 3, 24)
        );
        assert_eq!(
            JournalPeriod::Month.start(today),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(JournalPeriod::All.start(today), None);
    }

    #[test]
    fn empty_journal_averages_to_zero() {
        let journal = build(
            &Schema::default(),
            JournalPeriod::All,
            NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"),
        );
        assert_eq!(journal.total_tours, 0);
        assert_eq!(journal.avg_km_per_tour, 0.0);
        assert!(journal.tours.is_empty());
    }
}
