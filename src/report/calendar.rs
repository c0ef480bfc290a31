use chrono::{Datelike, NaiveDate, Weekday};

/// Day and month names for sheet labels. Passed explicitly everywhere so the
/// engine never reads process-global locale state.
#[derive(Debug, Clone)]
pub struct Locale {
    weekdays: [&'static str; 7],
    months: [&'static str; 12],
}

impl Locale {
    /// The fixed template is French; this is the locale shipped by default.
    pub const fn french() -> Self {
        Self {
            weekdays: [
                "Lundi", "Mardi", "Mercredi", "Jeudi", "Vendredi", "Samedi", "Dimanche",
            ],
            months: [
                "Janvier",
                "Février",
                "Mars",
                "Avril",
                "Mai",
                "Juin",
                "Juillet",
                "Août",
                "Septembre",
                "Octobre",
                "Novembre",
                "Décembre",
            ],
        }
    }

    pub fn weekday_name(&self, weekday: Weekday) -> &'static str {
        self.weekdays[weekday.num_days_from_monday() as usize]
    }

    pub fn month_name(&self, month: u32) -> Option<&'static str> {
        self.months.get(month.checked_sub(1)? as usize).copied()
    }

    /// Capitalized "Month Year" heading for the month containing `day`,
    /// e.g. "Février 2026".
    pub fn period_heading(&self, day: NaiveDate) -> String {
        format!("{} {}", self.months[day.month0() as usize], day.year())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::french()
    }
}

/// First and last day of the month, both inclusive. None for a month outside
/// 1..=12 or a year chrono cannot represent.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next.pred_opt()?))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    month_bounds(year, month).map(|(_, end)| end.day())
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2026, 2), Some(28));
        assert_eq!(days_in_month(2024, 2), Some(29)); // leap year
        assert_eq!(days_in_month(2026, 12), Some(31));
        assert_eq!(days_in_month(2026, 4), Some(30));
        assert_eq!(days_in_month(2026, 13), None);
        assert_eq!(days_in_month(2026, 0), None);
    }

    #[test]
    fn bounds_are_inclusive() {
        let (start, end) = month_bounds(2026, 2).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn weekend_classification() {
        // 2026-02-14 is a Saturday, 2026-02-15 a Sunday, 2026-02-10 a Tuesday.
        assert!(is_weekend(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()));
    }

    #[test]
    fn french_names() {
        let locale = Locale::french();
        assert_eq!(locale.weekday_name(Weekday::Sat), "Samedi");
        assert_eq!(locale.weekday_name(Weekday::Mon), "Lundi");
        assert_eq!(locale.month_name(2), Some("Février"));
        assert_eq!(locale.month_name(13), None);
        assert_eq!(
            locale.period_heading(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()),
            "Février 2026"
        );
    }
}
