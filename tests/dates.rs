#[cfg(test)]
mod tests {
    use agenda::libs::dates::resolve_date;
    use chrono::{NaiveDate, NaiveDateTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Option<NaiveDateTime> {
        Some(date(y, m, d).and_hms_opt(h, min, 0).unwrap())
    }

    #[test]
    fn test_absolute_forms() {
        let today = date(2024, 6, 1);
        assert_eq!(resolve_date("2024-06-03", today), Ok(at(2024, 6, 3, 0, 0)));
        assert_eq!(resolve_date("2024-06-03 14:30", today), Ok(at(2024, 6, 3, 14, 30)));
        assert_eq!(resolve_date("2024-06-03T14:30", today), Ok(at(2024, 6, 3, 14, 30)));
        assert_eq!(resolve_date("2024-06-03T14:30:00", today), Ok(at(2024, 6, 3, 14, 30)));
    }

    #[test]
    fn test_seconds_are_dropped() {
        let today = date(2024, 6, 1);
        assert_eq!(resolve_date("2024-06-01T10:00:15", today), Ok(at(2024, 6, 1, 10, 0)));
        assert_eq!(resolve_date("2024-06-03 14:30:59", today), Ok(at(2024, 6, 3, 14, 30)));
    }

    #[test]
    fn test_relative_forms() {
        // 2024-06-01 is a Saturday
        let today = date(2024, 6, 1);
        assert_eq!(resolve_date("today", today), Ok(at(2024, 6, 1, 0, 0)));
        assert_eq!(resolve_date("Tomorrow 09:15", today), Ok(at(2024, 6, 2, 9, 15)));
        assert_eq!(resolve_date("yesterday", today), Ok(at(2024, 5, 31, 0, 0)));
        assert_eq!(resolve_date("mon", today), Ok(at(2024, 6, 3, 0, 0)));
        assert_eq!(resolve_date("saturday 10:00", today), Ok(at(2024, 6, 8, 10, 0)));
    }

    #[test]
    fn test_no_due_date() {
        let today = date(2024, 6, 1);
        assert_eq!(resolve_date("none", today), Ok(None));
        assert_eq!(resolve_date(" CLEAR ", today), Ok(None));
    }

    #[test]
    fn test_unresolvable() {
        let today = date(2024, 6, 1);
        assert!(resolve_date("next blue moon", today).is_err());
        assert!(resolve_date("2024-13-01", today).is_err());
        assert!(resolve_date("today 25:00", today).is_err());
        assert!(resolve_date("", today).is_err());
    }
}
