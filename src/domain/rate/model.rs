//! Rate table row
//!
//! Rows are owned by the external pricing service; the engine only reads
//! them. Both admission pricing and extra-time pricing come from here.

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub id: i32,
    pub branch_id: i32,
    pub customer_type_id: i32,
    pub duration_minutes: i32,
    pub price: Decimal,
}

impl RateRow {
    pub fn applies_to(&self, branch_id: i32, customer_type_id: i32) -> bool {
        self.branch_id == branch_id && self.customer_type_id == customer_type_id
    }
}

/// Pick the row for a duration, or the shortest one when no duration is given.
pub fn select_rate(rows: &[RateRow], duration_minutes: Option<i32>) -> Option<&RateRow> {
    match duration_minutes {
        Some(minutes) => rows.iter().find(|r| r.duration_minutes == minutes),
        None => rows.iter().min_by_key(|r| (r.duration_minutes, r.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, minutes: i32) -> RateRow {
        RateRow {
            id,
            branch_id: 1,
            customer_type_id: 2,
            duration_minutes: minutes,
            price: Decimal::from(minutes / 6),
        }
    }

    #[test]
    fn select_by_duration() {
        let rows = vec![row(1, 60), row(2, 30), row(3, 120)];
        assert_eq!(select_rate(&rows, Some(30)).map(|r| r.id), Some(2));
        assert_eq!(select_rate(&rows, Some(45)), None);
    }

    #[test]
    fn default_is_shortest_duration() {
        let rows = vec![row(1, 60), row(2, 30), row(3, 120)];
        assert_eq!(select_rate(&rows, None).map(|r| r.id), Some(2));
        assert_eq!(select_rate(&[], None), None);
    }

    #[test]
    fn applies_to_branch_and_customer_type() {
        let r = row(1, 60);
        assert!(r.applies_to(1, 2));
        assert!(!r.applies_to(1, 3));
        assert!(!r.applies_to(9, 2));
    }
}
