use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::SECONDS_PER_DAY;

/// 2023-10-01T00:00:00Z
pub const DEFAULT_BASE_DATE: i64 = 1_696_118_400;
pub const DEFAULT_DAYS: u32 = 60;
pub const DEFAULT_AMOUNT: u64 = 1000;
pub const DEFAULT_PRICE: u64 = 5;
pub const DEFAULT_DIRECTION: u8 = 0;
pub const DEFAULT_DURATION_DAYS: u32 = 6;

/// Fixed order parameters shared by every order in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderTemplate {
    pub amount: u64,
    pub price: u64,
    pub direction: u8,
    pub duration_days: u32,
}

impl Default for OrderTemplate {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT,
            price: DEFAULT_PRICE,
            direction: DEFAULT_DIRECTION,
            duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("order {day} of a schedule starting at {base_date} falls outside the i64 timestamp range")]
    DateOutOfRange { base_date: i64, day: u32 },
}

/// One `create_and_fill` call. Dates are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub start_date: i64,
    pub end_date: i64,
    pub amount: u64,
    pub price: u64,
    pub direction: u8,
}

impl OrderRecord {
    /// Returns `None` when the end date does not fit in an `i64`.
    pub fn new(start_date: i64, template: &OrderTemplate) -> Option<Self> {
        let end_date = i64::from(template.duration_days)
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|span| start_date.checked_add(span))?;
        Some(Self {
            start_date,
            end_date,
            amount: template.amount,
            price: template.price,
            direction: template.direction,
        })
    }

    /// Calldata for the order book's `create_and_fill` entry point.
    pub fn inputs(&self) -> [String; 5] {
        [
            self.amount.to_string(),
            self.price.to_string(),
            self.direction.to_string(),
            self.start_date.to_string(),
            self.end_date.to_string(),
        ]
    }
}

/// A run of consecutive daily orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderSchedule {
    pub base_date: i64,
    pub days: u32,
    pub template: OrderTemplate,
}

impl Default for OrderSchedule {
    fn default() -> Self {
        Self {
            base_date: DEFAULT_BASE_DATE,
            days: DEFAULT_DAYS,
            template: OrderTemplate::default(),
        }
    }
}

impl OrderSchedule {
    fn start_date(&self, day: u32) -> Option<i64> {
        i64::from(day)
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|offset| self.base_date.checked_add(offset))
    }

    pub fn start_dates(&self) -> Result<Vec<i64>, ScheduleError> {
        (0..self.days)
            .map(|day| self.start_date(day).ok_or_else(|| self.out_of_range(day)))
            .collect()
    }

    /// Every order of the batch, or an error if any start or end date
    /// overflows.
    pub fn orders(&self) -> Result<Vec<OrderRecord>, ScheduleError> {
        (0..self.days)
            .map(|day| {
                self.start_date(day)
                    .and_then(|start| OrderRecord::new(start, &self.template))
                    .ok_or_else(|| self.out_of_range(day))
            })
            .collect()
    }

    fn out_of_range(&self, day: u32) -> ScheduleError {
        ScheduleError::DateOutOfRange {
            base_date: self.base_date,
            day,
        }
    }

    /// Order span in whole days, inclusive of the start day.
    pub fn span_days(&self) -> u32 {
        self.template.duration_days.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_covers_sixty_days() {
        let orders = OrderSchedule::default().orders().unwrap();
        assert_eq!(orders.len(), 60);
        assert_eq!(orders[0].start_date, 1_696_118_400);
        assert_eq!(orders[59].start_date, 1_696_118_400 + 59 * 86_400);
    }

    #[test]
    fn every_order_ends_six_days_after_start() {
        for order in OrderSchedule::default().orders().unwrap() {
            assert_eq!(order.end_date, order.start_date + 6 * 86_400);
            assert_eq!(order.amount, 1000);
            assert_eq!(order.price, 5);
            assert_eq!(order.direction, 0);
        }
    }

    #[test]
    fn start_dates_are_consecutive_days() {
        let schedule = OrderSchedule {
            base_date: 0,
            days: 4,
            template: OrderTemplate::default(),
        };
        assert_eq!(
            schedule.start_dates().unwrap(),
            vec![0, 86_400, 172_800, 259_200]
        );
    }

    #[test]
    fn inputs_follow_entry_point_order() {
        let order = OrderRecord::new(100, &OrderTemplate::default()).unwrap();
        assert_eq!(
            order.inputs(),
            [
                "1000".to_string(),
                "5".to_string(),
                "0".to_string(),
                "100".to_string(),
                (100 + 6 * 86_400).to_string(),
            ]
        );
    }

    #[test]
    fn end_date_overflow_is_an_error() {
        let schedule = OrderSchedule {
            base_date: i64::MAX - 10,
            days: 2,
            template: OrderTemplate::default(),
        };
        assert_eq!(
            schedule.orders(),
            Err(ScheduleError::DateOutOfRange {
                base_date: i64::MAX - 10,
                day: 0,
            })
        );
        assert!(OrderRecord::new(i64::MAX - 10, &OrderTemplate::default()).is_none());
    }

    #[test]
    fn start_date_overflow_is_an_error() {
        let schedule = OrderSchedule {
            base_date: i64::MAX - SECONDS_PER_DAY,
            days: 3,
            template: OrderTemplate {
                duration_days: 0,
                ..OrderTemplate::default()
            },
        };
        assert!(matches!(
            schedule.start_dates(),
            Err(ScheduleError::DateOutOfRange { day: 2, .. })
        ));
        assert!(matches!(
            schedule.orders(),
            Err(ScheduleError::DateOutOfRange { day: 2, .. })
        ));
    }

    #[test]
    fn last_representable_end_date_is_accepted() {
        let span = 6 * SECONDS_PER_DAY;
        let schedule = OrderSchedule {
            base_date: i64::MAX - span,
            days: 1,
            template: OrderTemplate::default(),
        };
        let orders = schedule.orders().unwrap();
        assert_eq!(orders[0].end_date, i64::MAX);
    }

    #[test]
    fn span_days_saturates() {
        let schedule = OrderSchedule {
            template: OrderTemplate {
                duration_days: u32::MAX,
                ..OrderTemplate::default()
            },
            ..OrderSchedule::default()
        };
        assert_eq!(schedule.span_days(), u32::MAX);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let schedule: OrderSchedule =
            serde_json::from_str(r#"{"days": 3, "template": {"price": 7}}"#).unwrap();
        assert_eq!(schedule.base_date, DEFAULT_BASE_DATE);
        assert_eq!(schedule.days, 3);
        assert_eq!(schedule.template.price, 7);
        assert_eq!(schedule.template.amount, DEFAULT_AMOUNT);
        assert_eq!(schedule.span_days(), 7);
    }
}
