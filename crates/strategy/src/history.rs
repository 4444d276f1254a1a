use std::collections::VecDeque;

use common::{Error, Result};

/// Last digit of `price` rendered to two decimal places.
///
/// `1.236` renders as `1.24`, so the digit is `4`. A price exactly halfway
/// between two cents rounds away from zero (`1.125` renders as `1.13`), the
/// same way the dashboard's `toFixed(2)` does.
/// Returns `None` for non-finite input.
pub fn last_digit(price: f64) -> Option<u8> {
    if !price.is_finite() {
        return None;
    }
    if is_cent_tie(price) {
        // Exact in three places, and a tie's cent digit is always 2 or 7.
        let hundredths = format!("{:.3}", price.abs()).chars().rev().nth(1)?.to_digit(10)?;
        return Some(((hundredths + 1) % 10) as u8);
    }
    format!("{price:.2}")
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

/// Whether `price` sits exactly on a half cent.
///
/// A double equal to `(2n + 1) / 200` must be a dyadic rational, which makes
/// it an odd multiple of 1/8. Scaling by 8 is exact.
fn is_cent_tie(price: f64) -> bool {
    let eighths = price * 8.0;
    eighths.fract() == 0.0 && eighths % 2.0 != 0.0
}

/// Rolling windows of recent prices and their last digits.
///
/// Both windows are pushed and evicted together, so they always hold the
/// same number of entries.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    prices: VecDeque<f64>,
    digits: VecDeque<u8>,
    capacity: usize,
}

impl HistoryTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            prices: VecDeque::new(),
            digits: VecDeque::new(),
            capacity,
        }
    }

    /// Record one price. Returns the derived digit.
    /// A non-finite price is rejected and leaves both windows untouched.
    pub fn update(&mut self, price: f64) -> Result<u8> {
        let digit = last_digit(price)
            .ok_or_else(|| Error::MalformedTick(format!("price is not a finite number: {price}")))?;

        self.prices.push_back(price);
        self.digits.push_back(digit);
        while self.prices.len() > self.capacity {
            self.prices.pop_front();
            self.digits.pop_front();
        }
        Ok(digit)
    }

    /// The two most recent digits, oldest first.
    pub fn last_two_digits(&self) -> Option<(u8, u8)> {
        let n = self.digits.len();
        if n < 2 {
            return None;
        }
        Some((self.digits[n - 2], self.digits[n - 1]))
    }

    pub fn prices(&self) -> &VecDeque<f64> {
        &self.prices
    }

    pub fn digits(&self) -> &VecDeque<u8> {
        &self.digits
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_digit_rounds_to_two_places() {
        assert_eq!(last_digit(1.236), Some(4));
        assert_eq!(last_digit(10.0), Some(0));
        assert_eq!(last_digit(10.02), Some(2));
        assert_eq!(last_digit(1234.5), Some(0));
        assert_eq!(last_digit(-3.17), Some(7));
    }

    #[test]
    fn half_cent_ties_round_away_from_zero() {
        assert_eq!(last_digit(1.125), Some(3));
        assert_eq!(last_digit(1.375), Some(8));
        assert_eq!(last_digit(2.875), Some(8));
        assert_eq!(last_digit(0.625), Some(3));
        assert_eq!(last_digit(-1.125), Some(3));
        assert_eq!(last_digit(1234.125), Some(3));
    }

    #[test]
    fn near_ties_follow_the_exact_binary_value() {
        // 1.005 and 2.675 are stored slightly below the half cent
        assert_eq!(last_digit(1.005), Some(0));
        assert_eq!(last_digit(2.675), Some(7));
        // Quarters land on a cent exactly
        assert_eq!(last_digit(1.25), Some(5));
        assert_eq!(last_digit(3.75), Some(5));
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut history = HistoryTracker::new(usize::MAX);
        history.update(7.77).unwrap();
        history.update(7.87).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.last_two_digits(), Some((7, 7)));
    }

    #[test]
    fn last_digit_rejects_non_finite() {
        assert_eq!(last_digit(f64::NAN), None);
        assert_eq!(last_digit(f64::INFINITY), None);
        assert_eq!(last_digit(f64::NEG_INFINITY), None);
    }

    #[test]
    fn windows_stay_bounded_and_aligned() {
        let mut history = HistoryTracker::new(3);
        for price in [1.01, 1.02, 1.03, 1.04, 1.05] {
            history.update(price).unwrap();
            assert!(history.len() <= 3);
            assert_eq!(history.prices().len(), history.digits().len());
        }
        // Oldest entries evicted first
        assert_eq!(history.prices().iter().copied().collect::<Vec<_>>(), vec![1.03, 1.04, 1.05]);
        assert_eq!(history.digits().iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn malformed_price_leaves_history_untouched() {
        let mut history = HistoryTracker::new(10);
        history.update(5.55).unwrap();

        let err = history.update(f64::NAN).unwrap_err();
        assert!(matches!(err, Error::MalformedTick(_)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.digits().len(), 1);
        assert_eq!(history.prices().back(), Some(&5.55));
    }

    #[test]
    fn last_two_digits_needs_two_entries() {
        let mut history = HistoryTracker::new(10);
        assert_eq!(history.last_two_digits(), None);
        history.update(2.33).unwrap();
        assert_eq!(history.last_two_digits(), None);
        history.update(2.43).unwrap();
        assert_eq!(history.last_two_digits(), Some((3, 3)));
    }
}
