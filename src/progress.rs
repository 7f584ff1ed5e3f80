/*
XP, levels and daily streaks.
Kept free of store concerns so the rules can be tested on their own.
*/

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{day_key, parse_day_key};

// XP needed to enter level n is XP_STEP * n * (n - 1) / 2:
// level 1 at 0, level 2 at 100, level 3 at 300, level 4 at 600 ...
const XP_STEP: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Progress {
    pub xp: u64,
    pub streak_days: u32,
    pub best_streak: u32,
    pub last_active_day: Option<String>, // "YYYY-MM-DD"
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LevelInfo {
    pub level: u32,
    pub xp: u64,
    pub xp_into_level: u64,
    pub xp_for_next: u64,
}

fn threshold(level: u32) -> u128 {
    let n = u128::from(level.max(1));
    u128::from(XP_STEP) * n * (n - 1) / 2
}

/// XP needed to enter `level`, capped at `u64::MAX`.
pub fn xp_for_level(level: u32) -> u64 {
    u64::try_from(threshold(level)).unwrap_or(u64::MAX)
}

pub fn level_for_xp(xp: u64) -> u32 {
    let xp = u128::from(xp);
    // solve n(n-1)/2 = xp/XP_STEP, then settle float rounding
    let steps = (xp / u128::from(XP_STEP)) as f64;
    let mut level = ((1.0 + (1.0 + 8.0 * steps).sqrt()) / 2.0) as u32;
    level = level.max(1);
    while level > 1 && threshold(level) > xp {
        level -= 1;
    }
    while threshold(level.saturating_add(1)) <= xp {
        level += 1;
    }
    level
}

impl Progress {
    pub fn level(&self) -> LevelInfo {
        let level = level_for_xp(self.xp);
        let floor = xp_for_level(level);
        LevelInfo {
            level,
            xp: self.xp,
            xp_into_level: self.xp - floor,
            xp_for_next: xp_for_level(level.saturating_add(1)) - self.xp,
        }
    }

    /// Adds XP earned on `date` and advances the streak.
    ///
    /// Same day keeps the streak, the following day extends it, anything
    /// else (a gap, or a date before the last active one) starts over at 1.
    pub fn record(&mut self, amount: u64, date: NaiveDate) {
        self.xp = self.xp.saturating_add(amount);

        let last = self.last_active_day.as_deref().and_then(parse_day_key);
        match last {
            Some(last) if last == date => {}
            Some(last) if last.succ_opt() == Some(date) => {
                self.streak_days += 1;
                self.last_active_day = Some(day_key(date));
            }
            _ => {
                self.streak_days = 1;
                self.last_active_day = Some(day_key(date));
            }
        }
        self.best_streak = self.best_streak.max(self.streak_days);
    }
}
