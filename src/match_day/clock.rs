use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::match_session::MatchSession;

/// Fewest players on the pitch a match can kick off with.
pub const MIN_PLAYERS_ON_PITCH: usize = 5;

/// Below this many seconds the substitution countdown switches to seconds.
const CRITICAL_COUNTDOWN_SECS: i64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Match session is already running")]
    AlreadyActive,
    #[error("Match session is not active")]
    NotActive,
    #[error("You need at least {required} players on the pitch to start a match ({on_pitch} selected)")]
    NotEnoughPlayers { on_pitch: usize, required: usize },
    #[error("Period must be between 1 and {periods}")]
    InvalidPeriod { requested: i32, periods: i32 },
    #[error("Player coming off is not on the pitch")]
    PlayerNotOnPitch,
    #[error("Player coming on is not on the bench")]
    PlayerNotOnBench,
    #[error("A player cannot replace themselves")]
    SamePlayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubstitutionCountdown {
    pub value: i64,
    pub unit: &'static str,
    pub critical: bool,
}

/// Runtime clock state of a match session. `elapsed_time` holds the seconds
/// banked by earlier runs; `start_time` marks the beginning of the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    pub periods: i32,
    pub period_length: i32,
    pub substitution_interval: i32,
    pub is_active: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub current_period: i32,
    pub elapsed_time: i64,
    pub last_substitution: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    pub clock: SessionClock,
    /// Set when resuming moved the clock into a new period.
    pub advanced_to_period: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPlan {
    pub clock: SessionClock,
    pub run_seconds: i64,
    pub periods_completed: i64,
    pub match_complete: bool,
    /// The period that just finished, when the match continues afterwards.
    pub completed_period: Option<i64>,
}

impl StopPlan {
    pub fn message(&self) -> String {
        if self.match_complete {
            "Match complete! All periods have been played.".to_string()
        } else if let Some(done) = self.completed_period {
            format!("Period {} complete. Ready to start period {}.", done, done + 1)
        } else {
            "Match session stopped. Playing time has been recorded.".to_string()
        }
    }
}

fn whole_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0)
}

impl SessionClock {
    pub fn from_session(session: &MatchSession) -> Self {
        Self {
            periods: session.periods,
            period_length: session.period_length,
            substitution_interval: session.substitution_interval,
            is_active: session.is_active,
            start_time: session.start_time,
            current_period: session.current_period,
            elapsed_time: session.elapsed_time,
            last_substitution: session.last_substitution,
        }
    }

    fn period_seconds(&self) -> i64 {
        i64::from(self.period_length.max(1)) * 60
    }

    pub fn seconds_in_run(&self, now: DateTime<Utc>) -> i64 {
        self.start_time.map_or(0, |start| whole_seconds(start, now))
    }

    pub fn current_minute(&self, now: DateTime<Utc>) -> i64 {
        self.seconds_in_run(now) / 60
    }

    pub fn period_for_minute(&self, minute: i64) -> i32 {
        if self.periods <= 1 {
            return 1;
        }
        let period = minute / i64::from(self.period_length.max(1)) + 1;
        period.min(i64::from(self.periods)) as i32
    }

    pub fn minute_in_match(&self, now: DateTime<Utc>) -> i64 {
        (self.seconds_in_run(now) + self.elapsed_time) / 60
    }

    pub fn minutes_remaining_in_period(&self, now: DateTime<Utc>) -> i64 {
        let length = i64::from(self.period_length.max(1));
        length - self.current_minute(now) % length
    }

    /// Time until the next rotation, measured from the last substitution
    /// (or the start of the run when nobody has been substituted yet).
    pub fn next_substitution_countdown(&self, now: DateTime<Utc>) -> Option<SubstitutionCountdown> {
        if self.substitution_interval <= 0 {
            return None;
        }
        let anchor = self.last_substitution.or(self.start_time)?;
        let seconds = whole_seconds(anchor, now);
        let interval = i64::from(self.substitution_interval);
        let next_minute = (seconds / 60 / interval + 1) * interval;
        let remaining = next_minute * 60 - seconds;

        if remaining <= CRITICAL_COUNTDOWN_SECS {
            Some(SubstitutionCountdown { value: remaining, unit: "sec", critical: true })
        } else {
            Some(SubstitutionCountdown { value: (remaining + 59) / 60, unit: "min", critical: false })
        }
    }

    pub fn plan_start(&self, now: DateTime<Utc>, players_on_pitch: usize) -> Result<StartPlan, ClockError> {
        if self.is_active {
            return Err(ClockError::AlreadyActive);
        }
        if players_on_pitch < MIN_PLAYERS_ON_PITCH {
            return Err(ClockError::NotEnoughPlayers {
                on_pitch: players_on_pitch,
                required: MIN_PLAYERS_ON_PITCH,
            });
        }

        let mut clock = self.clone();
        let mut advanced_to_period = None;
        let period_secs = self.period_seconds();
        let total_secs = period_secs * i64::from(self.periods);
        let periods_completed = self.elapsed_time / period_secs;
        // Only a finished current period moves on; a period already set ahead is kept.
        if self.elapsed_time > 0
            && self.elapsed_time % period_secs == 0
            && self.elapsed_time < total_secs
            && self.current_period < self.periods
            && i64::from(self.current_period) <= periods_completed
        {
            clock.current_period += 1;
            advanced_to_period = Some(clock.current_period);
        }

        clock.is_active = true;
        clock.start_time = Some(now);
        clock.last_substitution = Some(now);
        Ok(StartPlan { clock, advanced_to_period })
    }

    pub fn plan_stop(&self, now: DateTime<Utc>) -> Result<StopPlan, ClockError> {
        if !self.is_active {
            return Err(ClockError::NotActive);
        }

        let mut clock = self.clone();
        let run_seconds = self.seconds_in_run(now);
        clock.elapsed_time += run_seconds;
        clock.is_active = false;

        let periods = i64::from(self.periods);
        let periods_completed = clock.elapsed_time / self.period_seconds();
        let match_complete = periods_completed >= periods;
        let mut completed_period = None;
        if !match_complete {
            clock.current_period = (periods_completed + 1).min(periods) as i32;
            if periods_completed > 0 {
                completed_period = Some(periods_completed);
            }
        }

        Ok(StopPlan { clock, run_seconds, periods_completed, match_complete, completed_period })
    }

    pub fn plan_set_period(&self, period: i32, now: DateTime<Utc>) -> Result<SessionClock, ClockError> {
        if period < 1 || period > self.periods {
            return Err(ClockError::InvalidPeriod { requested: period, periods: self.periods });
        }
        let mut clock = self.clone();
        clock.current_period = period;
        clock.elapsed_time = i64::from(period - 1) * self.period_seconds();
        clock.start_time = Some(now);
        clock.last_substitution = Some(now);
        Ok(clock)
    }

    /// Minute and period stamped on a substitution made at `now`.
    pub fn substitution_stamp(&self, now: DateTime<Utc>) -> (i32, i32) {
        let minute = self.current_minute(now);
        (minute as i32, self.period_for_minute(minute))
    }
}

/// Minutes on the pitch including the stint still running at `now`.
pub fn live_minutes(minutes_played: i32, is_on_pitch: bool, on_since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    match (is_on_pitch, on_since) {
        (true, Some(since)) => minutes_played + (whole_seconds(since, now) / 60) as i32,
        _ => minutes_played,
    }
}

/// Fold the running stint into the stored minutes. Bench rows are untouched.
pub fn bank_minutes(minutes_played: i32, is_on_pitch: bool, on_since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    live_minutes(minutes_played, is_on_pitch, on_since, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn clock(periods: i32, period_length: i32) -> SessionClock {
        SessionClock {
            periods,
            period_length,
            substitution_interval: 5,
            is_active: false,
            start_time: None,
            current_period: 1,
            elapsed_time: 0,
            last_substitution: None,
        }
    }

    #[test]
    fn start_requires_five_on_the_pitch() {
        let now = Utc::now();
        assert_eq!(
            clock(2, 25).plan_start(now, 4),
            Err(ClockError::NotEnoughPlayers { on_pitch: 4, required: 5 })
        );
        let plan = clock(2, 25).plan_start(now, 7).unwrap();
        assert!(plan.clock.is_active);
        assert_eq!(plan.clock.start_time, Some(now));
        assert_eq!(plan.clock.last_substitution, Some(now));
        assert_eq!(plan.advanced_to_period, None);
    }

    #[test]
    fn start_twice_is_refused() {
        let mut running = clock(2, 25);
        running.is_active = true;
        assert_eq!(running.plan_start(Utc::now(), 7), Err(ClockError::AlreadyActive));
    }

    #[test]
    fn resuming_on_a_period_boundary_advances_the_period() {
        let mut paused = clock(2, 25);
        paused.elapsed_time = 25 * 60;
        let plan = paused.plan_start(Utc::now(), 7).unwrap();
        assert_eq!(plan.clock.current_period, 2);
        assert_eq!(plan.advanced_to_period, Some(2));

        // Mid-period pause keeps the period
        paused.elapsed_time = 25 * 60 + 10;
        assert_eq!(paused.plan_start(Utc::now(), 7).unwrap().clock.current_period, 1);
    }

    #[test]
    fn period_chosen_before_kickoff_is_not_skipped() {
        let now = Utc::now();
        let second = clock(3, 20).plan_set_period(2, now).unwrap();
        assert!(!second.is_active);
        let plan = second.plan_start(now, 7).unwrap();
        assert_eq!(plan.clock.current_period, 2);
        assert_eq!(plan.advanced_to_period, None);
    }

    #[test]
    fn stop_on_a_boundary_then_start_stays_in_the_next_period() {
        let now = Utc::now();
        let mut running = clock(3, 20);
        running.is_active = true;
        running.start_time = Some(now - Duration::minutes(20));

        let stopped = running.plan_stop(now).unwrap().clock;
        assert_eq!(stopped.current_period, 2);
        let resumed = stopped.plan_start(now, 7).unwrap();
        assert_eq!(resumed.clock.current_period, 2);
        assert_eq!(resumed.advanced_to_period, None);
    }

    #[test]
    fn stop_banks_run_and_reports_completed_period() {
        let now = Utc::now();
        let mut running = clock(2, 25);
        running.is_active = true;
        running.start_time = Some(now - Duration::seconds(25 * 60 + 5));

        let plan = running.plan_stop(now).unwrap();
        assert_eq!(plan.run_seconds, 25 * 60 + 5);
        assert_eq!(plan.clock.elapsed_time, 25 * 60 + 5);
        assert_eq!(plan.periods_completed, 1);
        assert!(!plan.match_complete);
        assert_eq!(plan.clock.current_period, 2);
        assert_eq!(plan.completed_period, Some(1));
        assert!(!plan.clock.is_active);
        assert_eq!(plan.message(), "Period 1 complete. Ready to start period 2.");
    }

    #[test]
    fn stop_after_all_periods_completes_the_match() {
        let now = Utc::now();
        let mut running = clock(2, 25);
        running.is_active = true;
        running.current_period = 2;
        running.elapsed_time = 25 * 60;
        running.start_time = Some(now - Duration::minutes(26));

        let plan = running.plan_stop(now).unwrap();
        assert!(plan.match_complete);
        assert_eq!(plan.clock.current_period, 2);
        assert_eq!(plan.completed_period, None);
    }

    #[test]
    fn stop_when_idle_is_refused() {
        assert_eq!(clock(2, 25).plan_stop(Utc::now()), Err(ClockError::NotActive));
    }

    #[test]
    fn period_for_minute_is_capped() {
        let c = clock(2, 25);
        assert_eq!(c.period_for_minute(0), 1);
        assert_eq!(c.period_for_minute(25), 2);
        assert_eq!(c.period_for_minute(80), 2);
        assert_eq!(clock(1, 25).period_for_minute(40), 1);
    }

    #[test]
    fn set_period_rewrites_elapsed_time() {
        let now = Utc::now();
        let c = clock(3, 20).plan_set_period(3, now).unwrap();
        assert_eq!(c.current_period, 3);
        assert_eq!(c.elapsed_time, 2 * 20 * 60);
        assert_eq!(c.start_time, Some(now));
        assert_eq!(
            clock(3, 20).plan_set_period(4, now),
            Err(ClockError::InvalidPeriod { requested: 4, periods: 3 })
        );
        assert!(clock(3, 20).plan_set_period(0, now).is_err());
    }

    #[test]
    fn countdown_switches_to_seconds_near_the_interval() {
        let now = Utc::now();
        let mut c = clock(2, 25);
        c.start_time = Some(now - Duration::minutes(10));
        c.last_substitution = Some(now - Duration::seconds(4 * 60 + 40));
        assert_eq!(
            c.next_substitution_countdown(now),
            Some(SubstitutionCountdown { value: 20, unit: "sec", critical: true })
        );

        c.last_substitution = Some(now - Duration::seconds(90));
        assert_eq!(
            c.next_substitution_countdown(now),
            Some(SubstitutionCountdown { value: 4, unit: "min", critical: false })
        );

        c.substitution_interval = 0;
        assert_eq!(c.next_substitution_countdown(now), None);
    }

    #[test]
    fn countdown_falls_back_to_run_start() {
        let now = Utc::now();
        let mut c = clock(2, 25);
        c.start_time = Some(now - Duration::minutes(2));
        assert_eq!(c.next_substitution_countdown(now).map(|cd| cd.value), Some(3));
        c.start_time = None;
        assert_eq!(c.next_substitution_countdown(now), None);
    }

    #[test]
    fn minutes_remaining_and_match_minute() {
        let now = Utc::now();
        let mut c = clock(2, 25);
        c.elapsed_time = 25 * 60;
        c.start_time = Some(now - Duration::minutes(7));
        assert_eq!(c.minutes_remaining_in_period(now), 18);
        assert_eq!(c.minute_in_match(now), 32);
        assert_eq!(c.substitution_stamp(now), (7, 1));
    }

    #[test]
    fn banking_only_counts_whole_minutes_on_the_pitch() {
        let now = Utc::now();
        let since = Some(now - Duration::seconds(359));
        assert_eq!(bank_minutes(10, true, since, now), 15);
        assert_eq!(bank_minutes(10, false, since, now), 10);
        assert_eq!(live_minutes(3, true, None, now), 3);
    }
}
