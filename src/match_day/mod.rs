//! Live match-day engine: session clock arithmetic, rotation advice and
//! squad import. Everything here is a pure function of the stored session
//! state and the caller's `now`.

pub mod clock;
pub mod rotation;
pub mod squad;

pub use clock::{bank_minutes, ClockError, SessionClock, StartPlan, StopPlan, SubstitutionCountdown, MIN_PLAYERS_ON_PITCH};
pub use rotation::{live_squad_minutes, LivePlayerMinutes, Recommendation, RotationAdvice, RotationAdvisor};
pub use squad::{split_squad, LineupEntry, SquadSplit, DEFAULT_STARTERS};
