use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::match_day::clock::{live_minutes, SessionClock};
use crate::models::match_session::SquadMember;
use crate::models::player::display_name;

/// Bench waits longer than this many minutes are called out in the advice.
const LONG_BENCH_WAIT_MINUTES: i64 = 5;
/// Bench share of match time above this percentage is called out in the advice.
const HIGH_BENCH_SHARE_PERCENT: f64 = 30.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LivePlayerMinutes {
    pub player_id: Uuid,
    pub name: String,
    pub minutes: i64,
    pub bench_minutes: i64,
    pub on_pitch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_on_pitch_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_on_bench_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub player_out_id: Uuid,
    pub player_out_name: String,
    pub player_out_minutes: i64,
    pub player_in_id: Uuid,
    pub player_in_name: String,
    pub player_in_minutes: i64,
    pub bench_minutes: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RotationAdvice {
    pub recommendations: Vec<Recommendation>,
    pub players_on_pitch: Vec<LivePlayerMinutes>,
    pub players_on_bench: Vec<LivePlayerMinutes>,
}

/// Suggests who should come off next so playing time evens out across the squad.
pub struct RotationAdvisor<'a> {
    clock: &'a SessionClock,
}

impl<'a> RotationAdvisor<'a> {
    pub fn new(clock: &'a SessionClock) -> Self {
        Self { clock }
    }

    pub fn recommend(&self, squad: &[SquadMember], now: DateTime<Utc>) -> RotationAdvice {
        let match_minutes = self.clock.current_minute(now);
        let (mut on_pitch, mut on_bench): (Vec<_>, Vec<_>) = live_squad_minutes(self.clock, squad, now)
            .into_iter()
            .partition(|p| p.on_pitch);

        if match_minutes > 0 {
            let total = match_minutes as f64;
            for player in on_pitch.iter_mut() {
                player.time_on_pitch_percent = Some(player.minutes as f64 / total * 100.0);
            }
            for player in on_bench.iter_mut() {
                player.time_on_bench_percent = Some(player.bench_minutes as f64 / total * 100.0);
            }
        }

        on_pitch.sort_by(|a, b| b.minutes.cmp(&a.minutes));
        if match_minutes > 0 {
            on_bench.sort_by(|a, b| a.minutes.cmp(&b.minutes).then(b.bench_minutes.cmp(&a.bench_minutes)));
        } else {
            on_bench.sort_by(|a, b| a.minutes.cmp(&b.minutes));
        }

        let recommendations = match on_bench.first() {
            Some(candidate_in) => on_pitch
                .iter()
                .filter(|out| out.minutes >= candidate_in.minutes)
                .map(|out| Recommendation {
                    player_out_id: out.player_id,
                    player_out_name: out.name.clone(),
                    player_out_minutes: out.minutes,
                    player_in_id: candidate_in.player_id,
                    player_in_name: candidate_in.name.clone(),
                    player_in_minutes: candidate_in.minutes,
                    bench_minutes: candidate_in.bench_minutes,
                    reason: reason_text(out, candidate_in),
                })
                .collect(),
            None => Vec::new(),
        };

        RotationAdvice {
            recommendations,
            players_on_pitch: on_pitch,
            players_on_bench: on_bench,
        }
    }
}

fn reason_text(out: &LivePlayerMinutes, candidate_in: &LivePlayerMinutes) -> String {
    let mut reason = format!("{} has played {} minutes", out.name, out.minutes);
    if let Some(share) = out.time_on_pitch_percent {
        reason.push_str(&format!(" ({:.0}% of match time)", share));
    }
    reason.push_str(&format!(", while {} has only played {} minutes", candidate_in.name, candidate_in.minutes));
    if candidate_in.bench_minutes > LONG_BENCH_WAIT_MINUTES {
        reason.push_str(&format!(" and has been waiting on the bench for {} minutes", candidate_in.bench_minutes));
    }
    if let Some(share) = candidate_in.time_on_bench_percent {
        if share > HIGH_BENCH_SHARE_PERCENT {
            reason.push_str(&format!(" ({:.0}% of match time)", share));
        }
    }
    reason.push('.');
    reason
}

/// Live minutes per squad member. Bench time is the current run's minutes not spent playing.
pub fn live_squad_minutes(clock: &SessionClock, squad: &[SquadMember], now: DateTime<Utc>) -> Vec<LivePlayerMinutes> {
    let match_minutes = clock.current_minute(now);
    squad
        .iter()
        .map(|member| {
            let minutes = i64::from(live_minutes(
                member.minutes_played,
                member.is_on_pitch,
                member.last_substitution_time,
                now,
            ));
            let bench_minutes = if member.is_on_pitch { 0 } else { (match_minutes - minutes).max(0) };
            LivePlayerMinutes {
                player_id: member.player_id,
                name: display_name(&member.first_name, &member.last_name),
                minutes,
                bench_minutes,
                on_pitch: member.is_on_pitch,
                time_on_pitch_percent: None,
                time_on_bench_percent: None,
            }
        })
        .collect()
}
