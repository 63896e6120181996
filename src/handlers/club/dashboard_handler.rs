use actix_web::{web, HttpResponse, Result};
use sqlx::PgPool;

use crate::db::helpers::db_result;
use crate::db::match_queries::MatchQueries;
use crate::db::stats_queries::StatsQueries;
use crate::middleware::auth::{require_approved, Claims};
use crate::models::common::ApiResponse;
use crate::models::football_match::MatchView;
use crate::models::stats::DashboardSummary;
use crate::ok_or_return;

const RECENT_MATCHES: i64 = 5;

pub async fn dashboard(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> Result<HttpResponse> {
    ok_or_return!(require_approved(&claims));
    let (total_teams, total_players, total_matches) =
        ok_or_return!(db_result(StatsQueries::new(pool.get_ref().clone()).totals().await));
    let recent = ok_or_return!(db_result(
        MatchQueries::new(pool.get_ref().clone()).list(Some(RECENT_MATCHES)).await
    ));

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Dashboard",
        DashboardSummary {
            total_teams,
            total_players,
            total_matches,
            recent_matches: recent.into_iter().map(MatchView::from).collect(),
        },
    )))
}
