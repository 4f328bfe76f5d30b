/// Achievement progress engine.
pub mod achievement_service;
/// Battle lifecycle operations.
pub mod battle_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Winner detection and completion side effects.
pub mod finalizer;
/// Health check service.
pub mod health_service;
/// Submission and judgment pipeline.
pub mod judgment_service;
/// Retry supervisor for failed point credits.
pub mod ledger_supervisor;
/// Turn rotation and deadline expiry handling.
pub mod scheduler;
/// Scored feed event dispatcher.
pub mod scoring_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::{
        config::AppConfig,
        dao::memory::{InMemoryJudgeRoster, InMemoryLedger, LogNotifier},
        dto::battle::{CreateBattleRequest, JoinBattleRequest, SubmitVideoRequest},
        state::{AppState, SharedState},
    };

    use super::battle_service;

    pub fn test_state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(InMemoryLedger::new()),
            Arc::new(LogNotifier::new()),
            Arc::new(InMemoryJudgeRoster::new()),
        )
    }

    pub fn test_battle_request() -> CreateBattleRequest {
        CreateBattleRequest {
            title: "ledge battle".into(),
            description: None,
            reference_url: "https://clips.example/seed.mp4".into(),
            reference_title: "seed clip".into(),
            prize_points: 500,
            turn_limit_minutes: Some(5),
            judges: Vec::new(),
        }
    }

    pub fn join_request(name: &str) -> JoinBattleRequest {
        JoinBattleRequest {
            display_name: name.into(),
        }
    }

    pub fn submit_request(url: &str, title: &str) -> SubmitVideoRequest {
        SubmitVideoRequest {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Create a battle, register `riders` users, and start it. Returns the
    /// battle id, the organizer, and the rider user ids in join order.
    pub async fn started_battle(
        state: &SharedState,
        riders: usize,
    ) -> (Uuid, Uuid, Vec<Uuid>) {
        let organizer = Uuid::new_v4();
        let summary = battle_service::create_battle(state, organizer, test_battle_request())
            .await
            .unwrap();
        let battle_id = summary.id;

        let mut users = Vec::new();
        for index in 0..riders {
            let user = Uuid::new_v4();
            battle_service::join_battle(state, battle_id, user, join_request(&format!("rider-{index}")))
                .await
                .unwrap();
            users.push(user);
        }

        battle_service::start_battle(state, battle_id, organizer)
            .await
            .unwrap();

        (battle_id, organizer, users)
    }
}
