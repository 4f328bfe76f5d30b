use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{format_system_time, phase::VisibleBattleStatus, validation::validate_video_url},
    state::{
        BattleRoom,
        battle::{BattleVideo, Participant, ParticipantStatus, Verdict},
    },
};

/// Payload used to create a brand-new battle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBattleRequest {
    /// Battle title shown in the feed.
    pub title: String,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// URL of the seed clip every participant must extend.
    pub reference_url: String,
    /// Title of the seed clip.
    pub reference_title: String,
    /// Points credited to the winner.
    pub prize_points: u32,
    /// Per-turn time limit; the configured default applies when omitted.
    #[serde(default)]
    pub turn_limit_minutes: Option<u64>,
    /// Users allowed to judge submissions (the organizer is always included).
    #[serde(default)]
    pub judges: Vec<Uuid>,
}

impl Validate for CreateBattleRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_text(&self.title, 120, "title") {
            errors.add("title", e);
        }

        if let Some(ref description) = self.description {
            if description.len() > 2000 {
                let mut err = ValidationError::new("description_length");
                err.message = Some("Description must be at most 2000 characters".into());
                errors.add("description", err);
            }
        }

        if let Err(e) = validate_video_url(&self.reference_url) {
            errors.add("reference_url", e);
        }

        if let Err(e) = validate_text(&self.reference_title, 200, "reference_title") {
            errors.add("reference_title", e);
        }

        if let Some(minutes) = self.turn_limit_minutes {
            if !(1..=1440).contains(&minutes) {
                let mut err = ValidationError::new("turn_limit_range");
                err.message = Some("Turn limit must be between 1 and 1440 minutes".into());
                errors.add("turn_limit_minutes", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload used to join a battle during registration.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinBattleRequest {
    /// Display name shown next to the rider's letters.
    pub display_name: String,
}

impl Validate for JoinBattleRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_text(&self.display_name, 64, "display_name") {
            errors.add("display_name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload carrying a turn submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitVideoRequest {
    /// Stored clip URL.
    pub url: String,
    /// Clip title.
    pub title: String,
}

impl Validate for SubmitVideoRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_video_url(&self.url) {
            errors.add("url", e);
        }

        if let Err(e) = validate_text(&self.title, 200, "title") {
            errors.add("title", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_text(value: &str, max: usize, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("empty");
        err.message = Some(format!("Field `{field}` must not be empty").into());
        return Err(err);
    }

    if value.len() > max {
        let mut err = ValidationError::new("too_long");
        err.message = Some(format!("Field `{field}` must be at most {max} characters").into());
        return Err(err);
    }

    Ok(())
}

/// Payload carrying a judge decision for a submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JudgeDecisionRequest {
    /// `true` approves the submission, `false` rejects it.
    pub approve: bool,
}

/// Payload declaring a winner outright (judge or organizer only).
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeclareWinnerRequest {
    /// User to crown; must be an active participant.
    pub winner_user_id: Uuid,
}

/// Public projection of the reference clip.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReferenceVideoSummary {
    /// Clip URL.
    pub url: String,
    /// Clip title.
    pub title: String,
}

/// Public projection of a participant and their letters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Registration identifier.
    pub id: Uuid,
    /// User behind the registration.
    pub user_id: Uuid,
    /// Display name.
    pub display_name: String,
    /// `active` or `eliminated`.
    pub status: ParticipantStatusSummary,
    /// Letters collected so far.
    pub letters: String,
    /// Join timestamp (RFC3339).
    pub joined_at: String,
}

/// Serialized participant status.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatusSummary {
    /// Still eligible for turns.
    Active,
    /// Out of the battle.
    Eliminated,
}

/// Judge decision recorded on a submission.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerdictSummary {
    /// Whether the submission was approved.
    pub approved: bool,
    /// Judge who decided; absent for a deadline expiry.
    pub judge_id: Option<Uuid>,
    /// Decision timestamp (RFC3339).
    pub decided_at: String,
}

/// Public projection of a turn submission.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoSummary {
    /// Submission identifier.
    pub id: Uuid,
    /// Participant who submitted.
    pub participant_id: Uuid,
    /// Turn sequence this submission answers.
    pub sequence: u32,
    /// Clip URL.
    pub url: String,
    /// Clip title.
    pub title: String,
    /// Pending when absent.
    pub verdict: Option<VerdictSummary>,
    /// Submission timestamp (RFC3339).
    pub submitted_at: String,
}

/// The active turn pointer of a battle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TurnSummary {
    /// Participant holding the turn.
    pub participant_id: Uuid,
    /// User behind the participant.
    pub user_id: Uuid,
    /// Turn deadline (RFC3339).
    pub deadline: String,
}

/// Full battle projection returned by every battle operation.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BattleSummary {
    /// Battle identifier.
    pub id: Uuid,
    /// Battle title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: VisibleBattleStatus,
    /// Organizer user id.
    pub organizer_id: Uuid,
    /// Current reference clip.
    pub reference_video: ReferenceVideoSummary,
    /// Winner prize.
    pub prize_points: u32,
    /// Per-turn limit in minutes.
    pub turn_limit_minutes: u64,
    /// Creation timestamp (RFC3339).
    pub created_at: String,
    /// Start timestamp (RFC3339), once started.
    pub started_at: Option<String>,
    /// Current turn sequence (0 before the battle starts).
    pub sequence: u32,
    /// Current turn pointer, while active.
    pub turn: Option<TurnSummary>,
    /// Winning user, once completed.
    pub winner_user_id: Option<Uuid>,
    /// Roster in rotation order.
    pub participants: Vec<ParticipantSummary>,
    /// Every submission made so far.
    pub videos: Vec<VideoSummary>,
}

/// Minimal projection of a battle when listed in the feed.
#[derive(Debug, Serialize, ToSchema)]
pub struct BattleListItem {
    /// Battle identifier.
    pub id: Uuid,
    /// Battle title.
    pub title: String,
    /// Lifecycle status.
    pub status: VisibleBattleStatus,
    /// Winner prize.
    pub prize_points: u32,
    /// Number of registered riders.
    pub participants: usize,
}

impl From<&Participant> for ParticipantSummary {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id,
            user_id: participant.user_id,
            display_name: participant.display_name.clone(),
            status: match participant.status {
                ParticipantStatus::Active => ParticipantStatusSummary::Active,
                ParticipantStatus::Eliminated => ParticipantStatusSummary::Eliminated,
            },
            letters: participant.letters.clone(),
            joined_at: format_system_time(participant.joined_at),
        }
    }
}

impl From<&Verdict> for VerdictSummary {
    fn from(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Approved { judge_id, at } => Self {
                approved: true,
                judge_id: Some(*judge_id),
                decided_at: format_system_time(*at),
            },
            Verdict::Rejected { judge_id, at } => Self {
                approved: false,
                judge_id: *judge_id,
                decided_at: format_system_time(*at),
            },
        }
    }
}

impl From<&BattleVideo> for VideoSummary {
    fn from(video: &BattleVideo) -> Self {
        Self {
            id: video.id,
            participant_id: video.participant_id,
            sequence: video.sequence,
            url: video.url.clone(),
            title: video.title.clone(),
            verdict: video.verdict.as_ref().map(Into::into),
            submitted_at: format_system_time(video.submitted_at),
        }
    }
}

impl From<&BattleRoom> for BattleSummary {
    fn from(room: &BattleRoom) -> Self {
        let battle = &room.battle;

        let turn = battle.turn.as_ref().and_then(|turn| {
            let participant = battle.participants.get(&turn.participant_id)?;
            Some(TurnSummary {
                participant_id: turn.participant_id,
                user_id: participant.user_id,
                deadline: format_system_time(turn.deadline),
            })
        });

        Self {
            id: battle.id,
            title: battle.title.clone(),
            description: battle.description.clone(),
            status: room.phase().into(),
            organizer_id: battle.organizer_id,
            reference_video: ReferenceVideoSummary {
                url: battle.reference_video.url.clone(),
                title: battle.reference_video.title.clone(),
            },
            prize_points: battle.prize_points,
            turn_limit_minutes: battle.turn_limit.as_secs() / 60,
            created_at: format_system_time(battle.created_at),
            started_at: battle.started_at.map(format_system_time),
            sequence: battle.sequence,
            turn,
            winner_user_id: battle.winner_user_id,
            participants: battle.participants.values().map(Into::into).collect(),
            videos: battle.videos.iter().map(Into::into).collect(),
        }
    }
}

impl From<&BattleRoom> for BattleListItem {
    fn from(room: &BattleRoom) -> Self {
        let battle = &room.battle;
        Self {
            id: battle.id,
            title: battle.title.clone(),
            status: room.phase().into(),
            prize_points: battle.prize_points,
            participants: battle.participants.len(),
        }
    }
}

