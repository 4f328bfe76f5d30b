use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

/// Precondition violations raised by battle operations. These surface to the
/// caller unchanged so a client can explain exactly what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// The acting participant does not hold the current turn.
    #[error("it is not this participant's turn")]
    NotYourTurn,
    /// The current turn deadline has already passed.
    #[error("the turn deadline has expired")]
    DeadlineExpired,
    /// A submission already exists for the current turn.
    #[error("a video was already submitted for this turn")]
    DuplicateSubmission,
    /// The video has already received a judge decision.
    #[error("this video has already been judged")]
    AlreadyJudged,
    /// The acting user is not in the battle's judge roster.
    #[error("user is not a judge for this battle")]
    NotAJudge,
    /// The battle is not in the phase the operation requires.
    #[error("battle is not active")]
    BattleNotActive,
    /// The user already joined this battle.
    #[error("user already joined this battle")]
    AlreadyJoined,
    /// Starting a battle requires at least two registered riders.
    #[error("battle needs at least two participants to start")]
    InsufficientParticipants,
}

/// The clip every participant must extend, updated on each approved turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceVideo {
    /// URL of the current reference clip.
    pub url: String,
    /// Display title of the current reference clip.
    pub title: String,
}

/// Whether a participant is still in the running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    /// Still eligible for turns.
    Active,
    /// Collected the full elimination word; out of the battle.
    Eliminated,
}

/// A rider registered in a battle. Never deleted, even after elimination.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Stable identifier of this registration.
    pub id: Uuid,
    /// User the registration belongs to.
    pub user_id: Uuid,
    /// Display name resolved at join time.
    pub display_name: String,
    /// Active or eliminated.
    pub status: ParticipantStatus,
    /// Prefix of the elimination word accumulated on rejected turns.
    pub letters: String,
    /// When the user joined; join order doubles as rotation order.
    pub joined_at: SystemTime,
}

/// Judge decision (or expiry) recorded on a submission. Written exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The submission was approved and becomes the new reference clip.
    Approved {
        /// Judge who approved.
        judge_id: Uuid,
        /// Decision timestamp.
        at: SystemTime,
    },
    /// The submission was rejected, or the turn expired unjudged
    /// (`judge_id` is `None` for an expiry).
    Rejected {
        /// Judge who rejected, if any.
        judge_id: Option<Uuid>,
        /// Decision timestamp.
        at: SystemTime,
    },
}

/// A video submitted for one turn of a battle.
#[derive(Debug, Clone)]
pub struct BattleVideo {
    /// Stable identifier of the submission.
    pub id: Uuid,
    /// Participant who submitted.
    pub participant_id: Uuid,
    /// The battle sequence number this submission answers.
    pub sequence: u32,
    /// Stored clip URL (upload mechanics live elsewhere).
    pub url: String,
    /// Clip title.
    pub title: String,
    /// Pending (`None`) until judged or expired.
    pub verdict: Option<Verdict>,
    /// Submission timestamp.
    pub submitted_at: SystemTime,
}

impl BattleVideo {
    /// Whether a judge decision (or expiry) has been recorded.
    pub fn is_resolved(&self) -> bool {
        self.verdict.is_some()
    }
}

/// The single participant currently allowed to submit, and their deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    /// Participant holding the turn.
    pub participant_id: Uuid,
    /// Moment the turn expires.
    pub deadline: SystemTime,
}

/// Outcome of charging a rejection letter to a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterOutcome {
    /// Letters accumulated so far (prefix of the elimination word).
    pub letters: String,
    /// Whether this letter completed the word.
    pub eliminated: bool,
}

/// Aggregated state of one battle: metadata, roster, submissions, and the
/// mutable turn pointer. Lifecycle phase lives in the battle's state machine;
/// everything here is phase-agnostic data.
#[derive(Debug, Clone)]
pub struct Battle {
    /// Primary key of the battle.
    pub id: Uuid,
    /// Battle title shown in the feed.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// User who created the battle.
    pub organizer_id: Uuid,
    /// The clip to extend; replaced by each approved submission.
    pub reference_video: ReferenceVideo,
    /// Points credited to the winner on completion.
    pub prize_points: u32,
    /// Time each participant gets per turn.
    pub turn_limit: Duration,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
    /// Set when the organizer starts the battle.
    pub started_at: Option<SystemTime>,
    /// Roster keyed by participant id; insertion order is rotation order.
    pub participants: IndexMap<Uuid, Participant>,
    /// Every submission ever made, in submission order.
    pub videos: Vec<BattleVideo>,
    /// Monotonically increasing turn sequence, 1-based once started.
    pub sequence: u32,
    /// Current turn pointer; `None` outside the active phase.
    pub turn: Option<Turn>,
    /// Winning user, set exactly once on completion.
    pub winner_user_id: Option<Uuid>,
}

impl Battle {
    /// Build a fresh battle in registration, with no participants yet.
    pub fn new(
        title: String,
        description: Option<String>,
        organizer_id: Uuid,
        reference_video: ReferenceVideo,
        prize_points: u32,
        turn_limit: Duration,
    ) -> Self {
        let timestamp = SystemTime::now();

        Self {
            id: Uuid::new_v4(),
            title,
            description,
            organizer_id,
            reference_video,
            prize_points,
            turn_limit,
            created_at: timestamp,
            updated_at: timestamp,
            started_at: None,
            participants: IndexMap::new(),
            videos: Vec::new(),
            sequence: 0,
            turn: None,
            winner_user_id: None,
        }
    }

    /// Register a user. A user may appear in the roster at most once.
    pub fn join(&mut self, user_id: Uuid, display_name: String) -> Result<&Participant, BattleError> {
        if self
            .participants
            .values()
            .any(|participant| participant.user_id == user_id)
        {
            return Err(BattleError::AlreadyJoined);
        }

        let participant = Participant {
            id: Uuid::new_v4(),
            user_id,
            display_name,
            status: ParticipantStatus::Active,
            letters: String::new(),
            joined_at: SystemTime::now(),
        };
        let id = participant.id;
        self.updated_at = participant.joined_at;
        self.participants.insert(id, participant);

        Ok(&self.participants[&id])
    }

    /// Number of participants still eligible for turns.
    pub fn active_count(&self) -> usize {
        self.participants
            .values()
            .filter(|participant| participant.status == ParticipantStatus::Active)
            .count()
    }

    /// The last rider standing, if exactly one participant remains active.
    pub fn sole_active(&self) -> Option<&Participant> {
        let mut actives = self
            .participants
            .values()
            .filter(|participant| participant.status == ParticipantStatus::Active);
        let first = actives.next()?;
        match actives.next() {
            None => Some(first),
            Some(_) => None,
        }
    }

    /// Pick the next participant by rotation order: scan the roster in join
    /// order starting after `resolved` (wrapping), skipping eliminated riders
    /// and `resolved` itself. `None` from this method means no *other* active
    /// participant exists and the caller should finalize instead.
    pub fn next_participant_after(&self, resolved: Option<Uuid>) -> Option<Uuid> {
        let ids: Vec<Uuid> = self.participants.keys().copied().collect();
        if ids.is_empty() {
            return None;
        }

        let start = match resolved.and_then(|id| ids.iter().position(|&candidate| candidate == id))
        {
            Some(position) => position + 1,
            None => 0,
        };

        for offset in 0..ids.len() {
            let id = ids[(start + offset) % ids.len()];
            if Some(id) == resolved {
                continue;
            }
            let participant = &self.participants[&id];
            if participant.status == ParticipantStatus::Active {
                return Some(id);
            }
        }

        None
    }

    /// Point the turn at `participant_id` with a fresh deadline.
    pub fn begin_turn(&mut self, participant_id: Uuid, now: SystemTime) {
        self.turn = Some(Turn {
            participant_id,
            deadline: now + self.turn_limit,
        });
        self.updated_at = now;
    }

    /// Drop the turn pointer (terminal phases hold no turn).
    pub fn clear_turn(&mut self) {
        self.turn = None;
        self.updated_at = SystemTime::now();
    }

    /// Charge the next letter of `word` to a participant after a rejection.
    /// Completing the word eliminates the participant. Charging a letter to an
    /// already-eliminated participant is a no-op reporting `eliminated: true`.
    pub fn charge_letter(&mut self, participant_id: Uuid, word: &str) -> LetterOutcome {
        let Some(participant) = self.participants.get_mut(&participant_id) else {
            return LetterOutcome {
                letters: String::new(),
                eliminated: false,
            };
        };

        let already = participant.letters.chars().count();
        if let Some(next_letter) = word.chars().nth(already) {
            participant.letters.push(next_letter);
        }

        let eliminated = participant.letters.chars().count() >= word.chars().count();
        if eliminated {
            participant.status = ParticipantStatus::Eliminated;
        }
        self.updated_at = SystemTime::now();

        LetterOutcome {
            letters: self.participants[&participant_id].letters.clone(),
            eliminated,
        }
    }

    /// The unresolved submission for `sequence`, if one is awaiting judgment.
    /// Several resolved (rejected) attempts may share a sequence number, but
    /// at most one of them can be pending at a time.
    pub fn pending_video_for_sequence(&self, sequence: u32) -> Option<&BattleVideo> {
        self.videos
            .iter()
            .find(|video| video.sequence == sequence && !video.is_resolved())
    }

    /// Mutable access to a submission by id.
    pub fn video_mut(&mut self, video_id: Uuid) -> Option<&mut BattleVideo> {
        self.videos.iter_mut().find(|video| video.id == video_id)
    }

    /// Replace the reference clip with an approved submission.
    pub fn set_reference(&mut self, url: String, title: String) {
        self.reference_video = ReferenceVideo { url, title };
        self.updated_at = SystemTime::now();
    }

    /// User behind a participant registration.
    pub fn participant_user(&self, participant_id: Uuid) -> Option<Uuid> {
        self.participants
            .get(&participant_id)
            .map(|participant| participant.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD: &str = "FULL";

    fn battle_with_riders(count: usize) -> (Battle, Vec<Uuid>) {
        let mut battle = Battle::new(
            "rail combo".into(),
            None,
            Uuid::new_v4(),
            ReferenceVideo {
                url: "https://clips.example/seed.mp4".into(),
                title: "seed".into(),
            },
            500,
            Duration::from_secs(300),
        );

        let ids = (0..count)
            .map(|index| {
                battle
                    .join(Uuid::new_v4(), format!("rider-{index}"))
                    .unwrap()
                    .id
            })
            .collect();

        (battle, ids)
    }

    #[test]
    fn join_is_unique_per_user() {
        let (mut battle, _) = battle_with_riders(1);
        let user = battle.participants.values().next().unwrap().user_id;
        assert_eq!(
            battle.join(user, "again".into()).unwrap_err(),
            BattleError::AlreadyJoined
        );
    }

    #[test]
    fn rotation_follows_join_order() {
        let (battle, ids) = battle_with_riders(3);

        assert_eq!(battle.next_participant_after(None), Some(ids[0]));
        assert_eq!(battle.next_participant_after(Some(ids[0])), Some(ids[1]));
        assert_eq!(battle.next_participant_after(Some(ids[1])), Some(ids[2]));
        // Wraps back to the first rider.
        assert_eq!(battle.next_participant_after(Some(ids[2])), Some(ids[0]));
    }

    #[test]
    fn rotation_skips_eliminated_riders() {
        let (mut battle, ids) = battle_with_riders(3);
        battle.participants[&ids[1]].status = ParticipantStatus::Eliminated;

        assert_eq!(battle.next_participant_after(Some(ids[0])), Some(ids[2]));
        assert_eq!(battle.next_participant_after(Some(ids[2])), Some(ids[0]));
    }

    #[test]
    fn rotation_excludes_the_resolved_rider() {
        let (mut battle, ids) = battle_with_riders(2);
        battle.participants[&ids[1]].status = ParticipantStatus::Eliminated;

        // Only the resolved rider remains active: the caller must finalize.
        assert_eq!(battle.next_participant_after(Some(ids[0])), None);
    }

    #[test]
    fn letters_accumulate_until_elimination() {
        let (mut battle, ids) = battle_with_riders(2);

        for expected in ["F", "FU", "FUL"] {
            let outcome = battle.charge_letter(ids[0], WORD);
            assert_eq!(outcome.letters, expected);
            assert!(!outcome.eliminated);
            assert_eq!(
                battle.participants[&ids[0]].status,
                ParticipantStatus::Active
            );
        }

        let outcome = battle.charge_letter(ids[0], WORD);
        assert_eq!(outcome.letters, "FULL");
        assert!(outcome.eliminated);
        assert_eq!(
            battle.participants[&ids[0]].status,
            ParticipantStatus::Eliminated
        );
    }

    #[test]
    fn charging_an_eliminated_rider_does_not_grow_letters() {
        let (mut battle, ids) = battle_with_riders(2);
        for _ in 0..4 {
            battle.charge_letter(ids[0], WORD);
        }

        let outcome = battle.charge_letter(ids[0], WORD);
        assert_eq!(outcome.letters, "FULL");
        assert!(outcome.eliminated);
    }

    #[test]
    fn sole_active_detects_the_last_rider() {
        let (mut battle, ids) = battle_with_riders(3);
        assert!(battle.sole_active().is_none());

        battle.participants[&ids[0]].status = ParticipantStatus::Eliminated;
        battle.participants[&ids[2]].status = ParticipantStatus::Eliminated;

        assert_eq!(battle.sole_active().unwrap().id, ids[1]);
    }
}
