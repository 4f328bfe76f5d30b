//! Application-level configuration loading, including the achievement catalog
//! seed and the scoring tariff.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::achievements::{Achievement, AchievementCategory};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRICK_BATTLE_BACK_CONFIG_PATH";
/// Elimination word used when the config does not provide one.
const DEFAULT_ELIMINATION_WORD: &str = "FULL";
/// Per-turn time limit used when a battle does not specify one.
const DEFAULT_TURN_LIMIT_MINUTES: u64 = 5;
/// How often the deadline sweeper scans for expired turns.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Points credited for each scored feed event.
#[derive(Debug, Clone, Deserialize)]
pub struct PointsTariff {
    /// Points for a like received.
    pub like: u32,
    /// Points for a comment posted.
    pub comment: u32,
    /// Points for a view received.
    pub view: u32,
    /// Points for uploading a video.
    pub upload: u32,
    /// Points for winning the daily contest.
    pub daily_winner: u32,
}

impl Default for PointsTariff {
    fn default() -> Self {
        Self {
            like: 5,
            comment: 2,
            view: 1,
            upload: 10,
            daily_winner: 100,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    elimination_word: String,
    default_turn_limit: Duration,
    sweep_interval: Duration,
    tariff: PointsTariff,
    achievements: Vec<Achievement>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in
    /// defaults when the file is missing or broken.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        achievements = app_config.achievements.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// The elimination word riders spell out on rejected turns.
    pub fn elimination_word(&self) -> &str {
        &self.elimination_word
    }

    /// Turn limit applied when a battle is created without one.
    pub fn default_turn_limit(&self) -> Duration {
        self.default_turn_limit
    }

    /// Interval between deadline sweeper passes.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Scoring tariff for feed events.
    pub fn tariff(&self) -> &PointsTariff {
        &self.tariff
    }

    /// Achievement catalog seed.
    pub fn achievements(&self) -> Vec<Achievement> {
        self.achievements.clone()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            elimination_word: DEFAULT_ELIMINATION_WORD.into(),
            default_turn_limit: Duration::from_secs(DEFAULT_TURN_LIMIT_MINUTES * 60),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            tariff: PointsTariff::default(),
            achievements: default_achievements(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    elimination_word: Option<String>,
    #[serde(default)]
    turn_limit_minutes: Option<u64>,
    #[serde(default)]
    sweep_interval_secs: Option<u64>,
    #[serde(default)]
    points: Option<PointsTariff>,
    #[serde(default)]
    achievements: Option<Vec<RawAchievement>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            elimination_word: value
                .elimination_word
                .filter(|word| !word.trim().is_empty())
                .unwrap_or(defaults.elimination_word),
            default_turn_limit: value
                .turn_limit_minutes
                .filter(|minutes| *minutes > 0)
                .map(|minutes| Duration::from_secs(minutes * 60))
                .unwrap_or(defaults.default_turn_limit),
            sweep_interval: value
                .sweep_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            tariff: value.points.unwrap_or(defaults.tariff),
            achievements: value
                .achievements
                .map(|raw| raw.into_iter().map(Into::into).collect())
                .unwrap_or(defaults.achievements),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of one achievement entry inside the configuration file.
struct RawAchievement {
    title: String,
    category: AchievementCategory,
    target_value: u64,
    reward_points: u32,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<RawAchievement> for Achievement {
    fn from(value: RawAchievement) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: value.title,
            category: value.category,
            target_value: value.target_value,
            reward_points: value.reward_points,
            is_active: value.is_active,
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn achievement(
    title: &str,
    category: AchievementCategory,
    target_value: u64,
    reward_points: u32,
) -> Achievement {
    Achievement {
        id: Uuid::new_v4(),
        title: title.into(),
        category,
        target_value,
        reward_points,
        is_active: true,
    }
}

/// Built-in achievement catalog used when the config file provides none.
fn default_achievements() -> Vec<Achievement> {
    use AchievementCategory::*;

    vec![
        achievement("First Clip", VideosUploaded, 1, 50),
        achievement("Ten Clips", VideosUploaded, 10, 200),
        achievement("Bronze Likes", LikesReceived, 10, 100),
        achievement("Silver Likes", LikesReceived, 50, 250),
        achievement("Gold Likes", LikesReceived, 250, 1_000),
        achievement("Thousand Views", ViewsReceived, 1_000, 150),
        achievement("First Win", Wins, 1, 300),
        achievement("Champion", Wins, 5, 1_500),
        achievement("Week Streak", LikeStreak, 7, 200),
        achievement("First Comment", CommentsPosted, 1, 25),
        achievement("Daily Star", DailyWinner, 1, 150),
    ]
}
