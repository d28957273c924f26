//! Progress engine facade.
//!
//! Wires the workout log to the derived collections. Logging a workout runs
//! the synchronous pipeline (persist, detect records, sync badges) while
//! holding a per-user lock, so two requests for the same user never
//! interleave their read-check-write steps. Requests for different users
//! never wait on each other. Goals and leaderboards are computed on read.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::badges::{BadgeManager, BadgeStatus, EarnedBadge};
use crate::error::EngineError;
use crate::goals::{Goal, GoalEvaluation, GoalKind, GoalManager, GoalStatus};
use crate::leaderboards::{
    Leaderboard, LeaderboardEntry, LeaderboardMetric, LeaderboardScope, LeaderboardService,
};
use crate::plans::{Difficulty, PlanManager, PlanType, TrainingPlan};
use crate::records::{PersonalRecord, RecordDetector};
use crate::social::{
    Challenge, ChallengeManager, ChallengeParticipant, FollowGraph, NewChallenge,
};
use crate::storage::{AppConfig, Database, DatabaseError, EngineSettings, WriteOutcome};
use crate::workouts::{TimeRange, Window, WorkoutRecord};

/// Everything a logged workout changed.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutOutcome {
    pub workout: WorkoutRecord,
    pub new_records: Vec<PersonalRecord>,
    pub new_badges: Vec<EarnedBadge>,
}

/// Result of completing a plan workout.
#[derive(Debug, Clone, Serialize)]
pub struct PlanCompletion {
    pub plan: TrainingPlan,
    /// False when the workout was already marked done
    pub newly_completed: bool,
}

/// The progress and achievement engine.
pub struct ProgressEngine {
    db: Arc<Database>,
    settings: EngineSettings,
    user_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ProgressEngine {
    /// Create an engine over an open database and seed badge definitions.
    pub fn new(db: Arc<Database>, settings: EngineSettings) -> Result<Self, EngineError> {
        let engine = Self {
            db,
            settings,
            user_locks: Mutex::new(HashMap::new()),
        };
        engine.badges().initialize_badges()?;
        Ok(engine)
    }

    /// Open the database configured in `config`.
    pub fn open(config: &AppConfig) -> Result<Self, EngineError> {
        let db = Database::open(&config.database_path())?;
        Self::new(Arc::new(db), config.engine.clone())
    }

    /// Engine over a fresh in-memory database.
    pub fn in_memory(settings: EngineSettings) -> Result<Self, EngineError> {
        Self::new(Arc::new(Database::open_in_memory()?), settings)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(user_id).or_default().clone()
    }

    /// Drop the map entry once no other caller holds or waits on it.
    fn release_user_lock(&self, user_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One count for the map, one for `lock`
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
    }

    fn with_user_lock<T>(&self, user_id: Uuid, f: impl FnOnce() -> T) -> T {
        let lock = self.user_lock(user_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release_user_lock(user_id, lock);
        result
    }

    fn goals(&self) -> GoalManager<'_> {
        GoalManager::new(&self.db, self.settings.utc_offset())
    }

    fn badges(&self) -> BadgeManager {
        BadgeManager::new(self.db.clone(), self.settings.utc_offset())
    }

    fn records(&self) -> RecordDetector {
        RecordDetector::new(self.db.clone(), self.settings.race_distance_tolerance_percent)
    }

    fn leaderboards(&self) -> LeaderboardService {
        LeaderboardService::new(
            self.db.clone(),
            self.settings.utc_offset(),
            self.settings.leaderboard_limit,
        )
    }

    fn plans(&self) -> PlanManager {
        PlanManager::new(
            self.db.clone(),
            self.settings.utc_offset(),
            self.settings.plan_grace_days,
        )
    }

    fn follows(&self) -> FollowGraph {
        FollowGraph::new(self.db.clone())
    }

    fn challenges(&self) -> ChallengeManager {
        ChallengeManager::new(self.db.clone(), self.settings.utc_offset())
    }

    // ========== Workouts ==========

    /// Commit a workout and update records and badges.
    pub fn log_workout(
        &self,
        workout: WorkoutRecord,
        now: DateTime<Utc>,
    ) -> Result<WorkoutOutcome, EngineError> {
        workout.validate()?;

        self.with_user_lock(workout.user_id, || {
            self.db.insert_workout(&workout)?;
            debug!(workout_id = %workout.id, user_id = %workout.user_id, kind = %workout.kind(), "Workout logged");
            self.derive(workout, now)
        })
    }

    /// Replace a workout's contents. Derived records are only ever raised.
    pub fn update_workout(
        &self,
        workout: WorkoutRecord,
        now: DateTime<Utc>,
    ) -> Result<WorkoutOutcome, EngineError> {
        workout.validate()?;

        self.with_user_lock(workout.user_id, || {
            self.db.update_workout(&workout).map_err(|e| match e {
                DatabaseError::NotFound(_) => EngineError::NotFound {
                    entity: "Workout",
                    id: workout.id,
                },
                other => other.into(),
            })?;
            self.derive(workout, now)
        })
    }

    fn derive(&self, workout: WorkoutRecord, now: DateTime<Utc>) -> Result<WorkoutOutcome, EngineError> {
        let new_records = self.records().detect(&workout)?;
        let new_badges = self.badges().sync(workout.user_id, now)?;

        if !new_records.is_empty() || !new_badges.is_empty() {
            info!(
                user_id = %workout.user_id,
                records = new_records.len(),
                badges = new_badges.len(),
                "Workout produced new achievements"
            );
        }

        Ok(WorkoutOutcome {
            workout,
            new_records,
            new_badges,
        })
    }

    pub fn get_workout(&self, workout_id: Uuid, requester: Uuid) -> Result<WorkoutRecord, EngineError> {
        match self.db.get_workout(&workout_id)? {
            Some(workout) if workout.user_id == requester => Ok(workout),
            _ => Err(EngineError::NotFound {
                entity: "Workout",
                id: workout_id,
            }),
        }
    }

    /// Delete a workout. Records and badges it produced are kept.
    pub fn delete_workout(&self, workout_id: Uuid, requester: Uuid) -> Result<(), EngineError> {
        let deleted = self.with_user_lock(requester, || self.db.delete_workout(&workout_id, &requester))?;
        if !deleted {
            return Err(EngineError::NotFound {
                entity: "Workout",
                id: workout_id,
            });
        }
        Ok(())
    }

    // ========== Goals ==========

    pub fn create_goal(
        &self,
        user_id: Uuid,
        kind: GoalKind,
        target: f64,
        end_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Goal, EngineError> {
        Ok(self.goals().create(user_id, kind, target, end_at, now)?)
    }

    pub fn evaluate_goal(
        &self,
        goal_id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<GoalEvaluation, EngineError> {
        Ok(self.goals().evaluate(goal_id, requester, now)?)
    }

    pub fn list_goals(
        &self,
        user_id: Uuid,
        status_filter: Option<GoalStatus>,
        now: DateTime<Utc>,
    ) -> Result<Vec<GoalEvaluation>, EngineError> {
        Ok(self.goals().list(user_id, status_filter, now)?)
    }

    pub fn delete_goal(&self, goal_id: Uuid, requester: Uuid) -> Result<(), EngineError> {
        Ok(self.goals().delete(goal_id, requester)?)
    }

    // ========== Badges and records ==========

    /// Award every badge the user now qualifies for.
    pub fn sync_badges(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<EarnedBadge>, EngineError> {
        Ok(self.with_user_lock(user_id, || self.badges().sync(user_id, now))?)
    }

    pub fn list_badges(&self, user_id: Uuid) -> Result<Vec<BadgeStatus>, EngineError> {
        Ok(self.badges().list_badges(user_id)?)
    }

    /// Run record detection for an already committed workout.
    pub fn detect_records(&self, workout: &WorkoutRecord) -> Result<Vec<PersonalRecord>, EngineError> {
        Ok(self.with_user_lock(workout.user_id, || self.records().detect(workout))?)
    }

    pub fn list_records(&self, user_id: Uuid) -> Result<Vec<PersonalRecord>, EngineError> {
        Ok(self.records().list(user_id)?)
    }

    // ========== Leaderboards ==========

    /// Leaderboard for a relative period.
    pub fn get_leaderboard(
        &self,
        scope: LeaderboardScope,
        metric: LeaderboardMetric,
        period: TimeRange,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Leaderboard, EngineError> {
        let window = period.window(now, self.settings.utc_offset());
        self.get_leaderboard_for(scope, metric, &window, requester)
    }

    /// Leaderboard for an explicit window.
    pub fn get_leaderboard_for(
        &self,
        scope: LeaderboardScope,
        metric: LeaderboardMetric,
        window: &Window,
        requester: Uuid,
    ) -> Result<Leaderboard, EngineError> {
        Ok(self
            .leaderboards()
            .get_leaderboard(scope, metric, window, requester)?)
    }

    // ========== Training plans ==========

    pub fn generate_plan(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        difficulty: Difficulty,
        duration_weeks: u32,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, EngineError> {
        Ok(self
            .plans()
            .generate(user_id, plan_type, difficulty, duration_weeks, start_date, now)?)
    }

    pub fn get_plan(
        &self,
        plan_id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, EngineError> {
        Ok(self.plans().get(plan_id, requester, now)?)
    }

    pub fn list_plans(&self, user_id: Uuid) -> Result<Vec<TrainingPlan>, EngineError> {
        Ok(self.plans().list_for_user(user_id)?)
    }

    /// Mark a plan workout done.
    pub fn complete_workout(
        &self,
        plan_id: Uuid,
        requester: Uuid,
        week_number: u32,
        day: Weekday,
        now: DateTime<Utc>,
    ) -> Result<PlanCompletion, EngineError> {
        let (plan, outcome) =
            self.plans()
                .complete_workout(plan_id, requester, week_number, day, now)?;
        Ok(PlanCompletion {
            plan,
            newly_completed: outcome == WriteOutcome::Applied,
        })
    }

    pub fn set_current_week(
        &self,
        plan_id: Uuid,
        requester: Uuid,
        week_number: u32,
        now: DateTime<Utc>,
    ) -> Result<TrainingPlan, EngineError> {
        Ok(self
            .plans()
            .set_current_week(plan_id, requester, week_number, now)?)
    }

    // ========== Social ==========

    pub fn follow(
        &self,
        follower: Uuid,
        followee: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, EngineError> {
        Ok(self.follows().follow(follower, followee, now)?)
    }

    pub fn unfollow(&self, follower: Uuid, followee: Uuid) -> Result<bool, EngineError> {
        Ok(self.follows().unfollow(follower, followee)?)
    }

    pub fn followees(&self, user_id: Uuid) -> Result<Vec<Uuid>, EngineError> {
        Ok(self.follows().followees(user_id)?)
    }

    pub fn create_challenge(
        &self,
        created_by: Uuid,
        challenge: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Challenge, EngineError> {
        Ok(self.challenges().create_challenge(created_by, challenge, now)?)
    }

    pub fn join_challenge(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome, EngineError> {
        Ok(self.challenges().join_challenge(challenge_id, user_id, now)?)
    }

    pub fn sync_challenge_progress(
        &self,
        challenge_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChallengeParticipant, EngineError> {
        Ok(self.with_user_lock(user_id, || {
            self.challenges().sync_progress(challenge_id, user_id, now)
        })?)
    }

    pub fn challenge_leaderboard(
        &self,
        challenge_id: Uuid,
        requester: Uuid,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        Ok(self.challenges().leaderboard(challenge_id, requester)?)
    }

    pub fn active_challenges(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Challenge, ChallengeParticipant)>, EngineError> {
        Ok(self.challenges().get_active_challenges(user_id, now)?)
    }
}
