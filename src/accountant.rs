//! Progress accounting: merges one photo's detections into an area's
//! cumulative, plan-bounded progress record.
//!
//! Per update: load the plan, load (or create) the progress record, merge
//! each observed class under the active [`Policy`], clamp to the plan
//! ceiling, recompute the total and overwrite the stored record. The store
//! write is the only mutation and happens after every check has passed.

use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{ProgressError, StoreError};
use crate::model::result::percentage;
use crate::model::{
    is_valid_area_id, normalize_area_id, BasePlan, Observation, ProgressRecord, ProgressResult,
};
use crate::store::{AreaLocks, RecordStore};

/// How a new observation reconciles with the stored value of a class.
///
/// The two policies are not interchangeable on the same persisted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// `min(previous + observed, ceiling)`: photos cover disjoint parts of
    /// the area. Double-counts an element seen in two photos.
    Additive,
    /// `min(max(previous, observed), ceiling)`: every photo tries to cover
    /// the whole area. Re-submitting a photo changes nothing.
    #[default]
    HighScore,
}

impl Policy {
    #[must_use]
    pub fn merge(self, previous: u64, observed: u64) -> u64 {
        match self {
            Self::Additive => previous.saturating_add(observed),
            Self::HighScore => previous.max(observed),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Additive => f.write_str("additive"),
            Self::HighScore => f.write_str("high_score"),
        }
    }
}

/// What to do when a stored progress record cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptProgressPolicy {
    /// Surface [`ProgressError::CorruptProgress`] and leave the file alone.
    #[default]
    Fail,
    /// Log a warning and start the area from zero.
    Reset,
}

pub struct Accountant<P, S> {
    plans: P,
    progress: S,
    policy: Policy,
    on_corrupt: CorruptProgressPolicy,
    locks: AreaLocks,
}

impl<P, S> Accountant<P, S>
where
    P: RecordStore<BasePlan>,
    S: RecordStore<ProgressRecord>,
{
    #[must_use]
    pub fn new(plans: P, progress: S, policy: Policy) -> Self {
        Self {
            plans,
            progress,
            policy,
            on_corrupt: CorruptProgressPolicy::default(),
            locks: AreaLocks::new(),
        }
    }

    #[must_use]
    pub fn with_corrupt_policy(mut self, on_corrupt: CorruptProgressPolicy) -> Self {
        self.on_corrupt = on_corrupt;
        self
    }

    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    #[must_use]
    pub fn plans(&self) -> &P {
        &self.plans
    }

    #[must_use]
    pub fn progress(&self) -> &S {
        &self.progress
    }

    /// Merges `observation` into the stored progress of `area_id`.
    ///
    /// An empty observation is valid and leaves the record unchanged. Classes
    /// the plan does not know contribute nothing.
    ///
    /// # Errors
    ///
    /// [`ProgressError::InvalidAreaId`] when the id cannot name a record,
    /// [`ProgressError::PlanNotFound`] when the area has no plan,
    /// [`ProgressError::UnitMismatch`] when the plan declares a different
    /// unit, [`ProgressError::CorruptProgress`] under
    /// [`CorruptProgressPolicy::Fail`], and [`ProgressError::Io`] for store
    /// failures. Nothing is written on error.
    pub fn update(
        &self,
        area_id: &str,
        observation: &Observation,
    ) -> Result<ProgressResult, ProgressError> {
        let area_id = area_key(area_id)?;
        let plan = self.load_plan(&area_id)?;

        if let Some(planned) = plan.unit {
            if planned != observation.unit {
                return Err(ProgressError::UnitMismatch {
                    area_id,
                    plan: planned,
                    observed: observation.unit,
                });
            }
        }

        let handle = self.locks.handle(&area_id);
        let _guard = AreaLocks::acquire(&handle);

        let mut record = self.load_progress(&plan)?;

        for (class, &observed) in &observation.counts {
            let Some(&ceiling) = plan.expected.get(class) else {
                debug!(area = %area_id, class = %class, observed, "class not in plan, ignored");
                continue;
            };
            let previous = record.achieved(class);
            let value = self.policy.merge(previous, observed).min(ceiling);
            record.achieved.insert(class.clone(), value);
        }
        record.recompute_total();

        self.progress
            .put(&area_id, &record)
            .map_err(ProgressError::Io)?;

        let result = build_result(&plan, &record, observation.total());
        info!(
            area = %area_id,
            policy = %self.policy,
            achieved = record.achieved_total,
            expected = plan.expected_total,
            overall = result.percentage_overall,
            this_photo = result.percentage_this_photo,
            "progress updated"
        );
        Ok(result)
    }

    /// Current progress of an area without recording anything.
    ///
    /// Areas with a plan but no progress yet report zero.
    pub fn snapshot(&self, area_id: &str) -> Result<ProgressResult, ProgressError> {
        let area_id = area_key(area_id)?;
        let plan = self.load_plan(&area_id)?;
        let record = self.load_progress(&plan)?;
        Ok(build_result(&plan, &record, 0))
    }

    fn load_plan(&self, area_id: &str) -> Result<BasePlan, ProgressError> {
        let mut plan = self
            .plans
            .get(area_id)
            .map_err(ProgressError::Io)?
            .ok_or_else(|| ProgressError::PlanNotFound {
                area_id: area_id.to_string(),
            })?;
        plan.area_id = area_id.to_string();
        Ok(plan)
    }

    fn load_progress(&self, plan: &BasePlan) -> Result<ProgressRecord, ProgressError> {
        match self.progress.get(&plan.area_id) {
            Ok(Some(mut record)) => {
                record.area_id.clone_from(&plan.area_id);
                record.align_with(plan);
                Ok(record)
            }
            Ok(None) => Ok(ProgressRecord::for_plan(plan)),
            Err(StoreError::Corrupt { source, .. }) => match self.on_corrupt {
                CorruptProgressPolicy::Fail => Err(ProgressError::CorruptProgress {
                    area_id: plan.area_id.clone(),
                    source,
                }),
                CorruptProgressPolicy::Reset => {
                    warn!(area = %plan.area_id, error = %source, "corrupt progress record, starting from zero");
                    Ok(ProgressRecord::for_plan(plan))
                }
            },
            Err(e) => Err(ProgressError::Io(e)),
        }
    }
}

fn area_key(area_id: &str) -> Result<String, ProgressError> {
    let key = normalize_area_id(area_id);
    if is_valid_area_id(&key) {
        Ok(key)
    } else {
        Err(ProgressError::InvalidAreaId { area_id: key })
    }
}

fn build_result(plan: &BasePlan, record: &ProgressRecord, observed_total: u64) -> ProgressResult {
    ProgressResult {
        area_id: plan.area_id.clone(),
        percentage_overall: percentage(record.achieved_total, plan.expected_total),
        percentage_this_photo: percentage(observed_total, plan.expected_total),
        achieved_total: record.achieved_total,
        expected_total: plan.expected_total,
        achieved: record.achieved.clone(),
        expected: plan.expected.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CountingUnit;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    type Plans = Arc<MemoryStore<BasePlan>>;
    type Progress = Arc<MemoryStore<ProgressRecord>>;

    fn accountant(policy: Policy) -> (Accountant<Plans, Progress>, (Plans, Progress)) {
        let plans = Arc::new(MemoryStore::new());
        let progress = Arc::new(MemoryStore::new());
        plans
            .put(
                "estacao",
                &BasePlan::new("estacao", None, [("concreto", 10), ("metal", 5)]),
            )
            .unwrap();
        let accountant = Accountant::new(Arc::clone(&plans), Arc::clone(&progress), policy);
        (accountant, (plans, progress))
    }

    fn seen(pairs: &[(&str, u64)]) -> Observation {
        Observation::from_counts(CountingUnit::Instances, pairs.iter().copied())
    }

    #[test]
    fn first_observation_initializes_every_class() {
        let (accountant, _) = accountant(Policy::HighScore);

        let result = accountant.update("estacao", &seen(&[("concreto", 4)])).unwrap();

        assert_eq!(result.achieved.get("concreto"), Some(&4));
        assert_eq!(result.achieved.get("metal"), Some(&0));
        assert_eq!(result.achieved_total, 4);
        assert_eq!(result.expected_total, 15);
        assert!((result.percentage_overall - 26.67).abs() < 1e-9);
        assert!((result.percentage_this_photo - 26.67).abs() < 1e-9);
    }

    #[test]
    fn additive_accumulates_and_clamps() {
        let (accountant, _) = accountant(Policy::Additive);
        accountant.update("estacao", &seen(&[("concreto", 4)])).unwrap();

        let result = accountant.update("estacao", &seen(&[("concreto", 8)])).unwrap();

        assert_eq!(result.achieved.get("concreto"), Some(&10));
        assert_eq!(result.achieved_total, 10);
    }

    #[test]
    fn high_score_ignores_lower_observation() {
        let (accountant, _) = accountant(Policy::HighScore);
        accountant.update("estacao", &seen(&[("concreto", 4)])).unwrap();

        let result = accountant.update("estacao", &seen(&[("concreto", 3)])).unwrap();

        assert_eq!(result.achieved.get("concreto"), Some(&4));
        assert!((result.percentage_this_photo - 20.0).abs() < 1e-9);
    }

    #[test]
    fn high_score_resubmission_is_idempotent() {
        let (accountant, (_, progress)) = accountant(Policy::HighScore);
        let observation = seen(&[("concreto", 7), ("metal", 9)]);

        accountant.update("estacao", &observation).unwrap();
        let first = progress.get("estacao").unwrap().unwrap();
        accountant.update("estacao", &observation).unwrap();
        let second = progress.get("estacao").unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(second.achieved("metal"), 5);
    }

    #[test]
    fn unknown_class_contributes_nothing() {
        let (accountant, _) = accountant(Policy::Additive);

        let result = accountant.update("estacao", &seen(&[("wood", 7)])).unwrap();

        assert_eq!(result.achieved_total, 0);
        assert!(!result.achieved.contains_key("wood"));
    }

    #[test]
    fn empty_observation_is_not_an_error() {
        let (accountant, _) = accountant(Policy::HighScore);
        accountant.update("estacao", &seen(&[("metal", 2)])).unwrap();

        let result = accountant.update("estacao", &seen(&[])).unwrap();

        assert_eq!(result.achieved_total, 2);
        assert!(result.percentage_this_photo.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_plan_fails_without_writing() {
        let (accountant, (_, progress)) = accountant(Policy::HighScore);

        let err = accountant.update("tunel", &seen(&[("metal", 1)])).unwrap_err();

        assert!(matches!(err, ProgressError::PlanNotFound { ref area_id } if area_id == "tunel"));
        assert!(progress.is_empty());
    }

    #[test]
    fn empty_plan_reports_zero_percent() {
        let (accountant, (plans, _)) = accountant(Policy::Additive);
        plans
            .put("vazio", &BasePlan::new("vazio", None, [("concreto", 0)]))
            .unwrap();

        let result = accountant.update("vazio", &seen(&[("concreto", 3)])).unwrap();

        assert_eq!(result.achieved_total, 0);
        assert!(result.percentage_overall.abs() < f64::EPSILON);
    }

    #[test]
    fn unit_mismatch_is_rejected() {
        let (accountant, (plans, progress)) = accountant(Policy::Additive);
        plans
            .put(
                "estacao",
                &BasePlan::new("estacao", Some(CountingUnit::Instances), [("concreto", 10)]),
            )
            .unwrap();
        let pixels = Observation::new(CountingUnit::Pixels).with("concreto", 5000);

        let err = accountant.update("estacao", &pixels).unwrap_err();

        assert!(matches!(err, ProgressError::UnitMismatch { .. }));
        assert!(progress.is_empty());
    }

    #[test]
    fn area_ids_are_normalized() {
        let (accountant, (_, progress)) = accountant(Policy::Additive);

        accountant.update(" Estacao ", &seen(&[("metal", 1)])).unwrap();

        assert_eq!(progress.keys().unwrap(), ["estacao"]);
    }

    #[test]
    fn path_like_area_ids_are_rejected() {
        let (accountant, (_, progress)) = accountant(Policy::Additive);

        for area in ["../estacao", "estacao/..", "  ", ".."] {
            let err = accountant.update(area, &seen(&[("metal", 1)])).unwrap_err();
            assert!(matches!(err, ProgressError::InvalidAreaId { .. }), "{area:?}");
        }
        assert!(matches!(
            accountant.snapshot("a/b"),
            Err(ProgressError::InvalidAreaId { .. })
        ));
        assert!(progress.is_empty());
    }

    #[test]
    fn one_observation_can_feed_several_areas() {
        let (accountant, (plans, progress)) = accountant(Policy::Additive);
        plans
            .put("mezanino", &BasePlan::new("mezanino", None, [("concreto", 2)]))
            .unwrap();
        let observation = seen(&[("concreto", 3)]);

        let estacao = accountant.update("estacao", &observation).unwrap();
        let mezanino = accountant.update("mezanino", &observation).unwrap();

        assert_eq!(estacao.area_id, "estacao");
        assert_eq!(estacao.achieved_total, 3);
        assert_eq!(mezanino.area_id, "mezanino");
        assert_eq!(mezanino.achieved_total, 2);
        assert_eq!(progress.keys().unwrap(), ["estacao", "mezanino"]);
    }

    #[test]
    fn snapshot_does_not_write() {
        let (accountant, (_, progress)) = accountant(Policy::HighScore);

        let result = accountant.snapshot("estacao").unwrap();

        assert_eq!(result.achieved_total, 0);
        assert!(progress.is_empty());
    }

    #[test]
    fn policy_merge_rules() {
        assert_eq!(Policy::Additive.merge(4, 8), 12);
        assert_eq!(Policy::HighScore.merge(4, 8), 8);
        assert_eq!(Policy::HighScore.merge(4, 3), 4);
        assert_eq!(Policy::Additive.merge(u64::MAX, 1), u64::MAX);
    }
}
