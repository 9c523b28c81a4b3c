//! Gate pipeline for the TaskCompleted hook.
//!
//! ## State Machine
//!
//! ```text
//! enabled=false / enforceOnTaskCompleted=false → Disabled
//! bypass env truthy                            → record "bypassed" → Bypassed
//! preflight (optional)                         → "Preflight command failed"
//! test (required)                              → "Missing required setting: testCommand" | "testCommand failed"
//! coverage (required)                          → "Missing required setting: coverageCommand" | "coverageCommand failed"
//! coverage thresholds                          → "Coverage gate failed: ..."
//! mutation (if requireMutation)                → "Mutation gate enabled but mutationCommand is missing" | "Mutation gate failed"
//! record "passed"                              → Passed
//! ```
//!
//! Stages run one at a time and the first failure stops the pipeline. A
//! blocked run never touches state, so an earlier pass stays on record.

use chrono::Utc;
use tdd_guardian_protocol::TaskCompletedOutput;

use crate::config::{EnvLookup, GuardianConfig};
use crate::state::{GateRecord, GateStore};
use crate::storage::StorageConfig;

use super::coverage::check_coverage;
use super::log::ExecutionLog;
use super::runner::CommandRunner;

pub const INIT_HINT: &str = "Run /tdd-guardian:init and provide project commands.";
pub const MUTATION_HINT: &str = "Set mutationCommand in .claude/tdd-guardian/config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preflight,
    Test,
    Coverage,
    Mutation,
}

impl Stage {
    /// Config key naming this stage's command.
    pub fn setting(self) -> &'static str {
        match self {
            Self::Preflight => "preflightCommand",
            Self::Test => "testCommand",
            Self::Coverage => "coverageCommand",
            Self::Mutation => "mutationCommand",
        }
    }

    fn failure_reason(self) -> String {
        match self {
            Self::Preflight => "Preflight command failed".to_string(),
            Self::Test | Self::Coverage => format!("{} failed", self.setting()),
            Self::Mutation => "Mutation gate failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Guardian or task-completion enforcement is switched off.
    Disabled,
    /// Bypass env var was set; a "bypassed" record was written.
    Bypassed,
    /// Every stage passed; the record written to state.
    Passed(GateRecord),
    Blocked { reason: String, context: String },
}

impl GateOutcome {
    fn blocked(reason: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
            context: context.into(),
        }
    }

    /// The hook document to print, or `None` for pass-through.
    pub fn to_output(&self) -> Option<TaskCompletedOutput> {
        match self {
            Self::Blocked { reason, context } => {
                Some(TaskCompletedOutput::block(reason.clone(), context.clone()))
            }
            _ => None,
        }
    }
}

pub struct GatePipeline<'a, R: CommandRunner> {
    storage: &'a StorageConfig,
    runner: &'a R,
    env: EnvLookup<'a>,
}

impl<'a, R: CommandRunner> GatePipeline<'a, R> {
    pub fn new(storage: &'a StorageConfig, runner: &'a R, env: EnvLookup<'a>) -> Self {
        Self {
            storage,
            runner,
            env,
        }
    }

    pub fn run(&self) -> GateOutcome {
        let config = GuardianConfig::load(&self.storage.config_file());
        if !config.enabled() || !config.enforce_on_task_completed() {
            tracing::debug!("Gate enforcement disabled");
            return GateOutcome::Disabled;
        }

        let store = GateStore::new(&self.storage.state_file());

        if config.bypass_active(self.env) {
            tracing::info!(bypass_env = config.bypass_env(), "Bypass active, skipping gate");
            if let Err(err) = store.save(&GateRecord::bypassed(Utc::now())) {
                tracing::warn!(error = %err, "Failed to record bypass");
            }
            return GateOutcome::Bypassed;
        }

        let tail_chars = config.diagnostic_tail_chars();
        let mut log = ExecutionLog::new();
        if let Err(outcome) = self.verify(&config, &mut log, tail_chars) {
            if let GateOutcome::Blocked { reason, .. } = &outcome {
                tracing::info!(reason = %reason, stages = log.len(), "Gate blocked");
            }
            return outcome;
        }

        let record = GateRecord::passed(
            Utc::now(),
            config.require_mutation(),
            config.coverage_summary_path(),
        );
        if let Err(err) = store.save(&record) {
            tracing::error!(error = %err, "Gate passed but state could not be written");
        } else {
            tracing::info!("Gate passed");
        }
        GateOutcome::Passed(record)
    }

    /// Runs every stage in order; `Err` carries the first block.
    fn verify(
        &self,
        config: &GuardianConfig,
        log: &mut ExecutionLog,
        tail_chars: usize,
    ) -> Result<(), GateOutcome> {
        if let Some(command) = config.preflight_command() {
            self.run_stage(Stage::Preflight, command, log, tail_chars)?;
        }

        for (stage, command) in [
            (Stage::Test, config.test_command()),
            (Stage::Coverage, config.coverage_command()),
        ] {
            let command = command.ok_or_else(|| {
                GateOutcome::blocked(
                    format!("Missing required setting: {}", stage.setting()),
                    INIT_HINT,
                )
            })?;
            self.run_stage(stage, command, log, tail_chars)?;
        }

        let summary_path = self
            .storage
            .resolve_project_path(config.coverage_summary_path());
        let coverage = check_coverage(&summary_path, &config.coverage_thresholds());
        log.record_note(coverage.message.clone());
        if !coverage.passed {
            return Err(GateOutcome::blocked(
                coverage.message,
                log.tail(tail_chars),
            ));
        }

        if config.require_mutation() {
            let command = config.mutation_command().ok_or_else(|| {
                GateOutcome::blocked(
                    "Mutation gate enabled but mutationCommand is missing",
                    MUTATION_HINT,
                )
            })?;
            self.run_stage(Stage::Mutation, command, log, tail_chars)?;
        }

        Ok(())
    }

    fn run_stage(
        &self,
        stage: Stage,
        command: &str,
        log: &mut ExecutionLog,
        tail_chars: usize,
    ) -> Result<(), GateOutcome> {
        tracing::debug!(stage = stage.setting(), "Gate stage starting");
        let result = self.runner.run(command, self.storage.project_root());
        log.record_command(command, &result.output);
        if result.success {
            Ok(())
        } else {
            Err(GateOutcome::blocked(
                stage.failure_reason(),
                log.tail(tail_chars),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::runner::CommandOutput;
    use crate::state::GateResult;
    use chrono::Duration;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    /// Replays canned results and records what was run.
    #[derive(Default)]
    struct ScriptedRunner {
        results: HashMap<String, CommandOutput>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        fn with(mut self, command: &str, success: bool, output: &str) -> Self {
            self.results
                .insert(command.to_string(), CommandOutput::new(success, output));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: &str, _cwd: &Path) -> CommandOutput {
            self.calls.borrow_mut().push(command.to_string());
            self.results
                .get(command)
                .cloned()
                .unwrap_or_else(|| CommandOutput::new(true, ""))
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn full_coverage() -> Value {
        json!({"total": {
            "lines": {"pct": 100}, "functions": {"pct": 100},
            "branches": {"pct": 100}, "statements": {"pct": 100}
        }})
    }

    struct Project {
        temp: TempDir,
        storage: StorageConfig,
    }

    impl Project {
        fn new(config: Value) -> Self {
            let temp = tempdir().unwrap();
            let storage = StorageConfig::for_project(temp.path());
            std::fs::create_dir_all(storage.root()).unwrap();
            std::fs::write(storage.config_file(), config.to_string()).unwrap();
            Self { temp, storage }
        }

        fn with_summary(self, summary: Value) -> Self {
            let dir = self.temp.path().join("coverage");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("coverage-summary.json"), summary.to_string()).unwrap();
            self
        }

        fn store(&self) -> GateStore {
            GateStore::new(&self.storage.state_file())
        }

        fn run(&self, runner: &ScriptedRunner) -> GateOutcome {
            GatePipeline::new(&self.storage, runner, &no_env).run()
        }
    }

    fn enabled_config() -> Value {
        json!({
            "enabled": true,
            "preflightCommand": "npm ci",
            "testCommand": "npm test",
            "coverageCommand": "npm run coverage"
        })
    }

    fn reason_of(outcome: &GateOutcome) -> &str {
        match outcome {
            GateOutcome::Blocked { reason, .. } => reason,
            other => panic!("expected block, got {other:?}"),
        }
    }

    fn context_of(outcome: &GateOutcome) -> &str {
        match outcome {
            GateOutcome::Blocked { context, .. } => context,
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_disabled_config_is_noop() {
        let project = Project::new(json!({ "enabled": false, "testCommand": "npm test" }));
        let runner = ScriptedRunner::default();
        assert_eq!(project.run(&runner), GateOutcome::Disabled);
        assert!(runner.calls().is_empty());
        assert!(project.store().load().is_none());
    }

    #[test]
    fn test_task_completed_enforcement_opt_out() {
        let mut config = enabled_config();
        config["enforceOnTaskCompleted"] = json!(false);
        let project = Project::new(config);
        let runner = ScriptedRunner::default();
        assert_eq!(project.run(&runner), GateOutcome::Disabled);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_bypass_records_bypassed_state() {
        let project = Project::new(enabled_config());
        let runner = ScriptedRunner::default();
        let env = |name: &str| (name == "TDD_GUARD_BYPASS").then(|| "true".to_string());
        let outcome = GatePipeline::new(&project.storage, &runner, &env).run();

        assert_eq!(outcome, GateOutcome::Bypassed);
        assert!(runner.calls().is_empty());
        let record = project.store().load().unwrap();
        assert_eq!(record.last_result, Some(GateResult::Bypassed));
        assert!(record.require_mutation.is_none());
    }

    #[test]
    fn test_full_pass_runs_stages_in_order_and_records() {
        let mut config = enabled_config();
        config["requireMutation"] = json!(true);
        config["mutationCommand"] = json!("npx stryker run");
        let project = Project::new(config).with_summary(full_coverage());
        let runner = ScriptedRunner::default();

        let before = Utc::now() - Duration::seconds(1);
        let outcome = project.run(&runner);

        assert!(matches!(outcome, GateOutcome::Passed(_)));
        assert_eq!(
            runner.calls(),
            vec!["npm ci", "npm test", "npm run coverage", "npx stryker run"]
        );
        let record = project.store().load().unwrap();
        assert_eq!(record.last_result, Some(GateResult::Passed));
        assert_eq!(record.require_mutation, Some(true));
        assert_eq!(
            record.coverage_summary_path.as_deref(),
            Some("coverage/coverage-summary.json")
        );
        let passed_at = record.last_gate_passed_at.unwrap();
        assert!(passed_at >= before && passed_at <= Utc::now());
    }

    #[test]
    fn test_preflight_is_optional() {
        let mut config = enabled_config();
        config["preflightCommand"] = json!("");
        let project = Project::new(config).with_summary(full_coverage());
        let runner = ScriptedRunner::default();
        assert!(matches!(project.run(&runner), GateOutcome::Passed(_)));
        assert_eq!(runner.calls(), vec!["npm test", "npm run coverage"]);
    }

    #[test]
    fn test_preflight_failure_blocks() {
        let project = Project::new(enabled_config());
        let runner = ScriptedRunner::default().with("npm ci", false, "lockfile mismatch");
        let outcome = project.run(&runner);
        assert_eq!(reason_of(&outcome), "Preflight command failed");
        assert_eq!(context_of(&outcome), "$ npm ci\nlockfile mismatch");
        assert_eq!(runner.calls(), vec!["npm ci"]);
    }

    #[test]
    fn test_missing_test_command_blocks() {
        let project = Project::new(json!({ "enabled": true, "coverageCommand": "cov" }));
        let runner = ScriptedRunner::default();
        let outcome = project.run(&runner);
        assert_eq!(reason_of(&outcome), "Missing required setting: testCommand");
        assert_eq!(context_of(&outcome), INIT_HINT);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_coverage_command_blocks_after_tests() {
        let project = Project::new(json!({ "enabled": true, "testCommand": "npm test" }));
        let runner = ScriptedRunner::default();
        let outcome = project.run(&runner);
        assert_eq!(
            reason_of(&outcome),
            "Missing required setting: coverageCommand"
        );
        assert_eq!(runner.calls(), vec!["npm test"]);
    }

    #[test]
    fn test_test_failure_blocks_and_keeps_prior_state() {
        let project = Project::new(enabled_config());
        let prior = GateRecord::passed(Utc::now() - Duration::minutes(30), true, "old.json");
        project.store().save(&prior).unwrap();

        let runner = ScriptedRunner::default()
            .with("npm ci", true, "installed")
            .with("npm test", false, "1 failing");
        let outcome = project.run(&runner);

        assert!(reason_of(&outcome).contains("testCommand failed"));
        assert_eq!(
            context_of(&outcome),
            "$ npm ci\ninstalled\n\n$ npm test\n1 failing"
        );
        assert_eq!(runner.calls(), vec!["npm ci", "npm test"]);
        assert_eq!(project.store().load().unwrap(), prior);
    }

    #[test]
    fn test_coverage_command_failure_blocks() {
        let project = Project::new(enabled_config());
        let runner = ScriptedRunner::default().with("npm run coverage", false, "boom");
        let outcome = project.run(&runner);
        assert_eq!(reason_of(&outcome), "coverageCommand failed");
    }

    #[test]
    fn test_coverage_below_threshold_blocks() {
        let project = Project::new(enabled_config()).with_summary(json!({"total": {
            "lines": {"pct": 92.5}, "functions": {"pct": 100},
            "branches": {"pct": 100}, "statements": {"pct": 100}
        }}));
        let runner = ScriptedRunner::default();
        let outcome = project.run(&runner);

        assert!(reason_of(&outcome).starts_with("Coverage gate failed"));
        assert!(reason_of(&outcome).contains("lines: 92.50% < 100.00%"));
        assert!(context_of(&outcome).ends_with("lines: 92.50% < 100.00%"));
        assert!(project.store().load().is_none());
    }

    #[test]
    fn test_missing_summary_blocks() {
        let project = Project::new(enabled_config());
        let outcome = project.run(&ScriptedRunner::default());
        assert!(reason_of(&outcome).contains("Coverage summary not found or invalid"));
    }

    #[test]
    fn test_absolute_summary_path() {
        let elsewhere = tempdir().unwrap();
        let summary = elsewhere.path().join("summary.json");
        std::fs::write(&summary, full_coverage().to_string()).unwrap();

        let mut config = enabled_config();
        config["coverageSummaryPath"] = json!(summary.to_string_lossy());
        let project = Project::new(config);
        let outcome = project.run(&ScriptedRunner::default());

        let record = match outcome {
            GateOutcome::Passed(record) => record,
            other => panic!("expected pass, got {other:?}"),
        };
        assert_eq!(
            record.coverage_summary_path.as_deref(),
            Some(&*summary.to_string_lossy())
        );
    }

    #[test]
    fn test_mutation_required_without_command_blocks() {
        let mut config = enabled_config();
        config["requireMutation"] = json!(true);
        let project = Project::new(config).with_summary(full_coverage());
        let outcome = project.run(&ScriptedRunner::default());
        assert_eq!(
            reason_of(&outcome),
            "Mutation gate enabled but mutationCommand is missing"
        );
        assert_eq!(context_of(&outcome), MUTATION_HINT);
    }

    #[test]
    fn test_mutation_failure_blocks() {
        let mut config = enabled_config();
        config["requireMutation"] = json!(true);
        config["mutationCommand"] = json!("npx stryker run");
        let project = Project::new(config).with_summary(full_coverage());
        let runner = ScriptedRunner::default().with("npx stryker run", false, "score 40%");
        let outcome = project.run(&runner);
        assert_eq!(reason_of(&outcome), "Mutation gate failed");
        assert!(context_of(&outcome).contains("Coverage gate passed"));
        assert!(context_of(&outcome).ends_with("$ npx stryker run\nscore 40%"));
    }

    #[test]
    fn test_mutation_command_ignored_when_not_required() {
        let mut config = enabled_config();
        config["mutationCommand"] = json!("npx stryker run");
        let project = Project::new(config).with_summary(full_coverage());
        let runner = ScriptedRunner::default();
        let outcome = project.run(&runner);
        assert!(matches!(outcome, GateOutcome::Passed(_)));
        assert!(!runner.calls().contains(&"npx stryker run".to_string()));
    }

    #[test]
    fn test_context_is_truncated_to_tail() {
        let mut config = enabled_config();
        config["diagnosticTailChars"] = json!(20);
        let project = Project::new(config);
        let runner = ScriptedRunner::default()
            .with("npm ci", true, &"x".repeat(500))
            .with("npm test", false, "assertion failed");
        let context = context_of(&project.run(&runner)).to_string();
        assert_eq!(context.chars().count(), 20);
        assert!(context.ends_with("assertion failed"));
    }

    #[test]
    fn test_repeated_passes_replace_record() {
        let mut config = enabled_config();
        config["requireMutation"] = json!(true);
        config["mutationCommand"] = json!("mutate");
        let project = Project::new(config).with_summary(full_coverage());
        assert!(matches!(
            project.run(&ScriptedRunner::default()),
            GateOutcome::Passed(_)
        ));

        std::fs::write(
            project.storage.config_file(),
            enabled_config().to_string(),
        )
        .unwrap();
        assert!(matches!(
            project.run(&ScriptedRunner::default()),
            GateOutcome::Passed(_)
        ));

        let record = project.store().load().unwrap();
        assert_eq!(record.require_mutation, Some(false));
    }

    #[test]
    fn test_blocked_output_shape() {
        let outcome = GateOutcome::blocked("testCommand failed", "ctx");
        let output = outcome.to_output().unwrap();
        assert_eq!(output.reason, "testCommand failed");
        assert_eq!(output.hook_specific_output.additional_context, "ctx");
        assert!(GateOutcome::Disabled.to_output().is_none());
        assert!(GateOutcome::Bypassed.to_output().is_none());
    }
}
