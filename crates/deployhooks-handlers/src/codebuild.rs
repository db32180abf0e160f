// CodeBuild helpers shared by the Terraform and Amplify handlers

use crate::Outcome;
use deployhooks_core::{BuildRunner, BuildStatus, PollOutcome, Poller, ProviderStatus};
use tracing::{error, info};

/// Start a build of `project` and wait for it to finish.
pub(crate) async fn run_build(
    builds: &dyn BuildRunner,
    poller: &Poller,
    project: &str,
    label: &str,
) -> Outcome {
    let build_id = match builds.start_build(project).await {
        Ok(id) => id,
        Err(err) => {
            error!(
                project,
                error = %err,
                "Error when trying to start CodeBuild '{}' project", label
            );
            return Outcome::trigger_failed(&format!("start {} build", label), &err);
        }
    };
    info!(project, build_id = %build_id, "CodeBuild '{}' project successfully started.", label);

    let outcome = wait_for_build(builds, poller, &build_id, label).await;
    if outcome.is_success() {
        info!(
            project,
            build_id = %build_id,
            "CodeBuild '{}' project successfully finished.", label
        );
    } else {
        error!(
            project,
            build_id = %build_id,
            outcome = outcome.kind(),
            "CodeBuild '{}' project failed executing", label
        );
    }
    outcome
}

/// Poll `build_id` until CodeBuild reports a terminal status.
pub(crate) async fn wait_for_build(
    builds: &dyn BuildRunner,
    poller: &Poller,
    build_id: &str,
    label: &str,
) -> Outcome {
    let operation = format!("{} build", label);
    let result = poller
        .poll(build_id, BuildStatus::IN_PROGRESS, move || {
            builds.build_status(build_id)
        })
        .await;

    match result {
        Ok(PollOutcome::Terminal(status)) => Outcome::from_status(&operation, &status),
        Ok(PollOutcome::Absent) => {
            Outcome::query_failed(&operation, format!("CodeBuild build {} not found", build_id))
        }
        Ok(PollOutcome::TimedOut { last, waited }) => {
            Outcome::timed_out(&operation, waited, last.as_ref())
        }
        Err(err) => Outcome::query_failed(&operation, err.to_string()),
    }
}
