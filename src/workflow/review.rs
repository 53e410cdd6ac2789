// Evaluator decisions on submitted plans

use super::WorkflowError;
use crate::api::PlanningClient;

fn optional_feedback(feedback: Option<&str>) -> Option<&str> {
    feedback.map(str::trim).filter(|f| !f.is_empty())
}

/// Feedback is mandatory on rejection so the planner knows what to fix.
fn required_feedback(feedback: &str) -> Result<&str, WorkflowError> {
    let feedback = feedback.trim();
    if feedback.is_empty() {
        return Err(WorkflowError::FeedbackRequired);
    }
    Ok(feedback)
}

pub async fn approve(
    client: &PlanningClient,
    plan: u64,
    feedback: Option<&str>,
) -> Result<(), WorkflowError> {
    client.approve_plan(plan, optional_feedback(feedback)).await?;
    Ok(())
}

pub async fn reject(
    client: &PlanningClient,
    plan: u64,
    feedback: &str,
) -> Result<(), WorkflowError> {
    let feedback = required_feedback(feedback)?;
    client.reject_plan(plan, feedback).await?;
    Ok(())
}

pub async fn approve_team_desk(
    client: &PlanningClient,
    plan: u64,
    feedback: Option<&str>,
) -> Result<(), WorkflowError> {
    client
        .approve_team_desk_plan(plan, optional_feedback(feedback))
        .await?;
    Ok(())
}

pub async fn reject_team_desk(
    client: &PlanningClient,
    plan: u64,
    feedback: &str,
) -> Result<(), WorkflowError> {
    let feedback = required_feedback(feedback)?;
    client.reject_team_desk_plan(plan, feedback).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiSettings;

    fn offline_client() -> PlanningClient {
        // Unroutable address: any request would fail with a transport error
        let settings = ApiSettings::default().with_base_url("http://127.0.0.1:9/api");
        PlanningClient::new(settings).unwrap()
    }

    #[tokio::test]
    async fn test_reject_without_feedback_never_calls_server() {
        let result = reject(&offline_client(), 1, "   ").await;
        assert!(matches!(result, Err(WorkflowError::FeedbackRequired)));
    }

    #[tokio::test]
    async fn test_team_desk_reject_needs_feedback_too() {
        let result = reject_team_desk(&offline_client(), 1, "").await;
        assert!(matches!(result, Err(WorkflowError::FeedbackRequired)));
    }

    #[test]
    fn test_feedback_trimming() {
        assert_eq!(optional_feedback(Some("  ok ")), Some("ok"));
        assert_eq!(optional_feedback(Some("   ")), None);
        assert_eq!(required_feedback(" fix Q2 ").unwrap(), "fix Q2");
    }
}
