// Command handlers
//
// Each handler connects to the API (logging in when credentials are
// configured), runs one operation to completion and prints the result.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::render;
use super::{
    Cli, Command, CostArgs, CostCommand, DashboardCommand, DeskCommand, ExportFormat, PlanCommand,
};
use crate::api::{ApiError, AuthStatus, KeepAlive, PlanningClient};
use crate::config::Config;
use crate::costing::{
    CostingTool, MeetingWorkshopInput, PrintingInput, ProcurementInput, ReferenceTables,
    SupervisionInput,
};
use crate::dashboard::{AdminDashboard, EvaluatorDashboard};
use crate::enrichment::Enricher;
use crate::models::{Plan, PlanType, Role, TeamDeskPlan};
use crate::review::{flatten, BudgetSummary, ExportHeader, PlanReport};
use crate::workflow::{self, PlanningSession, SelectionMode};

/// A plan described in TOML for `plan new`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanDraft {
    /// Defaults to the viewing organization
    #[serde(default)]
    pub organization: Option<u64>,
    pub planner: String,
    #[serde(default)]
    pub executive: Option<String>,
    pub plan_type: PlanType,
    /// Custom when `weights` is non-empty, otherwise default
    #[serde(default)]
    pub mode: Option<SelectionMode>,
    pub objectives: Vec<u64>,
    #[serde(default)]
    pub weights: Vec<WeightOverride>,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeightOverride {
    pub objective: u64,
    pub weight: f64,
}

impl PlanDraft {
    fn mode(&self) -> SelectionMode {
        self.mode.unwrap_or(if self.weights.is_empty() {
            SelectionMode::Default
        } else {
            SelectionMode::Custom
        })
    }
}

struct Connection {
    client: PlanningClient,
    status: Option<AuthStatus>,
    viewer: Option<u64>,
    keepalive: Option<KeepAlive>,
}

impl Connection {
    async fn open(config: &Config, organization: Option<u64>) -> Result<Self> {
        let client =
            PlanningClient::new(config.api_settings()).context("Failed to create API client")?;

        let status = match &config.credentials {
            Some(creds) => Some(
                client
                    .login(&creds.username, &creds.password)
                    .await
                    .with_context(|| format!("Login failed for '{}'", creds.username))?,
            ),
            None => {
                tracing::debug!("No credentials configured, continuing without login");
                None
            }
        };

        let viewer = organization
            .or_else(|| status.as_ref().and_then(AuthStatus::primary_organization))
            .or(config.organization_id);
        let keepalive = status.as_ref().map(|_| client.spawn_keepalive());

        Ok(Self {
            client,
            status,
            viewer,
            keepalive,
        })
    }

    /// Stop the keep-alive and end the session if this connection opened one.
    async fn close(self) {
        if let Some(keepalive) = self.keepalive {
            keepalive.stop();
        }
        if self.status.is_some() {
            if let Err(e) = self.client.logout().await {
                tracing::warn!("Logout failed: {}", e);
            }
        }
    }
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    // Offline costing does not need a connection at all
    if let Command::Cost { tool } = &cli.command {
        if tool.args().tables.is_some() {
            let output = cost(tool, None, &config).await?;
            println!("{}", output);
            return Ok(());
        }
    }

    let conn = Connection::open(&config, cli.organization).await?;
    let result = run(cli.command, &conn, &config).await;
    conn.close().await;

    let output = result.map_err(|e| {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            e.context("Not authorised. Set STRATPLAN_USERNAME and STRATPLAN_PASSWORD to log in")
        } else {
            e
        }
    })?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

async fn run(command: Command, conn: &Connection, config: &Config) -> Result<String> {
    match command {
        Command::Objectives => {
            let objectives = conn
                .client
                .objectives()
                .get_all()
                .await
                .context("Failed to fetch strategic objectives")?;
            Ok(render::format_objectives(&objectives))
        }
        Command::Plan { action } => plan(action, conn, config).await,
        Command::Desk { action } => desk(action, conn, config).await,
        Command::Feeds { all } => {
            let feeds = if all {
                conn.client.initiative_feeds().get_all().await
            } else {
                conn.client.active_initiative_feeds().await
            }
            .context("Failed to fetch initiative feeds")?;
            Ok(render::format_feeds(&feeds))
        }
        Command::Cost { tool } => cost(&tool, Some(&conn.client), config).await,
        Command::Dashboard { view } => dashboard(view, conn, config).await,
        Command::Whoami => {
            let status = match &conn.status {
                Some(status) => status.clone(),
                None => conn.client.check().await.context("Session check failed")?,
            };
            Ok(render::format_whoami(&status))
        }
    }
}

async fn fetch_plan(client: &PlanningClient, id: u64) -> Result<Plan> {
    client
        .plans()
        .get_by_id(id)
        .await
        .with_context(|| format!("Failed to fetch plan {}", id))
}

fn export_header(plan: &Plan) -> ExportHeader {
    ExportHeader {
        organization: plan
            .organization_name
            .clone()
            .or_else(|| plan.organization.map(|id| format!("Organization {}", id)))
            .unwrap_or_default(),
        planner: plan.planner_name.clone(),
        from_date: plan.from_date,
        to_date: plan.to_date,
        plan_type: plan.plan_type,
    }
}

async fn plan(action: PlanCommand, conn: &Connection, config: &Config) -> Result<String> {
    let client = &conn.client;
    let enricher = Enricher::new(client.clone(), config.enrichment_options());

    match action {
        PlanCommand::Show { id } => {
            let plan = fetch_plan(client, id).await?;
            let viewer = plan.organization.or(conn.viewer);
            let tree = enricher.enrich_plan(&plan, viewer).await?;
            let rows = flatten(&tree);
            let summary = BudgetSummary::from_tree(&tree);
            Ok(render::format_plan(&plan, &rows, &summary, tree.is_complete()))
        }
        PlanCommand::Export {
            id,
            format,
            language,
            output,
        } => {
            let plan = fetch_plan(client, id).await?;
            let viewer = plan.organization.or(conn.viewer);
            let tree = enricher.enrich_plan(&plan, viewer).await?;
            if !tree.is_complete() {
                tracing::warn!(plan = id, "Exporting a plan with items that failed to load");
            }
            let report = PlanReport::new(export_header(&plan), &tree);
            let bytes = match format {
                ExportFormat::Xlsx => report.to_xlsx(language)?,
                ExportFormat::Csv => report.to_csv(language)?,
                ExportFormat::Pdf => report.to_pdf()?,
            };
            fs::write(&output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            Ok(format!("Wrote {} rows to {}", report.rows.len(), output.display()))
        }
        PlanCommand::New { input, dry_run } => {
            let draft: PlanDraft = read_toml(&input)?;
            new_plan(draft, dry_run, conn, &enricher).await
        }
        PlanCommand::Submit { id } => {
            client
                .submit_plan(id)
                .await
                .with_context(|| format!("Failed to submit plan {}", id))?;
            Ok(format!("Plan {} submitted for review", id))
        }
        PlanCommand::Approve { id, feedback } => {
            workflow::approve(client, id, feedback.as_deref())
                .await
                .with_context(|| format!("Failed to approve plan {}", id))?;
            Ok(format!("Plan {} approved", id))
        }
        PlanCommand::Reject { id, feedback } => {
            workflow::reject(client, id, &feedback)
                .await
                .with_context(|| format!("Failed to reject plan {}", id))?;
            Ok(format!("Plan {} rejected", id))
        }
        PlanCommand::Pending => {
            let plans = client
                .pending_reviews()
                .await
                .context("Failed to fetch pending reviews")?;
            Ok(render::format_plans(&plans))
        }
    }
}

async fn fetch_team_desk_plan(client: &PlanningClient, id: u64) -> Result<TeamDeskPlan> {
    client
        .team_desk_plans()
        .get_by_id(id)
        .await
        .with_context(|| format!("Failed to fetch Team/Desk plan {}", id))
}

async fn desk(action: DeskCommand, conn: &Connection, config: &Config) -> Result<String> {
    let client = &conn.client;

    match action {
        DeskCommand::List { plan } => {
            let plans = match plan {
                Some(parent) => client.team_desk_plans_for(parent).await,
                None => client.team_desk_plans().get_all().await,
            }
            .context("Failed to fetch Team/Desk plans")?;
            Ok(render::format_team_desk_plans(&plans))
        }
        DeskCommand::Show { id } => {
            let desk = fetch_team_desk_plan(client, id).await?;
            let parent_id = desk
                .leo_eo_plan
                .with_context(|| format!("Team/Desk plan {} has no LEO/EO plan", id))?;
            let parent = fetch_plan(client, parent_id).await?;
            let viewer = parent.organization.or(conn.viewer);
            let enricher = Enricher::new(client.clone(), config.enrichment_options());
            let tree = enricher
                .enrich_plan(&parent, viewer)
                .await?
                .restrict(&desk.selection());
            let rows = flatten(&tree);
            let summary = BudgetSummary::from_tree(&tree);
            Ok(render::format_team_desk_plan(
                &desk,
                &parent,
                &rows,
                &summary,
                tree.is_complete(),
            ))
        }
        DeskCommand::Submit { id } => {
            client
                .submit_team_desk_plan(id)
                .await
                .with_context(|| format!("Failed to submit Team/Desk plan {}", id))?;
            Ok(format!("Team/Desk plan {} submitted for review", id))
        }
        DeskCommand::Approve { id, feedback } => {
            workflow::approve_team_desk(client, id, feedback.as_deref())
                .await
                .with_context(|| format!("Failed to approve Team/Desk plan {}", id))?;
            Ok(format!("Team/Desk plan {} approved", id))
        }
        DeskCommand::Reject { id, feedback } => {
            workflow::reject_team_desk(client, id, &feedback)
                .await
                .with_context(|| format!("Failed to reject Team/Desk plan {}", id))?;
            Ok(format!("Team/Desk plan {} rejected", id))
        }
    }
}

async fn new_plan(
    draft: PlanDraft,
    dry_run: bool,
    conn: &Connection,
    enricher: &Enricher<PlanningClient>,
) -> Result<String> {
    let organization = draft.organization.or(conn.viewer).context(
        "No organization for the plan: set `organization` in the draft or pass --organization",
    )?;

    let mut session = PlanningSession::new(organization, draft.planner.as_str());
    if let Some(executive) = &draft.executive {
        session = session.with_executive(executive.as_str());
    }
    session.choose_plan_type(draft.plan_type)?;
    session.choose_selection_mode(draft.mode())?;

    let catalog = conn
        .client
        .objectives()
        .get_all()
        .await
        .context("Failed to fetch strategic objectives")?;
    let selected = draft
        .objectives
        .iter()
        .map(|id| {
            catalog
                .iter()
                .find(|o| o.id == *id)
                .cloned()
                .with_context(|| format!("Strategic objective {} does not exist", id))
        })
        .collect::<Result<Vec<_>>>()?;
    session.select_objectives(selected)?;
    for w in &draft.weights {
        session.set_planner_weight(w.objective, w.weight)?;
    }
    session.set_period(draft.from_date, draft.to_date)?;
    session.proceed_to_build()?;

    let tree = enricher
        .enrich(session.objectives().to_vec(), Some(organization))
        .await;
    let preview = render::format_rows(
        &flatten(&tree),
        &BudgetSummary::from_tree(&tree),
        tree.is_complete(),
    );
    session.preview(tree)?;

    if dry_run {
        return Ok(preview);
    }
    let plan = session.submit(&conn.client).await?;
    Ok(format!("{}\n\nPlan {} created and submitted for review", preview, plan.id))
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn load_tables(args: &CostArgs, client: Option<&PlanningClient>) -> Result<ReferenceTables> {
    if let Some(path) = &args.tables {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse reference tables {}", path.display()));
    }
    let client = client.context("Reference tables need either --tables or API access")?;
    let tables = ReferenceTables::load(client).await;
    if tables.is_degraded() {
        tracing::warn!(
            catalogs = ?tables.degraded,
            "Some reference tables could not be loaded; estimates may fail or use fallbacks"
        );
    }
    Ok(tables)
}

async fn cost(
    tool: &CostCommand,
    client: Option<&PlanningClient>,
    config: &Config,
) -> Result<String> {
    let args = tool.args();
    let tables = load_tables(args, client).await?;
    match tool {
        CostCommand::Meeting(_) => run_tool::<MeetingWorkshopInput>(args, &tables, config),
        CostCommand::Printing(_) => run_tool::<PrintingInput>(args, &tables, config),
        CostCommand::Procurement(_) => run_tool::<ProcurementInput>(args, &tables, config),
        CostCommand::Supervision(_) => run_tool::<SupervisionInput>(args, &tables, config),
    }
}

fn run_tool<T: CostingTool + DeserializeOwned>(
    args: &CostArgs,
    tables: &ReferenceTables,
    config: &Config,
) -> Result<String> {
    let input: T = read_toml(&args.input)?;
    if args.json {
        let budget = input.into_budget(tables, &config.costing)?;
        return serde_json::to_string_pretty(&budget).context("Failed to encode budget draft");
    }
    let estimate = input.estimate(tables, &config.costing)?;
    Ok(render::format_estimate(&estimate))
}

async fn dashboard(view: DashboardCommand, conn: &Connection, config: &Config) -> Result<String> {
    let client = &conn.client;
    let plans = client
        .plans()
        .get_all()
        .await
        .context("Failed to fetch plans")?;

    match view {
        DashboardCommand::Admin => {
            let organizations = client
                .organizations()
                .get_all()
                .await
                .context("Failed to fetch organizations")?;
            let budgets = plan_budgets(&plans, client, config).await;
            let dashboard = AdminDashboard::build(&plans, &organizations, &budgets);
            Ok(render::format_admin_dashboard(&dashboard))
        }
        DashboardCommand::Evaluator => {
            let dashboard = EvaluatorDashboard::build(&plans, &evaluator_organizations(conn));
            Ok(render::format_evaluator_dashboard(&dashboard))
        }
    }
}

/// Organizations the user evaluates for. Empty means every organization.
fn evaluator_organizations(conn: &Connection) -> Vec<u64> {
    let assigned: Vec<u64> = conn
        .status
        .iter()
        .flat_map(|s| &s.user_organizations)
        .filter(|m| m.role == Role::Evaluator)
        .filter_map(|m| m.organization)
        .collect();
    if assigned.is_empty() {
        conn.viewer.into_iter().collect()
    } else {
        assigned
    }
}

/// Budget summary per plan. Plans whose tree cannot be built are left out.
async fn plan_budgets(
    plans: &[Plan],
    client: &PlanningClient,
    config: &Config,
) -> HashMap<u64, BudgetSummary> {
    let enricher = Enricher::new(client.clone(), config.enrichment_options());
    let enricher = &enricher;

    stream::iter(plans)
        .map(|plan| async move { (plan.id, enricher.enrich_plan(plan, plan.organization).await) })
        .buffered(config.enrichment.concurrency.max(1))
        .filter_map(|(id, result)| async move {
            match result {
                Ok(tree) => Some((id, BudgetSummary::from_tree(&tree))),
                Err(e) => {
                    tracing::warn!(plan = id, "Skipping plan budget: {}", e);
                    None
                }
            }
        })
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::tables::fixtures;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    // ── plan drafts ──

    #[test]
    fn test_plan_draft_parses_and_infers_mode() {
        let file = write_file(
            r#"
            planner = "Abebe"
            plan_type = "LEO/EO Plan"
            objectives = [1, 2]
            from_date = "2025-07-08"
            to_date = "2026-07-07"

            [[weights]]
            objective = 1
            weight = 60

            [[weights]]
            objective = 2
            weight = 40
            "#,
        );
        let draft: PlanDraft = read_toml(file.path()).unwrap();
        assert_eq!(draft.plan_type, PlanType::LeoEo);
        assert_eq!(draft.organization, None);
        assert_eq!(draft.weights.len(), 2);
        assert_eq!(draft.mode(), SelectionMode::Custom);
    }

    #[test]
    fn test_plan_draft_without_weights_uses_default_mode() {
        let file = write_file(
            r#"
            planner = "Abebe"
            plan_type = "Desk/Team Plan"
            objectives = [3]
            from_date = "2025-07-08"
            to_date = "2026-07-07"
            "#,
        );
        let draft: PlanDraft = read_toml(file.path()).unwrap();
        assert_eq!(draft.mode(), SelectionMode::Default);
    }

    #[test]
    fn test_read_toml_reports_path() {
        let err = read_toml::<PlanDraft>(Path::new("/nonexistent/draft.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/draft.toml"));
    }

    // ── costing ──

    fn cost_args(input: &NamedTempFile, json: bool) -> CostArgs {
        CostArgs {
            input: input.path().to_path_buf(),
            tables: None,
            json,
        }
    }

    #[test]
    fn test_run_tool_renders_estimate() {
        let input = write_file(
            r#"
            [[documents]]
            document_type = "MANUAL"
            pages = 10
            copies = 100
            "#,
        );
        let output = run_tool::<PrintingInput>(
            &cost_args(&input, false),
            &fixtures::tables(),
            &Config::default(),
        )
        .unwrap();
        assert!(output.contains("2500.00"));
    }

    #[test]
    fn test_run_tool_json_budget() {
        let input = write_file(
            r#"
            [[items]]
            item_id = 7
            quantity = 2
            "#,
        );
        let output = run_tool::<ProcurementInput>(
            &cost_args(&input, true),
            &fixtures::tables(),
            &Config::default(),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["estimated_cost_with_tool"], serde_json::json!(90000.0));
    }

    #[tokio::test]
    async fn test_offline_tables_from_file() {
        let tables = write_file(&serde_json::to_string(&fixtures::tables()).unwrap());
        let input = write_file("");
        let args = CostArgs {
            input: input.path().to_path_buf(),
            tables: Some(tables.path().to_path_buf()),
            json: false,
        };
        let loaded = load_tables(&args, None).await.unwrap();
        assert_eq!(loaded.locations.len(), fixtures::tables().locations.len());
        assert_eq!(loaded.printing_price("MANUAL").unwrap(), 2.5);
    }

    #[tokio::test]
    async fn test_tables_need_source() {
        let input = write_file("");
        let args = cost_args(&input, false);
        assert!(load_tables(&args, None).await.is_err());
    }
}
