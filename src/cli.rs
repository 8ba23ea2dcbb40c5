// src/cli.rs
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::core::downloads::{ArtifactKind, ArtifactSaver};
use crate::core::gateway::AnalysisGateway;
use crate::core::service_client::ServiceClient;
use crate::display::{
    render_details, render_history, render_recent, render_result, render_stats,
};
use crate::environment::{self, SessionSettings};
use crate::history::{filter_entries, paginate, recent, HistoryStats, RECENT_LIMIT};
use crate::input::{InputMode, ResumeFile, JOB_ROLES};
use crate::session::Identity;
use crate::workflow::{AnalysisWorkflow, WorkflowState};

#[derive(Parser)]
#[command(name = "resumate")]
#[command(about = "Analyze resumes against a target role")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where downloaded artifacts are saved
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Config file (defaults to ./resumate.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Default)]
pub struct SessionArgs {
    /// Signed-in user id
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    #[arg(long, global = true)]
    pub user_name: Option<String>,

    #[arg(long, global = true)]
    pub user_email: Option<String>,

    /// Session token issued by the identity provider
    #[arg(long, global = true)]
    pub session_token: Option<String>,
}

impl From<SessionArgs> for SessionSettings {
    fn from(args: SessionArgs) -> Self {
        Self {
            token: args.session_token,
            user_id: args.user_id,
            display_name: args.user_name,
            email: args.user_email,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a resume for a target role
    Analyze {
        /// Target job role
        #[arg(long)]
        role: String,
        /// Resume text
        #[arg(long, conflicts_with_all = ["text_file", "file"])]
        text: Option<String>,
        /// Read resume text from a file
        #[arg(long, conflicts_with = "file")]
        text_file: Option<PathBuf>,
        /// Upload a resume document (pdf, doc, docx, txt)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Artifacts to save after a successful analysis
        #[arg(long, num_args = 1..)]
        download: Vec<ArtifactKind>,
    },
    /// List past analyses
    History {
        #[arg(long)]
        search: Option<String>,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Show one past analysis
    Show { analysis_id: String },
    /// Delete one past analysis
    Delete { analysis_id: String },
    /// Save an artifact of a past analysis
    Download {
        kind: ArtifactKind,
        analysis_id: String,
        /// Role used in the saved file name
        #[arg(long)]
        role: Option<String>,
    },
    /// Profile summary of past analyses
    Stats,
    /// List suggested job roles
    Roles,
}

/// Everything a command needs, built once from flags, env and config file.
struct Runtime {
    config: ClientConfig,
    gateway: Arc<dyn AnalysisGateway>,
    identity: Arc<dyn Identity>,
}

impl Runtime {
    fn build(
        api_url: Option<String>,
        download_dir: Option<PathBuf>,
        config_path: Option<PathBuf>,
        session: SessionSettings,
    ) -> Result<Self> {
        let mut config = environment::load(config_path.as_deref())?;
        if let Some(url) = api_url {
            config = config.with_api_url(url);
        }
        if let Some(dir) = download_dir {
            config = config.with_download_dir(dir);
        }
        debug!("Using backend {}", config.api_url);

        let client = ServiceClient::new(&config.api_url, config.timeout_seconds)?;
        let identity = session.or(SessionSettings::from_env()).into_identity()?;

        Ok(Self {
            config,
            gateway: Arc::new(client),
            identity,
        })
    }

    fn workflow(&self) -> AnalysisWorkflow {
        AnalysisWorkflow::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.identity),
            ArtifactSaver::new(&self.config.download_dir),
        )
    }

    fn require_user(&self) -> Result<String> {
        self.identity
            .user_id()
            .context("Sign in first: pass --user-id or --session-token")
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let ctx = Runtime::build(cli.api_url, cli.download_dir, cli.config, cli.session.into())?;

    match cli.command {
        Command::Analyze {
            role,
            text,
            text_file,
            file,
            download,
        } => {
            let mut workflow = ctx.workflow();
            workflow.mount().await;

            if let Some(path) = file {
                let resume = ResumeFile::load(&path).await?;
                workflow.select_mode(InputMode::File);
                workflow.stage_file(resume)?;
            } else {
                let text = match (text, text_file) {
                    (Some(text), _) => text,
                    (None, Some(path)) => tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                    (None, None) => bail!("Provide --text, --text-file or --file"),
                };
                workflow.set_text(text);
            }
            workflow.set_role(role);

            if !workflow.can_analyze() {
                bail!("A resume and a target role are required");
            }

            println!("Analyzing resume...");
            workflow.analyze().await;

            match workflow.state() {
                WorkflowState::Succeeded(result) => {
                    print!("{}", render_result(result, workflow.result_role()));
                }
                WorkflowState::Failed(message) => bail!("{}", message),
                other => bail!("Unexpected workflow state: {}", other.name()),
            }

            for kind in download {
                match workflow.download(kind).await {
                    Some(path) => println!("Saved {} to {}", kind.display_name(), path.display()),
                    None => {
                        if let Some(message) = workflow.download_error() {
                            eprintln!("{}", message);
                        }
                    }
                }
            }
        }

        Command::History {
            search,
            page,
            per_page,
        } => {
            let user_id = ctx.require_user()?;
            let entries = ctx
                .gateway
                .history(&user_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            let filtered = filter_entries(&entries, search.as_deref().unwrap_or(""));
            let rows = per_page.unwrap_or(ctx.config.rows_per_page);
            let page = paginate(&filtered, page.saturating_sub(1), rows);
            print!("{}", render_history(&page));
        }

        Command::Show { analysis_id } => {
            let details = ctx
                .workflow()
                .fetch_details(&analysis_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print!("{}", render_details(&details));
        }

        Command::Delete { analysis_id } => {
            ctx.require_user()?;
            let mut workflow = ctx.workflow();
            if workflow.delete_analysis(&analysis_id).await {
                println!("Deleted analysis {}", analysis_id);
            } else {
                bail!(
                    "{}",
                    workflow.history_error().unwrap_or("Failed to delete analysis")
                );
            }
        }

        Command::Download {
            kind,
            analysis_id,
            role,
        } => {
            let saver = ArtifactSaver::new(&ctx.config.download_dir);
            let path = saver
                .download(ctx.gateway.as_ref(), kind, &analysis_id, role.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            info!("Downloaded {} for {}", kind.display_name(), analysis_id);
            println!("Saved {} to {}", kind.display_name(), path.display());
        }

        Command::Stats => {
            let user_id = ctx.require_user()?;
            let entries = ctx
                .gateway
                .history(&user_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let stats = HistoryStats::from_entries(&entries);
            print!("{}", render_stats(&stats, &ctx.identity.greeting_name()));
            print!("\n{}", render_recent(recent(&entries, RECENT_LIMIT)));
        }

        Command::Roles => {
            for role in JOB_ROLES {
                println!("{}", role);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_text() {
        let cli = Cli::try_parse_from([
            "resumate",
            "analyze",
            "--role",
            "Data Scientist",
            "--text",
            "Ten years of Python",
            "--download",
            "resume",
            "report",
        ])
        .unwrap();

        match cli.command {
            Command::Analyze {
                role,
                text,
                download,
                ..
            } => {
                assert_eq!(role, "Data Scientist");
                assert_eq!(text.as_deref(), Some("Ten years of Python"));
                assert_eq!(download, vec![ArtifactKind::Resume, ArtifactKind::Report]);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = Cli::try_parse_from([
            "resumate", "analyze", "--role", "QA", "--text", "x", "--file", "cv.pdf",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_session_flags() {
        let cli = Cli::try_parse_from([
            "resumate",
            "history",
            "--user-id",
            "user_1",
            "--api-url",
            "http://localhost:9000/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api"));

        let settings: SessionSettings = cli.session.into();
        assert_eq!(settings.user_id.as_deref(), Some("user_1"));
    }

    #[test]
    fn test_download_kind_parses() {
        let cli =
            Cli::try_parse_from(["resumate", "download", "cover-letter", "a-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Download {
                kind: ArtifactKind::CoverLetter,
                ..
            }
        ));
    }
}
