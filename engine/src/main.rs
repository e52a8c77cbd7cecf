//! `qoverflow` command: drive the reputation engine from the shell.
//!
//! Each invocation optionally logs in with `--user`/`--proof`, runs one
//! engine operation as that user and prints the resulting outcome as JSON.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use mockable::{Clock, DefaultClock};
use reputation_engine::domain::{
    Action, AnswerSnapshot, CallPolicy, CredentialProof, EditVoteId, Error, PostRef,
    QuestionSnapshot, Session, StatusVote, TokioSleeper, Username, VoteCounts, VoteDirection,
    VoteRequest, VoteTarget,
};
use reputation_engine::outbound::http::{QaHttpClient, QaHttpConfig};
use reputation_engine::outbound::memory::InMemoryQaStore;
use reputation_engine::{EnginePorts, EngineSettings, Outcome, ReputationEngine, Standing};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `qoverflow` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "qoverflow",
    about = "Reputation-gated voting, bounties and badges for qOverflow",
    version
)]
struct CliArgs {
    /// Log in as this user before running the command.
    #[arg(long = "user", value_name = "username", global = true, value_parser = parse_username)]
    user: Option<Username>,
    /// Credential proof for `--user`.
    #[arg(long = "proof", value_name = "proof", global = true)]
    proof: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and print the session.
    Login,
    /// Print the user's level, privileges and next threshold.
    Standing,
    /// Check whether the user may perform an action.
    Authorize {
        /// Action to check.
        #[arg(value_enum)]
        action: ActionArg,
    },
    /// Cast, toggle off or switch a vote.
    Vote {
        /// Voted item as JSON, e.g. `{"kind":"question","questionId":"q1","creator":"bob"}`.
        #[arg(long, value_parser = parse_json::<VoteTarget>)]
        target: VoteTarget,
        /// Requested direction.
        #[arg(long, value_enum)]
        direction: DirectionArg,
        /// Currently displayed upvotes.
        #[arg(long, default_value_t = 0)]
        upvotes: u32,
        /// Currently displayed downvotes.
        #[arg(long, default_value_t = 0)]
        downvotes: u32,
    },
    /// Retract whichever vote the user holds.
    Unvote {
        /// Voted item as JSON.
        #[arg(long, value_parser = parse_json::<VoteTarget>)]
        target: VoteTarget,
        /// Currently displayed upvotes.
        #[arg(long, default_value_t = 0)]
        upvotes: u32,
        /// Currently displayed downvotes.
        #[arg(long, default_value_t = 0)]
        downvotes: u32,
    },
    /// Escrow points as a bounty on a question.
    CreateBounty {
        /// Question as JSON, e.g. `{"id":"q1","creator":"alice"}`.
        #[arg(long, value_parser = parse_json::<QuestionSnapshot>)]
        question: QuestionSnapshot,
        /// Points to escrow.
        #[arg(long)]
        amount: u32,
    },
    /// Pay a bounty to the accepted answer.
    AwardBounty {
        /// Question as JSON.
        #[arg(long, value_parser = parse_json::<QuestionSnapshot>)]
        question: QuestionSnapshot,
        /// Accepted answer as JSON.
        #[arg(long, value_parser = parse_json::<AnswerSnapshot>)]
        answer: AnswerSnapshot,
    },
    /// Accept an answer on the user's question.
    Accept {
        /// Question as JSON.
        #[arg(long, value_parser = parse_json::<QuestionSnapshot>)]
        question: QuestionSnapshot,
        /// Answer as JSON.
        #[arg(long, value_parser = parse_json::<AnswerSnapshot>)]
        answer: AnswerSnapshot,
    },
    /// Vote to protect, close or reopen a question.
    Status {
        /// Question as JSON.
        #[arg(long, value_parser = parse_json::<QuestionSnapshot>)]
        question: QuestionSnapshot,
        /// Status vote.
        #[arg(long, value_enum)]
        vote: StatusArg,
    },
    /// Open an edit vote on a post.
    ProposeEdit {
        /// Post as JSON, e.g. `{"kind":"question","questionId":"q1"}`.
        #[arg(long, value_parser = parse_json::<PostRef>)]
        post: PostRef,
        /// Replacement title, questions only.
        #[arg(long)]
        title: Option<String>,
        /// Replacement body.
        #[arg(long)]
        body: String,
    },
    /// Approve an open edit vote.
    ApproveEdit {
        /// Post as JSON.
        #[arg(long, value_parser = parse_json::<PostRef>)]
        post: PostRef,
        /// Edit vote identifier.
        #[arg(long = "edit-vote", value_parser = parse_edit_vote_id)]
        edit_vote_id: EditVoteId,
    },
    /// Award badges for a completed profile.
    CompleteProfile,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    CreateAnswer,
    Upvote,
    Comment,
    Downvote,
    ViewVoteCounts,
    ProtectQuestion,
    CloseOrReopenQuestion,
    VoteOnEdit,
}

impl From<ActionArg> for Action {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::CreateAnswer => Self::CreateAnswer,
            ActionArg::Upvote => Self::Upvote,
            ActionArg::Comment => Self::Comment,
            ActionArg::Downvote => Self::Downvote,
            ActionArg::ViewVoteCounts => Self::ViewVoteCounts,
            ActionArg::ProtectQuestion => Self::ProtectQuestion,
            ActionArg::CloseOrReopenQuestion => Self::CloseOrReopenQuestion,
            ActionArg::VoteOnEdit => Self::VoteOnEdit,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for VoteDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Up => Self::Up,
            DirectionArg::Down => Self::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Protect,
    Close,
    Reopen,
}

impl From<StatusArg> for StatusVote {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Protect => Self::Protect,
            StatusArg::Close => Self::Close,
            StatusArg::Reopen => Self::Reopen,
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = EngineSettings::load()?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args, &settings))
}

async fn run(args: CliArgs, settings: &EngineSettings) -> Result<ExitCode> {
    let engine = build_engine(settings)?;

    let session = match (args.user, args.proof) {
        (Some(username), Some(proof)) => {
            let outcome = engine.login(&username, &CredentialProof::new(proof)).await;
            if !outcome.success {
                return emit(&outcome);
            }
            outcome.data
        }
        (Some(_), None) | (None, Some(_)) => {
            return emit(&Outcome::<Session>::failed(Error::invalid_request(
                "--user and --proof must be given together",
            )));
        }
        (None, None) => None,
    };
    let actor = session.as_ref().map(|session| &session.user);

    match args.command {
        Command::Login => match session {
            Some(session) => emit(&Outcome::ok(session)),
            None => emit(&logged_out::<Session>()),
        },
        Command::Standing => match actor {
            Some(user) => emit(&Outcome::ok(engine.standing(user))),
            None => emit(&logged_out::<Standing>()),
        },
        Command::Authorize { action } => emit(&engine.authorize(actor, action.into())),
        Command::Vote {
            target,
            direction,
            upvotes,
            downvotes,
        } => {
            let request = VoteRequest {
                target,
                direction: direction.into(),
                counts: VoteCounts::new(upvotes, downvotes),
            };
            emit(&engine.cast_vote(actor, &request).await)
        }
        Command::Unvote {
            target,
            upvotes,
            downvotes,
        } => emit(
            &engine
                .undo_vote(actor, &target, VoteCounts::new(upvotes, downvotes))
                .await,
        ),
        Command::CreateBounty { question, amount } => {
            emit(&engine.create_bounty(actor, &question, amount).await)
        }
        Command::AwardBounty { question, answer } => {
            emit(&engine.award_bounty(actor, &question, &answer).await)
        }
        Command::Accept { question, answer } => {
            emit(&engine.accept_answer(actor, &question, &answer).await)
        }
        Command::Status { question, vote } => {
            emit(&engine.vote_on_status(actor, &question, vote.into()).await)
        }
        Command::ProposeEdit { post, title, body } => {
            emit(&engine.trigger_edit_vote(actor, &post, title, body).await)
        }
        Command::ApproveEdit { post, edit_vote_id } => {
            emit(&engine.vote_on_edit(actor, &post, &edit_vote_id).await)
        }
        Command::CompleteProfile => emit(&engine.complete_profile(actor).await),
    }
}

fn build_engine(settings: &EngineSettings) -> Result<ReputationEngine> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let policy = CallPolicy::new(settings.call_policy_config(), clock.clone());
    let ports = if settings.demo_mode {
        warn!("demo mode enabled: using the in-memory store, the remote API is not contacted");
        EnginePorts::shared(Arc::new(InMemoryQaStore::demo()))
    } else {
        let config = QaHttpConfig {
            base_url: settings.api_base_url()?,
            api_key: settings.api_key()?.to_owned(),
            timeout: settings.request_timeout(),
            min_request_interval: settings.min_request_interval(),
        };
        let client = QaHttpClient::new(config, clock, Arc::new(TokioSleeper))
            .wrap_err("build HTTP client")?;
        EnginePorts::shared(Arc::new(client))
    };
    Ok(ReputationEngine::new(ports, policy))
}

fn logged_out<T>() -> Outcome<T> {
    Outcome::failed(Error::unauthenticated(
        "log in with --user and --proof to run this command",
    ))
}

fn emit<T: Serialize>(outcome: &Outcome<T>) -> Result<ExitCode> {
    let rendered = serde_json::to_string_pretty(outcome).wrap_err("render outcome")?;
    writeln!(io::stdout().lock(), "{rendered}").wrap_err("write outcome")?;
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn parse_username(raw: &str) -> Result<Username, String> {
    Username::new(raw).map_err(|error| error.to_string())
}

fn parse_edit_vote_id(raw: &str) -> Result<EditVoteId, String> {
    EditVoteId::new(raw).map_err(|error| error.to_string())
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid JSON argument: {error}"))
}
