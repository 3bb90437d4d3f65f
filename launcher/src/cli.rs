use clap::{Args, Parser, Subcommand, ValueEnum};
use shared::models::{ReasoningEffort, Strategy, Theme, Vendor};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fabric-desk", about = "Run Fabric patterns against AI vendors")]
pub struct Cli {
    /// Settings and favorites file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Start the companion server")]
    Serve(ServeArgs),
    #[command(about = "Run a pattern and stream the result to stdout")]
    Run(RunArgs),
    #[command(about = "List available patterns, favorites first")]
    Patterns {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        server: Option<String>,
    },
    #[command(about = "Toggle a pattern in the favorites list")]
    Favorite { name: String },
    #[command(about = "Show or change persisted settings")]
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,
    #[arg(long)]
    pub patterns_dir: Option<PathBuf>,
    /// Command line of the transcript helper (defaults to the bundled
    /// resources/youtube_transcript.py)
    #[arg(long)]
    pub transcript_helper: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    pub pattern: String,
    #[command(flatten)]
    pub input: InputArgs,
    #[arg(long)]
    pub timestamps: bool,
    /// Caption language for --youtube
    #[arg(long, requires = "youtube")]
    pub lang: Option<String>,
    /// Prompting strategy for this run only
    #[arg(long)]
    pub strategy: Option<StrategyArg>,
    #[arg(long)]
    pub vendor: Option<Vendor>,
    #[arg(long)]
    pub model: Option<String>,
    /// Companion server base URL
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Text to process; "-" reads stdin
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub youtube: Option<String>,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    Show,
    SetKey { vendor: Vendor, key: String },
    SetVendor { vendor: Vendor },
    SetModel { model: String },
    SetTheme { theme: ThemeArg },
    SetReasoning { effort: EffortArg },
    SetStrategy { strategy: StrategyArg },
    SetSampling {
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        top_p: Option<f32>,
    },
    SetServer { url: String },
    SetOllamaUrl { url: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
    System,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
            ThemeArg::System => Theme::System,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum EffortArg {
    None,
    Low,
    Medium,
    High,
}

impl From<EffortArg> for ReasoningEffort {
    fn from(arg: EffortArg) -> Self {
        match arg {
            EffortArg::None => ReasoningEffort::None,
            EffortArg::Low => ReasoningEffort::Low,
            EffortArg::Medium => ReasoningEffort::Medium,
            EffortArg::High => ReasoningEffort::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Off,
    ChainOfThought,
    TreeOfThought,
    SelfConsistency,
    React,
    ExpertPersona,
    StructuredOutput,
    Socratic,
}

impl From<StrategyArg> for Option<Strategy> {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Off => None,
            StrategyArg::ChainOfThought => Some(Strategy::ChainOfThought),
            StrategyArg::TreeOfThought => Some(Strategy::TreeOfThought),
            StrategyArg::SelfConsistency => Some(Strategy::SelfConsistency),
            StrategyArg::React => Some(Strategy::ReAct),
            StrategyArg::ExpertPersona => Some(Strategy::ExpertPersona),
            StrategyArg::StructuredOutput => Some(Strategy::StructuredOutput),
            StrategyArg::Socratic => Some(Strategy::Socratic),
        }
    }
}
