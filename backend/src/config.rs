use std::path::{Path, PathBuf};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const HELPER_SCRIPT: &str = "youtube_transcript.py";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const STREAM_IDLE_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Overrides the usual patterns directory search.
    pub patterns_dir: Option<PathBuf>,
    pub transcript_helper: HelperCommand,
    pub endpoints: VendorEndpoints,
    pub connect_timeout: Duration,
    /// Longest gap between two reads of a vendor stream.
    pub stream_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            patterns_dir: None,
            transcript_helper: HelperCommand::default(),
            endpoints: VendorEndpoints::default(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            stream_idle_timeout: Duration::from_secs(STREAM_IDLE_TIMEOUT_SECS),
        }
    }
}

/// External program that prints a transcript envelope as JSON on stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelperCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for HelperCommand {
    /// The bundled python helper, wherever it was found.
    fn default() -> Self {
        let candidates = helper_script_candidates();
        let script = candidates
            .iter()
            .find(|path| path.is_file())
            .or(candidates.last())
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| HELPER_SCRIPT.to_string());
        Self::python(script)
    }
}

/// Places the bundled helper may live: next to the executable, under the
/// working directory, then in this crate's source tree.
pub fn helper_script_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join("resources").join(HELPER_SCRIPT));
    }
    candidates.push(PathBuf::from("resources").join(HELPER_SCRIPT));
    candidates.push(PathBuf::from("backend").join("resources").join(HELPER_SCRIPT));
    candidates.push(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("resources")
            .join(HELPER_SCRIPT),
    );
    candidates
}

impl HelperCommand {
    /// Run `script` with the platform's python 3 launcher.
    pub fn python(script: impl Into<String>) -> Self {
        let (program, mut args) = if cfg!(windows) {
            ("py", vec!["-3".to_string()])
        } else {
            ("python3", Vec::new())
        };
        args.push(script.into());
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// The python script among the arguments, if the helper is run through one.
    pub fn script(&self) -> Option<&Path> {
        self.args
            .iter()
            .map(Path::new)
            .find(|arg| arg.extension().is_some_and(|ext| ext == "py"))
    }

    /// Split a shell-style command line on whitespace. Quoting is not supported.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Vendor API base URLs. Requests may still override these per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendorEndpoints {
    pub openai: String,
    pub anthropic: String,
    pub google: String,
}

impl Default for VendorEndpoints {
    fn default() -> Self {
        Self {
            openai: OPENAI_API_BASE.to_string(),
            anthropic: ANTHROPIC_API_BASE.to_string(),
            google: GEMINI_API_BASE.to_string(),
        }
    }
}
