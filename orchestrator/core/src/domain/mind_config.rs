// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Mind Configuration Types
//
// Defines the configuration schema for a mindloop agent, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Workspace location and protected plugins
// - Drive weights per maturity stage
// - Proposer breadth, safety limits and harness limits
// - Curriculum, escalation and external knowledge settings
// - Reflection service and observability settings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "mindloop/v1";
pub const KIND: &str = "MindConfig";

/// Top-level Kubernetes-style mind configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindConfigManifest {
    /// API version (must be "mindloop/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "MindConfig")
    pub kind: String,

    /// Agent metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Agent configuration specification
    #[serde(default)]
    pub spec: MindConfig,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable agent name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Agent configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MindConfig {
    pub workspace: WorkspaceConfig,
    #[serde(rename = "loop")]
    pub life_loop: LoopConfig,
    pub drives: DriveConfig,
    pub proposer: ProposerConfig,
    pub safety: SafetyConfig,
    pub harness: HarnessConfig,
    pub curriculum: CurriculumConfig,
    pub escalation: EscalationConfig,
    pub knowledge: KnowledgeConfig,
    pub reflection: ReflectionConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory holding plugins/, tasks/, state/ and backups/
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,

    /// Plugins the agent may read and test but never mutate
    #[serde(default)]
    pub protected_plugins: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            protected_plugins: vec![],
        }
    }
}

impl WorkspaceConfig {
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Sequential,
    Pipeline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Pause between steps
    #[serde(with = "humantime_serde", default = "default_step_interval")]
    pub step_interval: Duration,

    /// Stop after this many steps (unbounded when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,

    /// Distinct plugins acted on per step
    #[serde(default = "default_targets_per_step")]
    pub targets_per_step: usize,

    #[serde(default)]
    pub mode: LoopMode,

    /// Concurrent coder workers in pipeline mode
    #[serde(default = "default_coder_workers")]
    pub coder_workers: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            step_interval: default_step_interval(),
            max_steps: None,
            targets_per_step: default_targets_per_step(),
            mode: LoopMode::Sequential,
            coder_workers: default_coder_workers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveWeights {
    pub curiosity: f64,
    pub mastery: f64,
    pub stability: f64,
    pub task_pressure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Weight table indexed by stage; the last row applies to higher stages
    #[serde(default = "default_stage_weights")]
    pub stage_weights: Vec<DriveWeights>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            stage_weights: default_stage_weights(),
        }
    }
}

impl DriveConfig {
    pub fn weights_for(&self, stage: usize) -> Option<&DriveWeights> {
        self.stage_weights
            .get(stage)
            .or_else(|| self.stage_weights.last())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposerConfig {
    /// Candidate breadth indexed by stage; the last entry applies to higher stages
    #[serde(default = "default_max_candidates")]
    pub max_candidates: Vec<usize>,

    /// Longest comment line the annotate pattern may add
    #[serde(default = "default_annotate_max_chars")]
    pub annotate_max_chars: usize,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            annotate_max_chars: default_annotate_max_chars(),
        }
    }
}

impl ProposerConfig {
    pub fn max_candidates_for(&self, stage: usize) -> usize {
        self.max_candidates
            .get(stage)
            .or_else(|| self.max_candidates.last())
            .copied()
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_max_patch_bytes")]
    pub max_patch_bytes: usize,

    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,

    /// Maximum ratio of post-image to pre-image syntax nodes
    #[serde(default = "default_max_growth_factor")]
    pub max_growth_factor: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_patch_bytes: default_max_patch_bytes(),
            max_source_bytes: default_max_source_bytes(),
            max_growth_factor: default_max_growth_factor(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    #[default]
    Interpreter,
    Process,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub runner: RunnerKind,

    /// Wall-clock limit for one harness run
    #[serde(with = "humantime_serde", default = "default_harness_timeout")]
    pub timeout: Duration,

    /// Evaluation fuel per requirement
    #[serde(default = "default_fuel")]
    pub fuel: u64,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Executable spawned by the process runner (defaults to the running binary)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_command: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            runner: RunnerKind::Interpreter,
            timeout: default_harness_timeout(),
            fuel: default_fuel(),
            max_depth: default_max_depth(),
            worker_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumConfig {
    /// Consecutive successes needed to master a task
    #[serde(default = "default_mastery_threshold")]
    pub mastery_threshold: u32,

    /// Mastered tasks needed to leave a phase (default: every task in it)
    #[serde(default)]
    pub phase_quotas: BTreeMap<u32, usize>,

    /// Skill (age + accepted mutations) needed for each stage above 0
    #[serde(default = "default_stage_thresholds")]
    pub stage_thresholds: Vec<u64>,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: default_mastery_threshold(),
            phase_quotas: BTreeMap::new(),
            stage_thresholds: default_stage_thresholds(),
        }
    }
}

impl CurriculumConfig {
    pub fn max_stage(&self) -> usize {
        self.stage_thresholds.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// A consult fires once an error streak exceeds this value
    #[serde(default = "default_escalation_threshold")]
    pub threshold: u32,

    /// Lowest stage allowed to consult
    #[serde(default = "default_escalation_min_stage")]
    pub min_stage: u8,

    /// Steps before the same signature may be consulted again
    #[serde(default = "default_cooldown_steps")]
    pub cooldown_steps: u64,

    /// Stored knowledge is truncated to this many characters
    #[serde(default = "default_knowledge_max_chars")]
    pub knowledge_max_chars: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            threshold: default_escalation_threshold(),
            min_stage: default_escalation_min_stage(),
            cooldown_steps: default_cooldown_steps(),
            knowledge_max_chars: default_knowledge_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<WebConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL of the knowledge graph service (GET /ask?text=...)
    pub endpoint: String,

    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub timeout: Duration,

    #[serde(default = "default_neighbor_limit")]
    pub neighbor_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Hosts that may be fetched
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Page fetched for a signature; `{signature}` is substituted
    #[serde(default = "default_url_template")]
    pub url_template: String,

    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub timeout: Duration,

    /// Minimum spacing between two fetches
    #[serde(with = "humantime_serde", default = "default_min_interval")]
    pub min_interval: Duration,

    #[serde(default = "default_knowledge_max_chars")]
    pub max_chars: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: default_allowed_hosts(),
            url_template: default_url_template(),
            timeout: default_request_timeout(),
            min_interval: default_min_interval(),
            max_chars: default_knowledge_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionConfig {
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible base URL (".../v1")
    #[serde(default = "default_reflection_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_reflection_model")]
    pub model: String,

    /// API key (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(with = "humantime_serde", default = "default_reflection_timeout")]
    pub timeout: Duration,

    #[serde(default = "default_reflection_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_reflection_endpoint(),
            model: default_reflection_model(),
            api_key: None,
            timeout: default_reflection_timeout(),
            max_tokens: default_reflection_max_tokens(),
        }
    }
}

impl ReflectionConfig {
    /// Resolve `api_key`, expanding the "env:VAR_NAME" form.
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.api_key.as_ref()?;
        match key.strip_prefix("env:") {
            Some(var) => std::env::var(var).ok(),
            None => Some(key.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expose Prometheus metrics on this port when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

impl Default for MindConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "mindloop".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: MindConfig::default(),
        }
    }
}

impl MindConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. MINDLOOP_CONFIG_PATH environment variable
    /// 2. ./mindloop.yaml (working directory)
    /// 3. ~/.mindloop/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MINDLOOP_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./mindloop.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mindloop").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MINDLOOP_WORKSPACE_ROOT") {
            tracing::info!("Environment override: MINDLOOP_WORKSPACE_ROOT={}", val);
            self.spec.workspace.root = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("MINDLOOP_RUNNER") {
            match val.to_lowercase().as_str() {
                "interpreter" => self.spec.harness.runner = RunnerKind::Interpreter,
                "process" => self.spec.harness.runner = RunnerKind::Process,
                _ => {
                    tracing::warn!(
                        "Invalid value for MINDLOOP_RUNNER: '{}'. Expected interpreter/process. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("MINDLOOP_HARNESS_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => self.spec.harness.timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(
                    "Invalid value for MINDLOOP_HARNESS_TIMEOUT_SECS: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Ok(val) = std::env::var("MINDLOOP_GRAPH_ENDPOINT") {
            tracing::info!("Environment override: MINDLOOP_GRAPH_ENDPOINT={}", val);
            match self.spec.knowledge.graph.as_mut() {
                Some(graph) => graph.endpoint = val,
                None => {
                    self.spec.knowledge.graph = Some(GraphConfig {
                        endpoint: val,
                        timeout: default_request_timeout(),
                        neighbor_limit: default_neighbor_limit(),
                    })
                }
            }
        }

        if let Ok(val) = std::env::var("MINDLOOP_REFLECTION_ENDPOINT") {
            tracing::info!("Environment override: MINDLOOP_REFLECTION_ENDPOINT={}", val);
            self.spec.reflection.endpoint = val;
            self.spec.reflection.enabled = true;
        }

        if let Ok(val) = std::env::var("MINDLOOP_REFLECTION_MODEL") {
            self.spec.reflection.model = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        if spec.workspace.root.as_os_str().is_empty() {
            anyhow::bail!("spec.workspace.root cannot be empty");
        }

        for name in &spec.workspace.protected_plugins {
            if !crate::domain::plugin::PluginId::is_valid(name) {
                anyhow::bail!("spec.workspace.protected_plugins contains invalid name '{}'", name);
            }
        }

        if spec.life_loop.targets_per_step == 0 {
            anyhow::bail!("spec.loop.targets_per_step must be at least 1");
        }

        if spec.life_loop.coder_workers == 0 {
            anyhow::bail!("spec.loop.coder_workers must be at least 1");
        }

        if spec.drives.stage_weights.is_empty() {
            anyhow::bail!("spec.drives.stage_weights needs at least one row");
        }

        for (stage, w) in spec.drives.stage_weights.iter().enumerate() {
            let all = [w.curiosity, w.mastery, w.stability, w.task_pressure];
            if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
                anyhow::bail!(
                    "spec.drives.stage_weights[{}] must be finite and non-negative",
                    stage
                );
            }
        }

        if spec.proposer.max_candidates.is_empty()
            || spec.proposer.max_candidates.iter().any(|n| *n == 0)
        {
            anyhow::bail!("spec.proposer.max_candidates entries must be at least 1");
        }

        if spec.safety.max_patch_bytes == 0 || spec.safety.max_source_bytes == 0 {
            anyhow::bail!("spec.safety size limits must be positive");
        }

        if !(spec.safety.max_growth_factor.is_finite() && spec.safety.max_growth_factor >= 1.0) {
            anyhow::bail!("spec.safety.max_growth_factor must be >= 1.0");
        }

        if spec.harness.timeout.is_zero() {
            anyhow::bail!("spec.harness.timeout must be positive");
        }

        if spec.harness.fuel == 0 || spec.harness.max_depth == 0 {
            anyhow::bail!("spec.harness.fuel and max_depth must be positive");
        }

        if spec.curriculum.mastery_threshold == 0 {
            anyhow::bail!("spec.curriculum.mastery_threshold must be at least 1");
        }

        if spec
            .curriculum
            .stage_thresholds
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            anyhow::bail!("spec.curriculum.stage_thresholds must be strictly ascending");
        }

        if spec.curriculum.stage_thresholds.len() > u8::MAX as usize {
            anyhow::bail!("spec.curriculum.stage_thresholds has too many entries");
        }

        if spec.escalation.min_stage as usize > spec.curriculum.max_stage() {
            anyhow::bail!(
                "spec.escalation.min_stage {} is above the highest stage {}",
                spec.escalation.min_stage,
                spec.curriculum.max_stage()
            );
        }

        if let Some(graph) = &spec.knowledge.graph {
            if graph.endpoint.is_empty() {
                anyhow::bail!("spec.knowledge.graph.endpoint cannot be empty");
            }
        }

        if let Some(web) = &spec.knowledge.web {
            if web.allowed_hosts.is_empty() {
                anyhow::bail!("spec.knowledge.web.allowed_hosts cannot be empty");
            }
            let probe = web.url_template.replace("{signature}", "timeout");
            let parsed = url::Url::parse(&probe)
                .map_err(|e| anyhow::anyhow!("spec.knowledge.web.url_template is invalid: {}", e))?;
            let host = parsed.host_str().unwrap_or_default();
            if !web.allowed_hosts.iter().any(|h| h == host) {
                anyhow::bail!(
                    "spec.knowledge.web.url_template host '{}' is not in allowed_hosts",
                    host
                );
            }
        }

        if spec.reflection.enabled && spec.reflection.endpoint.is_empty() {
            anyhow::bail!("spec.reflection.endpoint cannot be empty when reflection is enabled");
        }

        Ok(())
    }
}


fn default_workspace_root() -> PathBuf {
    PathBuf::from("./mindloop-workspace")
}

fn default_step_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_targets_per_step() -> usize {
    1
}

fn default_coder_workers() -> usize {
    2
}

fn default_stage_weights() -> Vec<DriveWeights> {
    vec![
        DriveWeights {
            curiosity: 2.0,
            mastery: 1.0,
            stability: 0.5,
            task_pressure: 1.0,
        },
        DriveWeights {
            curiosity: 1.5,
            mastery: 1.5,
            stability: 1.0,
            task_pressure: 1.5,
        },
        DriveWeights {
            curiosity: 1.0,
            mastery: 2.0,
            stability: 1.0,
            task_pressure: 2.0,
        },
        DriveWeights {
            curiosity: 0.8,
            mastery: 2.5,
            stability: 1.2,
            task_pressure: 2.5,
        },
    ]
}

fn default_max_candidates() -> Vec<usize> {
    vec![2, 3, 4, 6]
}

fn default_annotate_max_chars() -> usize {
    80
}

fn default_max_patch_bytes() -> usize {
    4096
}

fn default_max_source_bytes() -> usize {
    16384
}

fn default_max_growth_factor() -> f64 {
    4.0
}

fn default_harness_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_fuel() -> u64 {
    100_000
}

fn default_max_depth() -> usize {
    64
}

fn default_mastery_threshold() -> u32 {
    3
}

fn default_stage_thresholds() -> Vec<u64> {
    vec![5, 20, 50]
}

fn default_escalation_threshold() -> u32 {
    3
}

fn default_escalation_min_stage() -> u8 {
    1
}

fn default_cooldown_steps() -> u64 {
    20
}

fn default_knowledge_max_chars() -> usize {
    4000
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_neighbor_limit() -> usize {
    20
}

fn default_allowed_hosts() -> Vec<String> {
    vec![
        "docs.python.org".to_string(),
        "realpython.com".to_string(),
        "developer.mozilla.org".to_string(),
    ]
}

fn default_url_template() -> String {
    "https://developer.mozilla.org/en-US/search?q={signature}".to_string()
}

fn default_min_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_reflection_endpoint() -> String {
    "http://127.0.0.1:11434/v1".to_string()
}

fn default_reflection_model() -> String {
    "llama3.2:1b".to_string()
}

fn default_reflection_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_reflection_max_tokens() -> u32 {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}
