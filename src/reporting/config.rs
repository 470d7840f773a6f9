// ABOUTME: Configuration structures for report rendering
// ABOUTME: Defines partial directories, template naming, recursion limits and helper aliases

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::template::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_EXPANSIONS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    /// Directories whose templates are registered as partials before rendering
    #[serde(default)]
    pub partial_dirs: Vec<PathBuf>,
    #[serde(default = "default_extension")]
    pub template_extension: String,
    #[serde(default = "default_max_depth")]
    pub max_partial_depth: usize,
    /// Partial expansions allowed per render across all branches
    #[serde(default = "default_max_expansions")]
    pub max_partial_expansions: usize,
    /// Extra helper names mapped onto registered helpers, e.g. `fmtDate: formatDate`
    #[serde(default)]
    pub helper_aliases: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub builtin_partials: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            partial_dirs: Vec::new(),
            template_extension: default_extension(),
            max_partial_depth: default_max_depth(),
            max_partial_expansions: default_max_expansions(),
            helper_aliases: HashMap::new(),
            builtin_partials: true,
        }
    }
}

fn default_extension() -> String {
    "html".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_expansions() -> usize {
    DEFAULT_MAX_EXPANSIONS
}

fn default_true() -> bool {
    true
}
