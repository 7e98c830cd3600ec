//! Analysis context assembly.
//!
//! Callers hand over build metadata, environment, recent log lines, and the
//! content under analysis; this module renders the context block the CLI
//! receives. Environment variables that look like secrets are filtered out
//! before anything leaves the process.

/// Metadata about the build issuing the analysis. All fields optional; what
/// is present gets rendered.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub job_name: String,
    pub build_number: Option<u64>,
    pub build_status: String,
    pub stage_name: String,
    pub step_name: String,
    pub workspace_path: String,
    pub environment: Vec<(String, String)>,
    pub recent_logs: Vec<String>,
    pub content: String,
}

const SENSITIVE_MARKERS: &[&str] = &["PASSWORD", "SECRET", "TOKEN", "KEY", "CREDENTIAL"];

/// True if an environment variable name looks like it carries a secret.
pub fn is_sensitive_var(name: &str) -> bool {
    let upper = name.to_uppercase();
    SENSITIVE_MARKERS.iter().any(|m| upper.contains(m))
}

impl AnalysisContext {
    /// Render the full context block: pipeline metadata, filtered
    /// environment, recent logs, then the content to analyze.
    pub fn build_context_string(&self) -> String {
        let mut out = String::from("=== PIPELINE ANALYSIS CONTEXT ===\n\n");

        if !self.stage_name.is_empty() {
            out.push_str(&format!("Stage: {}\n", self.stage_name));
        }
        if !self.step_name.is_empty() {
            out.push_str(&format!("Step: {}\n", self.step_name));
        }
        if let Some(number) = self.build_number {
            out.push_str(&format!("Build: #{number}\n"));
        }
        if !self.job_name.is_empty() {
            out.push_str(&format!("Job: {}\n", self.job_name));
        }
        if !self.build_status.is_empty() {
            out.push_str(&format!("Status: {}\n", self.build_status));
        }
        if !self.workspace_path.is_empty() {
            out.push_str(&format!("Workspace: {}\n", self.workspace_path));
        }

        if !self.environment.is_empty() {
            out.push_str("\n=== ENVIRONMENT VARIABLES ===\n");
            for (key, value) in &self.environment {
                if !is_sensitive_var(key) {
                    out.push_str(&format!("{key}={value}\n"));
                }
            }
        }

        if !self.recent_logs.is_empty() {
            out.push_str("\n=== RECENT LOGS ===\n");
            for line in &self.recent_logs {
                out.push_str(line);
                out.push('\n');
            }
        }

        if !self.content.trim().is_empty() {
            out.push_str("\n=== CONTENT TO ANALYZE ===\n");
            out.push_str(&self.content);
            out.push('\n');
        }

        out
    }

    /// Render a focused context: an analysis-type preamble followed by the
    /// full context block.
    pub fn build_focused_context(&self, analysis_type: &str) -> String {
        let preamble = match analysis_type.to_lowercase().as_str() {
            "build_analysis" => {
                "=== BUILD ANALYSIS ===\nAnalyzing build process and output for potential issues and improvements.\n\n"
            }
            "test_analysis" => {
                "=== TEST ANALYSIS ===\nAnalyzing test results and coverage for quality assessment.\n\n"
            }
            "deployment_analysis" => {
                "=== DEPLOYMENT ANALYSIS ===\nAnalyzing deployment process and configuration.\n\n"
            }
            "security_analysis" => {
                "=== SECURITY ANALYSIS ===\nAnalyzing for security vulnerabilities and compliance issues.\n\n"
            }
            "performance_analysis" => {
                "=== PERFORMANCE ANALYSIS ===\nAnalyzing performance characteristics and bottlenecks.\n\n"
            }
            _ => "=== GENERAL ANALYSIS ===\nPerforming general analysis of the provided content.\n\n",
        };
        format!("{preamble}{}", self.build_context_string())
    }
}
