//! Prompt Library for language-model enrichment
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/resilience/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Every prompt is loaded when the library is built, so a library can be
//! shared read-only between requests.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const ANALYZE_FINANCES: &str = include_str!("../../../prompts/analyze_finances.md");
    pub const FINANCIAL_CHAT: &str = include_str!("../../../prompts/financial_chat.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Statement enrichment returning a JSON object
    AnalyzeFinances,
    /// Educational chat replies
    FinancialChat,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeFinances => "analyze_finances",
            Self::FinancialChat => "financial_chat",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::AnalyzeFinances, Self::FinancialChat]
    }

    /// Get the default embedded content for this prompt
    fn default_content(&self) -> &'static str {
        match self {
            Self::AnalyzeFinances => defaults::ANALYZE_FINANCES,
            Self::FinancialChat => defaults::FINANCIAL_CHAT,
        }
    }
}

impl std::str::FromStr for PromptId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PromptId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("Unknown prompt: {}", s))
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// Kind of task (reasoning, conversation)
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Metadata from frontmatter
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    /// Path to override file (if any)
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Get the system section of the prompt
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the system section with template variables replaced
    pub fn render_system(&self, vars: &HashMap<&str, &str>) -> Option<String> {
        self.system_section().map(|s| render_template(s, vars))
    }

    /// Render just the user section with variables
    ///
    /// A prompt without a `# User` header is rendered whole.
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        let template = self.user_section().unwrap_or(&self.content);
        render_template(template, vars)
    }
}

/// Prompt library holding every known prompt
pub struct PromptLibrary {
    /// Override directory path
    override_dir: Option<PathBuf>,
    prompts: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a prompt library with default paths
    pub fn new() -> Result<Self> {
        Self::load(default_prompts_dir())
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Result<Self> {
        Self::load(Some(path))
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Result<Self> {
        Self::load(None)
    }

    fn load(override_dir: Option<PathBuf>) -> Result<Self> {
        let mut prompts = HashMap::new();
        for &id in PromptId::all() {
            prompts.insert(id, load_prompt(override_dir.as_ref(), id)?);
        }
        Ok(Self {
            override_dir,
            prompts,
        })
    }

    /// Get a prompt by ID
    pub fn get(&self, id: PromptId) -> Result<&Prompt> {
        self.prompts
            .get(&id)
            .ok_or_else(|| Error::Prompt(format!("Prompt not loaded: {}", id.as_str())))
    }

    /// List all prompts with their override status
    pub fn list(&self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .filter_map(|&id| self.prompts.get(&id).map(|p| (id, p)))
            .map(|(id, prompt)| PromptInfo {
                id: id.as_str().to_string(),
                version: prompt.metadata.version,
                task_type: prompt.metadata.task_type.clone(),
                has_override: prompt.is_override,
                override_path: prompt.override_path.clone(),
            })
            .collect()
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    /// Prompt identifier
    pub id: String,
    /// Version from metadata
    pub version: u32,
    /// Task type from metadata
    pub task_type: String,
    /// Whether an override is in use
    pub has_override: bool,
    /// Path to override file (if in use)
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("resilience").join("prompts").join("overrides"))
}

/// Load a prompt (checking override first, then default)
fn load_prompt(override_dir: Option<&PathBuf>, id: PromptId) -> Result<Prompt> {
    if let Some(override_dir) = override_dir {
        let override_path = override_dir.join(format!("{}.md", id.as_str()));
        if override_path.exists() {
            let content = fs::read_to_string(&override_path)
                .map_err(|e| Error::Prompt(format!("Failed to read prompt override: {}", e)))?;
            let (metadata, body) = parse_prompt(&content)?;
            tracing::debug!(
                prompt = id.as_str(),
                path = %override_path.display(),
                "Using prompt override"
            );
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(override_path),
            });
        }
    }

    let (metadata, body) = parse_prompt(id.default_content())?;
    Ok(Prompt {
        metadata,
        content: body,
        is_override: false,
        override_path: None,
    })
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    // Check for YAML frontmatter
    if !content.starts_with("---") {
        return Err(Error::Prompt(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    // Find end of frontmatter
    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::Prompt("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::Prompt(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    // Find the next header or end of content
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Apply conditionals, then replace `{{var}}` placeholders in one pass
///
/// Substituted values are never rescanned, so user text containing
/// `{{...}}` is inserted literally. Unknown placeholders are kept.
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let template = remove_unmatched_conditionals(template, vars);
    let mut result = String::with_capacity(template.len());
    let mut rest = template.as_str();

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = &after_open[..close];
                match vars.get(name) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(name);
                        result.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                result.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);

    result
}

/// Resolve `{{#if var}}...{{/if}}` blocks against the variables
///
/// A block is kept (without its markers) when the variable is present and
/// non-empty, and removed otherwise.
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    loop {
        if let Some(if_start) = result.find("{{#if ") {
            let var_start = if_start + 6;
            if let Some(var_end) = result[var_start..].find("}}") {
                let var_name = &result[var_start..var_start + var_end];
                let block_start = var_start + var_end + 2;

                if let Some(endif_pos) = result[block_start..].find("{{/if}}") {
                    let block_content = &result[block_start..block_start + endif_pos];
                    let full_end = block_start + endif_pos + 7;

                    let should_include = vars.get(var_name).is_some_and(|v| !v.is_empty());

                    result = if should_include {
                        format!(
                            "{}{}{}",
                            &result[..if_start],
                            block_content,
                            &result[full_end..]
                        )
                    } else {
                        format!("{}{}", &result[..if_start], &result[full_end..])
                    };
                    continue;
                }
            }
        }
        break;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERRIDE: &str = r#"---
id: financial_chat
version: 7
task_type: conversation
---

# System
Custom system.

# User
Q: {{message}}
"#;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 1
task_type: reasoning
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.task_type, "reasoning");
        assert!(body.contains("# System"));
        assert!(body.contains("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(matches!(parse_prompt("# User\nhi"), Err(Error::Prompt(_))));
        assert!(matches!(parse_prompt("---\nid: x\n"), Err(Error::Prompt(_))));
    }

    #[test]
    fn test_extract_section() {
        let content = r#"# System
System content here.

# User
User content here."#;

        assert_eq!(
            extract_section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(
            extract_section(content, "# User"),
            Some("User content here.")
        );
    }

    #[test]
    fn test_render_template_single_pass() {
        let vars = HashMap::from([("message", "what is {{income}}?"), ("income", "$5")]);
        assert_eq!(
            render_template("Q: {{message}} / {{income}} / {{missing}}", &vars),
            "Q: what is {{income}}? / $5 / {{missing}}"
        );
    }

    #[test]
    fn test_conditional_blocks() {
        let content = "Start{{#if category}}\nCategory: {{category}}{{/if}}\nEnd";

        let vars = HashMap::from([("category", "Groceries")]);
        let result = remove_unmatched_conditionals(content, &vars);
        assert!(result.contains("Category: {{category}}"));

        let empty_vars: HashMap<&str, &str> = HashMap::new();
        let result = remove_unmatched_conditionals(content, &empty_vars);
        assert!(!result.contains("Category:"));
        assert!(result.contains("Start"));
        assert!(result.contains("End"));
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let result = parse_prompt(id.default_content());
            assert!(
                result.is_ok(),
                "Failed to parse {}: {:?}",
                id.as_str(),
                result.err()
            );

            let (metadata, _) = result.unwrap();
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
        }
    }

    #[test]
    fn test_prompt_library_embedded() {
        let lib = PromptLibrary::embedded_only().unwrap();

        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert!(!prompt.is_override);
            assert!(prompt.user_section().is_some());
        }

        let analysis = lib.get(PromptId::AnalyzeFinances).unwrap();
        assert!(analysis.system_section().is_none());
        let chat = lib.get(PromptId::FinancialChat).unwrap();
        assert!(chat
            .system_section()
            .unwrap()
            .starts_with("You are a financial literacy educator"));
    }

    #[test]
    fn test_chat_user_section_without_context() {
        let lib = PromptLibrary::embedded_only().unwrap();
        let chat = lib.get(PromptId::FinancialChat).unwrap();

        let vars = HashMap::from([("context", ""), ("message", "How do I budget?")]);
        assert_eq!(chat.render_user(&vars), "\n\nQuestion: How do I budget?");
    }

    #[test]
    fn test_override_replaces_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("financial_chat.md"), OVERRIDE).unwrap();

        let lib = PromptLibrary::with_override_dir(dir.path().to_path_buf()).unwrap();
        let chat = lib.get(PromptId::FinancialChat).unwrap();
        assert!(chat.is_override);
        assert_eq!(chat.metadata.version, 7);
        assert_eq!(chat.system_section(), Some("Custom system."));

        let analysis = lib.get(PromptId::AnalyzeFinances).unwrap();
        assert!(!analysis.is_override);

        let listed = lib.list();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|p| p.id == "financial_chat" && p.has_override));
    }

    #[test]
    fn test_invalid_override_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("analyze_finances.md"), "no frontmatter").unwrap();
        assert!(PromptLibrary::with_override_dir(dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_prompt_id_from_str() {
        assert_eq!(
            "analyze_finances".parse::<PromptId>().unwrap(),
            PromptId::AnalyzeFinances
        );
        assert!("explain_spending".parse::<PromptId>().is_err());
    }
}
