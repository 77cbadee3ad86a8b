use crate::error::{Result, RunmeError};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::path::Path;

/// A named shell block extracted from markdown.
///
/// Blocks are identified by fenced code syntax whose info string carries a
/// shell and a name separated by a single space:
///
/// ````markdown
/// ```bash "build"
/// cargo build --release
/// ```
/// ````
///
/// Everything after the first space is the name, verbatim, so the block above
/// is named `"build"` including the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    shell: String,
    name: String,
    content: String,
}

impl CodeBlock {
    pub fn new(
        shell: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            shell: shell.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// The interpreter from the info string (e.g. "bash", "/bin/sh", "python3").
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// The label following the shell in the info string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The text between the fences, exactly as it appears in the source.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Parser options for GitHub-flavored markdown.
fn gfm_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Extracts named shell blocks from markdown content using pulldown-cmark.
///
/// Fenced blocks are returned in document order. Fences without an info
/// string, or whose info string lacks either a shell or a name, are skipped.
/// Indented code blocks are never considered.
///
/// # Example
///
/// ```
/// use runme::extract_code_blocks;
///
/// let markdown = "```sh \"greet\"\necho hi\n```\n\n```text\nignored\n```\n";
///
/// let blocks = extract_code_blocks(markdown);
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].shell(), "sh");
/// assert_eq!(blocks[0].name(), "\"greet\"");
/// assert_eq!(blocks[0].content(), "echo hi\n");
/// ```
pub fn extract_code_blocks(content: &str) -> Vec<CodeBlock> {
    let parser = Parser::new_ext(content, gfm_options()).into_offset_iter();
    let mut code_blocks = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut current_code = String::new();
    let mut last_text_end: Option<usize> = None;

    for (event, range) in parser {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                current_code.clear();
                last_text_end = None;

                // Decoded info strings lose backslash escapes and entities,
                // so read it back from the fence line itself
                let fence_line = content[range.start..].lines().next().unwrap_or("");
                let info = fence_info(fence_line);

                // An empty info string means a plain, unlabeled fence
                if info.is_empty() {
                    current = None;
                    continue;
                }

                let (shell, name) = parse_info_string(info);
                current = if !shell.is_empty() && !name.is_empty() {
                    Some((shell.to_string(), name.to_string()))
                } else {
                    log::debug!("Skipping fenced block with info string {:?}", info);
                    None
                };
            }

            Event::End(TagEnd::CodeBlock) => {
                if let Some((shell, name)) = current.take() {
                    code_blocks.push(CodeBlock {
                        shell,
                        name,
                        content: std::mem::take(&mut current_code),
                    });
                }
            }

            Event::Text(_) => {
                if current.is_some() {
                    // The parser splits CRLF lines around the `\r`; put it back
                    if let Some(end) = last_text_end {
                        if content.get(end..range.start) == Some("\r") {
                            current_code.push('\r');
                        }
                    }
                    current_code.push_str(&content[range.clone()]);
                    last_text_end = Some(range.end);
                }
            }

            _ => {}
        }
    }

    code_blocks
}

/// The trimmed text after the opening fence run of a fence line.
///
/// Leading indentation and container markers are skipped by looking for the
/// first fence character.
fn fence_info(fence_line: &str) -> &str {
    let Some(fence_start) = fence_line.find(['`', '~']) else {
        return "";
    };
    let fence = &fence_line[fence_start..];
    let marker = if fence.starts_with('`') { '`' } else { '~' };

    fence.trim_start_matches(marker).trim()
}

/// Split a fence info string into shell and name at the first space.
///
/// Examples:
/// - `bash "build"` -> ("bash", "\"build\"")
/// - `sh my  task` -> ("sh", "my  task")
/// - `bash` -> ("bash", "")
/// - `` -> ("", "")
pub fn parse_info_string(info: &str) -> (&str, &str) {
    info.split_once(' ').unwrap_or((info, ""))
}

/// Reads a markdown file and extracts its named shell blocks.
///
/// # Errors
///
/// Returns [`RunmeError::Read`] if the file cannot be read. No partial result
/// is returned in that case.
pub async fn read_code_blocks(path: &Path) -> Result<Vec<CodeBlock>> {
    let bytes = tokio::fs::read(path).await.map_err(|source| RunmeError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let content = String::from_utf8_lossy(&bytes);
    let blocks = extract_code_blocks(&content);
    log::debug!("Found {} named block(s) in {}", blocks.len(), path.display());

    Ok(blocks)
}
