use crate::config::RunOptions;
use crate::extractor::CodeBlock;

/// Selects the blocks a run acts on.
///
/// Names match exactly, shells match by substring so that `bash` selects
/// `/bin/bash` and `/usr/bin/env bash` alike. A block matching either
/// criterion is kept once. With no criteria every block is kept.
#[derive(Debug, Clone, Default)]
pub struct BlockFilter {
    name: Option<String>,
    shell: Option<String>,
}

impl BlockFilter {
    pub fn new(name: Option<&str>, shell: Option<&str>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()).map(str::to_string),
            shell: shell.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    pub fn from_options(options: &RunOptions) -> Self {
        Self::new(options.name.as_deref(), options.shell.as_deref())
    }

    /// Returns true when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.shell.is_none()
    }

    pub fn matches(&self, block: &CodeBlock) -> bool {
        if self.is_empty() {
            return true;
        }

        let name_match = self.name.as_deref().is_some_and(|n| block.name() == n);
        let shell_match = self
            .shell
            .as_deref()
            .is_some_and(|s| block.shell().contains(s));

        name_match || shell_match
    }

    /// Keeps the matching blocks, preserving their order.
    pub fn apply(&self, blocks: Vec<CodeBlock>) -> Vec<CodeBlock> {
        if self.is_empty() {
            return blocks;
        }

        let before = blocks.len();
        let kept: Vec<_> = blocks.into_iter().filter(|b| self.matches(b)).collect();
        log::debug!("Filter kept {} of {} block(s)", kept.len(), before);
        kept
    }
}
