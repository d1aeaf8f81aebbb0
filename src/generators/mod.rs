//! Target-stack code emitters.
//!
//! Emitters are pure: a component snapshot and its assembled context go in,
//! file paths and contents come out. Writing is left to the caller.

mod angular;
mod java;
mod naming;
mod template;

use std::path::PathBuf;

pub use angular::AngularEmitter;
pub use java::{java_type, JavaEmitter};
pub use naming::{camel_case, kebab_case, lower_first, title_case};
pub use template::render;

use crate::error::AppError;
use crate::models::Component;
use crate::parsers::Guidelines;
use crate::services::MigrationContext;

/// A file produced by an emitter, addressed from the target project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// One target stack.
pub trait CodeEmitter: Send + Sync {
    /// Short stack name used in logs.
    fn target(&self) -> &'static str;

    /// Produces the target files for `component`; an empty list means the
    /// stack has nothing to emit for this kind.
    fn generate(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError>;
}

/// Block comment listing the guideline sections, placed at the top of
/// C-style sources. `None` when there are no guidelines.
pub(crate) fn guideline_comment(guidelines: &Guidelines) -> Option<String> {
    if guidelines.is_empty() {
        return None;
    }

    let mut comment = String::from("/*\n * Project guidelines\n *\n");
    for line in guidelines.to_markdown().lines() {
        let line = line.trim_end().replace("*/", "* /");
        if line.is_empty() {
            comment.push_str(" *\n");
        } else {
            comment.push_str(" * ");
            comment.push_str(&line);
            comment.push('\n');
        }
    }
    comment.push_str(" */\n");
    Some(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::GuidelineSection;

    #[test]
    fn test_guideline_comment() {
        assert_eq!(guideline_comment(&Guidelines::default()), None);

        let guidelines = Guidelines {
            sections: vec![GuidelineSection {
                title: "Coding Standards".into(),
                body: "Use constructor injection.\n\nNo */ inside.".into(),
            }],
        };
        assert_eq!(
            guideline_comment(&guidelines).unwrap(),
            "/*\n * Project guidelines\n *\n * ## Coding Standards\n * Use constructor injection.\n *\n * No * / inside.\n */\n"
        );
    }
}
