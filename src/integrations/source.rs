//! Pattern-filtered bulk fetch on top of any [`SourceFetcher`].

use glob::{MatchOptions, Pattern};

use crate::error::AppError;
use crate::integrations::{EntryKind, SourceFetcher, SourceFile};

/// fnmatch semantics: `*` also crosses `/`, matching is case-sensitive.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiles a source path pattern, returning a predicate over paths.
pub fn path_matcher(pattern: &str) -> Result<impl Fn(&str) -> bool, AppError> {
    let compiled = Pattern::new(pattern).map_err(|e| AppError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;
    Ok(move |path: &str| compiled.matches_with(path, MATCH_OPTIONS))
}

/// Lists the whole tree and downloads every file whose path matches `pattern`.
///
/// Any listing or download failure aborts the fetch.
pub async fn fetch_code_files(
    fetcher: &dyn SourceFetcher,
    repo: &str,
    branch: &str,
    pattern: &str,
) -> Result<Vec<SourceFile>, AppError> {
    let matches = path_matcher(pattern)?;

    let entries = fetcher.list_tree(repo, branch, "").await?;
    let mut files = Vec::new();
    for entry in entries
        .into_iter()
        .filter(|e| e.kind == EntryKind::File && matches(&e.path))
    {
        tracing::debug!(path = %entry.path, "Fetching source file");
        let content = fetcher.get_file(repo, &entry.path, branch).await?;
        files.push(SourceFile {
            path: entry.path,
            content,
            size: entry.size,
        });
    }

    tracing::info!(count = files.len(), pattern, "Fetched source files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_crosses_directories() {
        let matches = path_matcher("src/*.cs").unwrap();
        assert!(matches("src/Controllers/OrderController.cs"));
        assert!(matches("src/Program.cs"));
        assert!(!matches("src/app.config"));
        assert!(!matches("test/Program.cs"));
    }

    #[test]
    fn test_character_classes() {
        let matches = path_matcher("*[CS]*.cs").unwrap();
        assert!(matches("Web/OrderController.cs"));
        assert!(!matches("web/order.cs"));
    }

    #[test]
    fn test_malformed_pattern() {
        let err = path_matcher("src/[abc").err().unwrap();
        assert!(matches!(err, AppError::InvalidPattern { .. }));
    }
}
