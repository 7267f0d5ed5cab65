//! File selection with glob include/exclude rules

use crate::config::{Patterns, SrcItem};
use crate::error::{PartError, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// List the files under `root` selected by `rule`, as `/`-separated paths
/// relative to `root` in lexical order.
///
/// Without a rule every file is selected. With a rule, include patterns
/// (when present) narrow the set first, then exclude patterns remove from
/// it. A literal path or a pattern ending in `/` also applies to the
/// subtree of the directory it names; wildcards match file paths only.
/// An empty pattern list counts as no patterns.
pub fn select_files(root: &Path, rule: Option<&SrcItem>) -> Result<Vec<String>> {
    let include = compile(rule.and_then(|r| r.include.as_ref()))?;
    let exclude = compile(rule.and_then(|r| r.exclude.as_ref()))?;

    let mut selected = Vec::new();
    for relative in list_files(root)? {
        if let Some(include) = &include {
            if !matches_any(include, &relative) {
                continue;
            }
        }
        if let Some(exclude) = &exclude {
            if matches_any(exclude, &relative) {
                continue;
            }
        }
        selected.push(relative);
    }

    Ok(selected)
}

/// Every regular file under `root`, relative and sorted
pub fn list_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            PartError::io(path, err.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path());
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        files.push(parts.join("/"));
    }

    Ok(files)
}

/// A compiled pattern. `subtree` patterns also match a file through any
/// of its ancestor directories
struct Rule {
    pattern: Pattern,
    subtree: bool,
}

fn compile(patterns: Option<&Patterns>) -> Result<Option<Vec<Rule>>> {
    let Some(patterns) = patterns.filter(|patterns| !patterns.is_empty()) else {
        return Ok(None);
    };

    patterns
        .iter()
        .map(|raw| {
            let trimmed = raw.trim_start_matches("./");
            let normalized = trimmed.trim_end_matches('/');
            let pattern = Pattern::new(normalized).map_err(|source| PartError::InvalidPattern {
                pattern: raw.to_string(),
                source,
            })?;
            let subtree = trimmed.ends_with('/') || !has_wildcards(normalized);
            Ok(Rule { pattern, subtree })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn matches_any(rules: &[Rule], relative: &str) -> bool {
    rules.iter().any(|rule| {
        rule.pattern.matches_with(relative, MATCH_OPTIONS)
            || (rule.subtree
                && ancestors(relative).any(|dir| rule.pattern.matches_with(dir, MATCH_OPTIONS)))
    })
}

fn ancestors(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .match_indices('/')
        .map(move |(index, _)| &relative[..index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in ["file1", "file2", "dir/file1", "dir/dir/file1"] {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }
        dir
    }

    #[test]
    fn test_no_rule_selects_every_file() {
        let dir = fixture();
        let files = select_files(dir.path(), None).unwrap();
        assert_eq!(files, vec!["dir/dir/file1", "dir/file1", "file1", "file2"]);
    }

    #[test]
    fn test_rule_without_patterns_selects_every_file() {
        let dir = fixture();
        let files = select_files(dir.path(), Some(&SrcItem::new("all"))).unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_include_narrows_to_matching_files() {
        let dir = fixture();
        let rule = SrcItem::new("src-item1").include(vec!["dir/**"]);
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["dir/dir/file1", "dir/file1"]);
    }

    #[test]
    fn test_exclude_removes_after_include() {
        let dir = fixture();
        let rule = SrcItem::new("src-item2")
            .include(vec!["dir/**"])
            .exclude(vec!["dir/dir/**"]);
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["dir/file1"]);
    }

    #[test]
    fn test_exclude_only_keeps_everything_else() {
        let dir = fixture();
        let rule = SrcItem::new("no-dir").exclude("dir");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["file1", "file2"]);
    }

    #[test]
    fn test_directory_pattern_selects_subtree() {
        let dir = fixture();
        let rule = SrcItem::new("nested").include("dir/dir/");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["dir/dir/file1"]);
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = fixture();
        let rule = SrcItem::new("top").include("file*");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["file1", "file2"]);
    }

    #[test]
    fn test_single_star_matches_top_level_only() {
        let dir = fixture();
        let rule = SrcItem::new("top").include("*");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["file1", "file2"]);
    }

    #[test]
    fn test_wildcard_does_not_expand_matching_directory() {
        let dir = fixture();
        let rule = SrcItem::new("direct").include("dir/*");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["dir/file1"]);
    }

    #[test]
    fn test_wildcard_with_trailing_slash_selects_subtree() {
        let dir = fixture();
        let rule = SrcItem::new("nested").include("d?r/");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["dir/dir/file1", "dir/file1"]);
    }

    #[test]
    fn test_empty_include_list_selects_everything() {
        let dir = fixture();
        let rule = SrcItem::new("empty")
            .include(Vec::<&str>::new())
            .exclude("dir/**");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["file1", "file2"]);
    }

    #[test]
    fn test_character_class() {
        let dir = fixture();
        let rule = SrcItem::new("one").include("file[1]");
        let files = select_files(dir.path(), Some(&rule)).unwrap();
        assert_eq!(files, vec!["file1"]);
    }

    #[test]
    fn test_include_matching_nothing_is_empty() {
        let dir = fixture();
        let rule = SrcItem::new("none").include("missing/**");
        assert!(select_files(dir.path(), Some(&rule)).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let dir = fixture();
        let rule = SrcItem::new("bad").include("a/***");
        let err = select_files(dir.path(), Some(&rule)).unwrap_err();
        assert!(matches!(err, PartError::InvalidPattern { ref pattern, .. } if pattern == "a/***"));
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("a/b/c").collect::<Vec<_>>(), vec!["a", "a/b"]);
        assert_eq!(ancestors("file").count(), 0);
    }
}
