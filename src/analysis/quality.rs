//! Code quality analyzer
//!
//! Files are measured in parallel; results are collected in input order and
//! summed sequentially, so the aggregates are identical from run to run.

use super::complexity::{self, SourceMetrics};
use super::coverage;
use super::AnalysisError;
use crate::models::{FileRecord, Language, QualityMetrics, SkippedFile};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Complexity reported when no file in a supported language was analyzed.
pub const NEUTRAL_COMPLEXITY: f64 = 1.0;
/// Maintainability reported when no file in a supported language was analyzed.
pub const NEUTRAL_MAINTAINABILITY: f64 = 50.0;

/// Metrics of one successfully analyzed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetrics {
    pub path: String,
    pub language: Language,
    /// Non-blank lines
    pub lines_of_code: usize,
    pub is_test: bool,
    /// `None` for languages without complexity support
    pub source: Option<SourceMetrics>,
}

impl FileMetrics {
    pub fn complexity(&self) -> Option<f64> {
        self.source.as_ref().map(|s| s.complexity)
    }

    pub fn maintainability(&self) -> Option<f64> {
        self.source.as_ref().map(|s| s.maintainability)
    }
}

/// Output of the quality analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub metrics: QualityMetrics,
    pub files: Vec<FileMetrics>,
    pub skipped: Vec<SkippedFile>,
    pub files_considered: usize,
}

impl QualityReport {
    /// Language with the most lines of code among supported languages.
    ///
    /// Ties resolve to the language that sorts first.
    pub fn dominant_language(&self) -> Option<Language> {
        let mut loc: BTreeMap<Language, usize> = BTreeMap::new();
        for file in self.files.iter().filter(|f| f.source.is_some()) {
            *loc.entry(file.language).or_default() += file.lines_of_code;
        }
        loc.into_iter()
            .filter(|(_, lines)| *lines > 0)
            .fold(None, |best: Option<(Language, usize)>, (lang, lines)| match best {
                Some((_, top)) if top >= lines => best,
                _ => Some((lang, lines)),
            })
            .map(|(lang, _)| lang)
    }
}

fn decode(file: &FileRecord) -> Result<&str, AnalysisError> {
    if file.raw_content.contains(&0) {
        return Err(AnalysisError::Binary);
    }
    std::str::from_utf8(&file.raw_content).map_err(|e| AnalysisError::InvalidEncoding {
        valid_up_to: e.valid_up_to(),
    })
}

/// Measure a single file.
pub fn analyze_file(file: &FileRecord) -> Result<FileMetrics, AnalysisError> {
    let text = decode(file)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let source = complexity::measure(text, file.language);
    let lines_of_code = match &source {
        Some(m) => m.lines.non_blank(),
        None => complexity::count_non_blank(text),
    };

    Ok(FileMetrics {
        path: file.path.clone(),
        language: file.language,
        lines_of_code,
        is_test: coverage::is_test_path(&file.path),
        source,
    })
}

/// Analyze every file of a snapshot.
pub fn analyze(files: &[FileRecord]) -> QualityReport {
    let results: Vec<(&FileRecord, Result<FileMetrics, AnalysisError>)> =
        files.par_iter().map(|f| (f, analyze_file(f))).collect();

    let mut analyzed = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (file, result) in results {
        match result {
            Ok(metrics) => analyzed.push(metrics),
            Err(e) => {
                warn!("Skipping {}: {}", file.path, e);
                skipped.push(SkippedFile {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let metrics = aggregate(&analyzed);
    debug!(
        "Quality: {} files, {} LOC, CC {:.2}, MI {:.1}",
        metrics.files_analyzed, metrics.lines_of_code, metrics.cyclomatic_complexity, metrics.maintainability_index
    );

    QualityReport {
        metrics,
        files: analyzed,
        skipped,
        files_considered: files.len(),
    }
}

fn aggregate(files: &[FileMetrics]) -> QualityMetrics {
    let lines_of_code: u64 = files.iter().map(|f| f.lines_of_code as u64).sum();

    let mut weight = 0.0;
    let mut complexity_sum = 0.0;
    let mut maintainability_sum = 0.0;
    let mut comment_lines = 0usize;
    let mut non_blank = 0usize;
    let test_files = files.iter().filter(|f| f.is_test).count();

    for file in files {
        let Some(source) = &file.source else {
            continue;
        };
        let w = file.lines_of_code as f64;
        weight += w;
        complexity_sum += w * source.complexity;
        maintainability_sum += w * source.maintainability;
        comment_lines += source.lines.comment;
        non_blank += source.lines.non_blank();
    }

    let (cyclomatic_complexity, maintainability_index) = if weight > 0.0 {
        (complexity_sum / weight, maintainability_sum / weight)
    } else {
        (NEUTRAL_COMPLEXITY, NEUTRAL_MAINTAINABILITY)
    };
    let comment_ratio = if non_blank > 0 {
        comment_lines as f64 / non_blank as f64
    } else {
        0.0
    };

    QualityMetrics {
        cyclomatic_complexity,
        maintainability_index,
        comment_ratio,
        test_coverage_pct: coverage::estimate(test_files, files.len()),
        test_coverage_estimated: true,
        lines_of_code,
        files_analyzed: files.len(),
        test_files,
    }
}
