//! Balance analysis over a batch run.
//!
//! Turns a [`WinRateMatrix`](crate::matrix::WinRateMatrix) into
//! per-character win rates, OP/OK/WK classifications, per-grade spread
//! statistics and a single balance score.

use std::fmt;
use std::path::Path;

use duel_core::attributes::Attribute;
use duel_core::character::Grade;
use duel_core::config::Thresholds;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchResults, PairScope};
use crate::metrics::BatchSummary;

/// Win rate above which a member counts as an extreme in the balance score.
pub const EXTREME_HIGH: f64 = 0.75;
/// Win rate below which a member counts as an extreme in the balance score.
pub const EXTREME_LOW: f64 = 0.25;

/// Balance label of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Win rate at or above the OP threshold.
    #[serde(rename = "OP")]
    Op,
    /// Between the thresholds.
    #[serde(rename = "OK")]
    Ok,
    /// Win rate at or below the WK threshold.
    #[serde(rename = "WK")]
    Wk,
}

impl Classification {
    /// Classify a win rate.
    #[must_use]
    pub fn of(rate: f64, thresholds: &Thresholds) -> Self {
        if rate >= thresholds.op {
            Self::Op
        } else if rate <= thresholds.wk {
            Self::Wk
        } else {
            Self::Ok
        }
    }

    /// Short label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Op => "OP",
            Self::Ok => "OK",
            Self::Wk => "WK",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which win rate drives classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationView {
    /// Mean over every evaluated opponent.
    Global,
    /// Mean over grade-mates only.
    #[default]
    Grade,
}

/// Severity of a balance issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Past a classification threshold
    Medium,
    /// Past the extreme band
    High,
}

impl Severity {
    /// Get numeric priority (higher = more urgent)
    pub fn priority(&self) -> u32 {
        match self {
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// Aggregated standing of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    /// Character id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Grade.
    pub grade: Grade,
    /// Attribute.
    pub attribute: Attribute,
    /// Stat total.
    pub total: u32,
    /// Mean win rate against every evaluated opponent.
    pub global_rate: Option<f64>,
    /// Mean win rate against evaluated grade-mates.
    pub grade_rate: Option<f64>,
    /// Evaluated opponents.
    pub opponents: usize,
    /// Evaluated grade-mates.
    pub grade_opponents: usize,
    /// Label under the analysis view, `None` with no opponents.
    pub classification: Option<Classification>,
}

impl CharacterSummary {
    /// Win rate under `view`.
    #[must_use]
    pub fn rate(&self, view: ClassificationView) -> Option<f64> {
        match view {
            ClassificationView::Global => self.global_rate,
            ClassificationView::Grade => self.grade_rate,
        }
    }
}

/// Mean win rate of one attribute inside a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMean {
    /// Attribute.
    pub attribute: Attribute,
    /// Members with that attribute and a rate.
    pub members: usize,
    /// Their mean win rate.
    pub mean: f64,
}

/// Spread statistics for one grade.
///
/// Statistics are `None` when fewer than two members have a rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSpread {
    /// Grade.
    pub grade: Grade,
    /// Members in the batch.
    pub members: usize,
    /// Mean member win rate.
    pub mean: Option<f64>,
    /// Population standard deviation of member win rates.
    pub std_dev: Option<f64>,
    /// Lowest member win rate.
    pub min: Option<f64>,
    /// Highest member win rate.
    pub max: Option<f64>,
    /// Number of OP members.
    pub op_count: usize,
    /// Number of WK members.
    pub wk_count: usize,
    /// Per-attribute means, in attribute order.
    pub attributes: Vec<AttributeMean>,
    /// Unweighted contribution to the balance score.
    pub score: f64,
}

impl GradeSpread {
    /// `max - min`.
    #[must_use]
    pub fn range(&self) -> Option<f64> {
        Some(self.max? - self.min?)
    }
}

/// A detected balance outlier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOutlier {
    /// Character id
    pub id: String,
    /// Grade
    pub grade: Grade,
    /// Win rate under the analysis view
    pub rate: f64,
    /// OP or WK
    pub classification: Classification,
    /// Issue severity
    pub severity: Severity,
}

/// Metadata about the analysis
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalysisMetadata {
    /// Batch base seed
    pub seed: u64,
    /// Trials per pair
    pub trials: u32,
    /// Pair scope of the batch
    pub scope: PairScope,
    /// Arena id of the batch
    pub arena: Option<String>,
    /// Analysis version
    pub version: String,
}

/// Complete balance analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceAnalysis {
    /// View used for classification
    pub view: ClassificationView,
    /// Thresholds used for classification
    pub thresholds: Thresholds,
    /// Per-character summaries in roster order
    pub characters: Vec<CharacterSummary>,
    /// Per-grade spreads, highest grade first
    pub grades: Vec<GradeSpread>,
    /// Weighted balance score, lower is better
    pub balance_score: f64,
    /// Detected outliers
    pub outliers: Vec<BalanceOutlier>,
    /// Batch summary carried over
    pub summary: BatchSummary,
    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl BalanceAnalysis {
    /// Summary of `id`.
    #[must_use]
    pub fn character(&self, id: &str) -> Option<&CharacterSummary> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Number of characters labelled `class`.
    #[must_use]
    pub fn count(&self, class: Classification) -> usize {
        self.characters
            .iter()
            .filter(|c| c.classification == Some(class))
            .count()
    }

    /// Whether any character is OP or WK.
    #[must_use]
    pub fn needs_adjustment(&self) -> bool {
        !self.outliers.is_empty()
    }

    /// Spread of `grade`.
    #[must_use]
    pub fn grade(&self, grade: Grade) -> Option<&GradeSpread> {
        self.grades.iter().find(|g| g.grade == grade)
    }

    /// Get outliers sorted by severity, then distance from 50%
    pub fn outliers_by_severity(&self) -> Vec<&BalanceOutlier> {
        let mut sorted: Vec<_> = self.outliers.iter().collect();
        sorted.sort_by(|a, b| {
            b.severity
                .priority()
                .cmp(&a.severity.priority())
                .then_with(|| (b.rate - 0.5).abs().total_cmp(&(a.rate - 0.5).abs()))
        });
        sorted
    }

    /// Save to JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load from JSON
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Generate markdown summary
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Balance Analysis Report\n\n");
        md.push_str(&format!(
            "- Battles: {} ({} trials/pair, seed {})\n",
            self.summary.total_battles, self.metadata.trials, self.metadata.seed
        ));
        md.push_str(&format!("- Average turns: {:.1}\n", self.summary.avg_turns));
        md.push_str(&format!(
            "- Turn-cap decisions: {:.1}%\n",
            self.summary.turn_cap_rate * 100.0
        ));
        md.push_str(&format!(
            "- Classification: {:?} view, OP >= {:.0}%, WK <= {:.0}%\n",
            self.view,
            self.thresholds.op * 100.0,
            self.thresholds.wk * 100.0
        ));
        md.push_str(&format!(
            "- Balance score: {:.2} (OP {}, WK {})\n",
            self.balance_score,
            self.count(Classification::Op),
            self.count(Classification::Wk)
        ));

        md.push_str("\n## Grades\n\n");
        md.push_str("| Grade | Members | Mean | Std | Range | OP | WK | Score |\n");
        md.push_str("|-------|---------|------|-----|-------|----|----|-------|\n");
        for g in &self.grades {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {:.2} |\n",
                g.grade,
                g.members,
                percent(g.mean),
                percent(g.std_dev),
                percent(g.range()),
                g.op_count,
                g.wk_count,
                g.score
            ));
        }

        md.push_str("\n## Characters\n\n");
        md.push_str("| Id | Name | Grade | Attribute | Total | Overall | In grade | Class |\n");
        md.push_str("|----|------|-------|-----------|-------|---------|----------|-------|\n");
        let mut rows: Vec<&CharacterSummary> = self.characters.iter().collect();
        rows.sort_by(|a, b| {
            a.grade.cmp(&b.grade).then_with(|| {
                b.rate(self.view)
                    .unwrap_or(0.0)
                    .total_cmp(&a.rate(self.view).unwrap_or(0.0))
            })
        });
        for c in rows {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
                c.id,
                c.name,
                c.grade,
                c.attribute,
                c.total,
                percent(c.global_rate),
                percent(c.grade_rate),
                c.classification.map_or("-", Classification::label)
            ));
        }

        if !self.outliers.is_empty() {
            md.push_str("\n## Issues Detected\n\n");
            for outlier in self.outliers_by_severity() {
                md.push_str(&format!(
                    "- **[{:?}]** {} ({}): {} at {:.1}%\n",
                    outlier.severity,
                    outlier.id,
                    outlier.grade,
                    outlier.classification,
                    outlier.rate * 100.0
                ));
            }
        }

        md.push_str("\n## Attributes by Grade\n\n");
        for g in self.grades.iter().filter(|g| !g.attributes.is_empty()) {
            let parts: Vec<String> = g
                .attributes
                .iter()
                .map(|a| format!("{} {:.1}% (n={})", a.attribute, a.mean * 100.0, a.members))
                .collect();
            md.push_str(&format!("- {}: {}\n", g.grade, parts.join(", ")));
        }

        md
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Unweighted score of one grade's member rates, in percentage points.
///
/// Population std + 0.2 × range + 0.5 × the summed excess beyond the
/// extreme band.
#[must_use]
pub fn grade_score(rates: &[f64]) -> f64 {
    if rates.len() < 2 {
        return 0.0;
    }
    let pct: Vec<f64> = rates.iter().map(|r| r * 100.0).collect();
    let avg = pct.iter().sum::<f64>() / pct.len() as f64;
    let std = (pct.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / pct.len() as f64).sqrt();
    let max = pct.iter().copied().fold(f64::MIN, f64::max);
    let min = pct.iter().copied().fold(f64::MAX, f64::min);
    let extremes: f64 = pct
        .iter()
        .map(|x| (x - EXTREME_HIGH * 100.0).max(0.0) + (EXTREME_LOW * 100.0 - x).max(0.0))
        .sum();
    std + 0.2 * (max - min) + 0.5 * extremes
}

fn grade_spread(
    grade: Grade,
    members: &[&CharacterSummary],
    view: ClassificationView,
) -> GradeSpread {
    let rated: Vec<(&CharacterSummary, f64)> = members
        .iter()
        .filter_map(|c| c.rate(view).map(|r| (*c, r)))
        .collect();
    let rates: Vec<f64> = rated.iter().map(|(_, r)| *r).collect();
    let enough = rates.len() >= 2;

    let attributes = Attribute::ALL
        .into_iter()
        .filter_map(|attribute| {
            let of_attr: Vec<f64> = rated
                .iter()
                .filter(|(c, _)| c.attribute == attribute)
                .map(|(_, r)| *r)
                .collect();
            mean(&of_attr).map(|m| AttributeMean {
                attribute,
                members: of_attr.len(),
                mean: m,
            })
        })
        .collect();

    let avg = mean(&rates).filter(|_| enough);
    let std_dev = avg.map(|m| {
        (rates.iter().map(|r| (r - m).powi(2)).sum::<f64>() / rates.len() as f64).sqrt()
    });

    GradeSpread {
        grade,
        members: members.len(),
        mean: avg,
        std_dev,
        min: enough.then(|| rates.iter().copied().fold(f64::MAX, f64::min)),
        max: enough.then(|| rates.iter().copied().fold(f64::MIN, f64::max)),
        op_count: members
            .iter()
            .filter(|c| c.classification == Some(Classification::Op))
            .count(),
        wk_count: members
            .iter()
            .filter(|c| c.classification == Some(Classification::Wk))
            .count(),
        attributes,
        score: grade_score(&rates),
    }
}

/// Analyze batch results with the thresholds the batch ran with.
pub fn analyze_batch(results: &BatchResults, view: ClassificationView) -> BalanceAnalysis {
    analyze_with_thresholds(results, view, &results.balance.thresholds)
}

/// Analyze batch results with explicit thresholds.
pub fn analyze_with_thresholds(
    results: &BatchResults,
    view: ClassificationView,
    thresholds: &Thresholds,
) -> BalanceAnalysis {
    let matrix = &results.matrix;
    let characters = &results.characters;

    let summaries: Vec<CharacterSummary> = characters
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let same_grade = |j: usize| characters[j].grade == c.grade;
            let mut summary = CharacterSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                grade: c.grade,
                attribute: c.attribute,
                total: c.total(),
                global_rate: matrix.row_mean(i, |_| true),
                grade_rate: matrix.row_mean(i, same_grade),
                opponents: matrix.opponents(i),
                grade_opponents: (0..characters.len())
                    .filter(|&j| same_grade(j) && matrix.get(i, j).is_some())
                    .count(),
                classification: None,
            };
            summary.classification = summary
                .rate(view)
                .map(|rate| Classification::of(rate, thresholds));
            summary
        })
        .collect();

    let mut grades_present: Vec<Grade> = summaries.iter().map(|c| c.grade).collect();
    grades_present.sort_unstable();
    grades_present.dedup();

    let grades: Vec<GradeSpread> = grades_present
        .into_iter()
        .map(|grade| {
            let members: Vec<&CharacterSummary> =
                summaries.iter().filter(|c| c.grade == grade).collect();
            grade_spread(grade, &members, view)
        })
        .collect();

    let balance_score = grades
        .iter()
        .map(|g| g.score * g.grade.score_weight())
        .sum();

    let outliers = summaries
        .iter()
        .filter_map(|c| {
            let rate = c.rate(view)?;
            let classification = c.classification.filter(|k| *k != Classification::Ok)?;
            let severity = if rate > EXTREME_HIGH || rate < EXTREME_LOW {
                Severity::High
            } else {
                Severity::Medium
            };
            Some(BalanceOutlier {
                id: c.id.clone(),
                grade: c.grade,
                rate,
                classification,
                severity,
            })
        })
        .collect();

    BalanceAnalysis {
        view,
        thresholds: *thresholds,
        characters: summaries,
        grades,
        balance_score,
        outliers,
        summary: results.summary.clone(),
        metadata: AnalysisMetadata {
            seed: results.config.seed,
            trials: results.config.trials,
            scope: results.config.scope,
            arena: results.config.arena.clone(),
            version: "1.0".to_string(),
        },
    }
}

/// Win-rate change of one character between two analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDelta {
    /// Character id.
    pub id: String,
    /// Rate before.
    pub before: Option<f64>,
    /// Rate after.
    pub after: Option<f64>,
    /// Label before.
    pub class_before: Option<Classification>,
    /// Label after.
    pub class_after: Option<Classification>,
}

impl RateDelta {
    /// `after - before`, when both exist.
    #[must_use]
    pub fn delta(&self) -> Option<f64> {
        Some(self.after? - self.before?)
    }

    /// Whether the label changed.
    #[must_use]
    pub fn reclassified(&self) -> bool {
        self.class_before != self.class_after
    }
}

/// Report comparing two analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Per-character changes, in the order of the earlier analysis
    pub deltas: Vec<RateDelta>,
    /// Characters whose rate moved toward 50%
    pub improvements: Vec<String>,
    /// Characters whose rate moved away from 50%
    pub regressions: Vec<String>,
    /// Score before
    pub score_before: f64,
    /// Score after
    pub score_after: f64,
    /// Outliers before
    pub before_issue_count: usize,
    /// Outliers after
    pub after_issue_count: usize,
}

impl ComparisonReport {
    /// `score_after - score_before`; negative is better.
    #[must_use]
    pub fn score_delta(&self) -> f64 {
        self.score_after - self.score_before
    }

    /// Whether the score went down.
    #[must_use]
    pub fn overall_improved(&self) -> bool {
        self.score_after < self.score_before
    }

    /// Generate markdown summary
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Balance Comparison\n\n");
        md.push_str(&format!(
            "- Balance score: {:.2} -> {:.2} ({:+.2})\n",
            self.score_before,
            self.score_after,
            self.score_delta()
        ));
        md.push_str(&format!(
            "- Issues: {} -> {}\n",
            self.before_issue_count, self.after_issue_count
        ));

        let changed: Vec<&RateDelta> = self.deltas.iter().filter(|d| d.reclassified()).collect();
        if !changed.is_empty() {
            md.push_str("\n## Reclassified\n\n");
            for d in changed {
                md.push_str(&format!(
                    "- {}: {} -> {}\n",
                    d.id,
                    d.class_before.map_or("-", Classification::label),
                    d.class_after.map_or("-", Classification::label)
                ));
            }
        }
        if !self.improvements.is_empty() {
            md.push_str("\n## Improvements\n\n");
            for line in &self.improvements {
                md.push_str(&format!("- {line}\n"));
            }
        }
        if !self.regressions.is_empty() {
            md.push_str("\n## Regressions\n\n");
            for line in &self.regressions {
                md.push_str(&format!("- {line}\n"));
            }
        }
        md
    }
}

/// Compare two analyses to see if changes improved balance
///
/// A character counts as improved or regressed when its distance from 50%
/// changes by more than two points.
pub fn compare_analyses(before: &BalanceAnalysis, after: &BalanceAnalysis) -> ComparisonReport {
    let mut improvements = Vec::new();
    let mut regressions = Vec::new();

    let deltas: Vec<RateDelta> = before
        .characters
        .iter()
        .map(|b| {
            let a = after.character(&b.id);
            let delta = RateDelta {
                id: b.id.clone(),
                before: b.rate(before.view),
                after: a.and_then(|a| a.rate(after.view)),
                class_before: b.classification,
                class_after: a.and_then(|a| a.classification),
            };
            if let (Some(before_rate), Some(after_rate)) = (delta.before, delta.after) {
                let before_dist = (before_rate - 0.5).abs();
                let after_dist = (after_rate - 0.5).abs();
                let line = format!(
                    "{}: {:.1}% -> {:.1}%",
                    b.id,
                    before_rate * 100.0,
                    after_rate * 100.0
                );
                if after_dist < before_dist - 0.02 {
                    improvements.push(line);
                } else if after_dist > before_dist + 0.02 {
                    regressions.push(line);
                }
            }
            delta
        })
        .collect();

    ComparisonReport {
        deltas,
        improvements,
        regressions,
        score_before: before.balance_score,
        score_after: after.balance_score,
        before_issue_count: before.outliers.len(),
        after_issue_count: after.outliers.len(),
    }
}
