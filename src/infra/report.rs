// ============================================================
// Layer 6 - Evaluation Report
// ============================================================
// Confusion matrix and per-class classification report for the
// held-out split.
//
// Confusion matrix:
//   rows    = true label, cols = predicted label
//   labels  = sorted distinct values of y_true
//   each cell carries a shade glyph scaled to its row maximum,
//   so the diagonal stands out in a terminal like a heatmap
//
// Classification report (per class over labels seen in either
// y_true or y_pred):
//   precision = TP / (TP + FP)
//   recall    = TP / (TP + FN)
//   f1-score  = 2PR / (P + R)
//   support   = number of true samples of the class
// followed by accuracy, macro avg and weighted avg rows.
// Zero denominators give 0.0.

use anyhow::{Context, Result};
use std::{collections::BTreeSet, fs, path::Path};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::domain::labels::LabelMap;

/// Light to dark, indexed by count / row max
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

// ─── ConfusionMatrix ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<usize>,
    /// counts[true_idx][pred_idx]
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Predictions whose class never occurs in y_true are not counted.
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        let labels: Vec<usize> = y_true.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let index_of = |label: usize| labels.binary_search(&label).ok();

        let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if let (Some(i), Some(j)) = (index_of(t), index_of(p)) {
                counts[i][j] += 1;
            }
        }

        Self { labels, counts }
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn count(&self, true_label: usize, pred_label: usize) -> usize {
        match (
            self.labels.binary_search(&true_label),
            self.labels.binary_search(&pred_label),
        ) {
            (Ok(i), Ok(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    /// Terminal heatmap with annotated counts.
    pub fn render(&self, names: &LabelMap) -> String {
        let mut builder = Builder::default();

        let mut header = vec!["true \\ pred".to_string()];
        header.extend(self.labels.iter().map(|&l| names.name(l)));
        builder.push_record(header);

        for (i, row) in self.counts.iter().enumerate() {
            let row_max = row.iter().copied().max().unwrap_or(0);
            let mut record = vec![names.name(self.labels[i])];
            record.extend(row.iter().map(|&c| format!("{}{}", c, shade(c, row_max))));
            builder.push_record(record);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// Plain CSV with a header row of labels.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut out = String::from("true\\pred");
        for l in &self.labels {
            out.push_str(&format!(",{l}"));
        }
        out.push('\n');

        for (label, row) in self.labels.iter().zip(&self.counts) {
            out.push_str(&label.to_string());
            for c in row {
                out.push_str(&format!(",{c}"));
            }
            out.push('\n');
        }

        fs::write(path, out).with_context(|| format!("Cannot write '{}'", path.display()))
    }
}

fn shade(count: usize, row_max: usize) -> char {
    if count == 0 || row_max == 0 {
        return SHADES[0];
    }
    let level = (count * (SHADES.len() - 1) + row_max - 1) / row_max;
    SHADES[level.min(SHADES.len() - 1)]
}

// ─── ClassificationReport ─────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub label:     usize,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes:  Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_avg:    (f64, f64, f64),
    pub weighted_avg: (f64, f64, f64),
    pub total:    usize,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "")]
    name: String,
    precision: String,
    recall: String,
    #[tabled(rename = "f1-score")]
    f1: String,
    support: usize,
}

impl ClassificationReport {
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        let labels: BTreeSet<usize> = y_true.iter().chain(y_pred).copied().collect();
        let pairs: Vec<(usize, usize)> = y_true.iter().copied().zip(y_pred.iter().copied()).collect();
        let total = pairs.len();

        let classes: Vec<ClassScores> = labels
            .into_iter()
            .map(|label| {
                let tp = pairs.iter().filter(|&&(t, p)| t == label && p == label).count();
                let predicted = pairs.iter().filter(|&&(_, p)| p == label).count();
                let support   = pairs.iter().filter(|&&(t, _)| t == label).count();

                let precision = ratio(tp, predicted);
                let recall    = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassScores { label, precision, recall, f1, support }
            })
            .collect();

        let correct = pairs.iter().filter(|(t, p)| t == p).count();
        let n_classes = classes.len().max(1) as f64;

        let macro_avg = (
            classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        );

        let weight = |f: fn(&ClassScores) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = (weight(|c| c.precision), weight(|c| c.recall), weight(|c| c.f1));

        Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
            total,
        }
    }

    pub fn render(&self, names: &LabelMap) -> String {
        let fmt = |v: f64| format!("{v:.2}");

        let mut rows: Vec<ReportRow> = self
            .classes
            .iter()
            .map(|c| ReportRow {
                name:      names.name(c.label),
                precision: fmt(c.precision),
                recall:    fmt(c.recall),
                f1:        fmt(c.f1),
                support:   c.support,
            })
            .collect();

        rows.push(ReportRow {
            name:      "accuracy".into(),
            precision: String::new(),
            recall:    String::new(),
            f1:        fmt(self.accuracy),
            support:   self.total,
        });
        for (name, (p, r, f)) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            rows.push(ReportRow {
                name:      name.into(),
                precision: fmt(p),
                recall:    fmt(r),
                f1:        fmt(f),
                support:   self.total,
            });
        }

        let mut table = Table::new(rows);
        table.with(Style::psql());
        table.to_string()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
