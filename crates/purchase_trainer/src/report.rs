//! Console reporting of evaluation results and predictions

use purchase_core::{EvaluationMetrics, Verdict};
use std::io::{self, Write};

/// Format a ratio in [0, 1] as a percentage with two decimals
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Accuracy, AUC and F1 followed by the verdict line
pub fn write_metrics<W: Write>(
    out: &mut W,
    metrics: &EvaluationMetrics,
    verdict: Verdict,
) -> io::Result<()> {
    writeln!(out, "Accuracy: {}", percent(metrics.accuracy))?;
    writeln!(out, "AUC: {}", percent(metrics.auc))?;
    writeln!(out, "F1 Score: {}", percent(metrics.f1))?;
    writeln!(out, "{}", verdict)
}

/// Secondary metrics and the confusion matrix
pub fn write_details<W: Write>(out: &mut W, metrics: &EvaluationMetrics) -> io::Result<()> {
    let c = &metrics.confusion;
    writeln!(out, "Precision: {}", percent(metrics.precision))?;
    writeln!(out, "Recall: {}", percent(metrics.recall))?;
    writeln!(out, "Log-loss: {:.4}", metrics.log_loss)?;
    writeln!(out, "Confusion matrix ({} examples):", c.total())?;
    writeln!(
        out,
        "  purchases:     {:>8} found, {:>8} missed",
        c.true_positives, c.false_negatives
    )?;
    writeln!(
        out,
        "  non-purchases: {:>8} rejected, {:>8} false alarms",
        c.true_negatives, c.false_positives
    )
}

pub fn write_prediction<W: Write>(out: &mut W, is_purchase: bool) -> io::Result<()> {
    writeln!(out, "Predicted purchase: {}", is_purchase)
}
