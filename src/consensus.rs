//! Consensus aggregation
//!
//! Pure fusion of a [`SampleSet`] into one [`ConsensusResult`]:
//! - overall score: rounded mean of all samples
//! - free text: taken from the representative sample (rank 2 by score, descending)
//! - metric scores: rounded per-position mean, labels from the representative
//! - artist name: most frequent name, ties resolved toward the lower score
//!
//! No I/O. The same set always produces the same result.

use crate::error::AnalysisError;
use crate::models::{ConsensusResult, Sample, SampleSet, VocalMetric, SAMPLE_COUNT};
use crate::Result;

/// Name used if mode resolution has nothing to choose from
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// Fuse a sample set into a consensus result
pub fn aggregate(set: &SampleSet) -> Result<ConsensusResult> {
    let samples = set.samples();

    check_metric_alignment(samples)?;

    let order = score_order(samples);
    let representative = &samples[order[1]];

    let overall_score = rounded_mean(samples.iter().map(|s| s.overall_score));

    let metrics = representative
        .metrics
        .iter()
        .enumerate()
        .map(|(idx, metric)| VocalMetric {
            score: rounded_mean(samples.iter().map(|s| s.metrics[idx].score)),
            ..metric.clone()
        })
        .collect();

    let names: Vec<&str> = order
        .iter()
        .map(|&slot| samples[slot].identified_artist.name.as_str())
        .collect();
    let name = resolve_mode(&names).unwrap_or(UNKNOWN_ARTIST).to_string();

    let mut fused = representative.clone();
    fused.overall_score = overall_score;
    fused.metrics = metrics;
    fused.identified_artist.name = name;

    Ok(ConsensusResult::new(fused))
}

/// Slot of the sample supplying free text.
///
/// Stable-sorts slots by overall score descending and takes position 1. When
/// the top two scores tie this picks the second of the tied-highest samples,
/// not a true median.
pub fn representative_index(samples: &[Sample; SAMPLE_COUNT]) -> usize {
    score_order(samples)[1]
}

/// Slots stable-sorted by overall score, highest first.
///
/// Both the representative pick and the name vote read samples in this order,
/// so equal-frequency names resolve to the lowest-scoring sample.
pub fn score_order(samples: &[Sample; SAMPLE_COUNT]) -> [usize; SAMPLE_COUNT] {
    let mut order: [usize; SAMPLE_COUNT] = std::array::from_fn(|slot| slot);
    order.sort_by(|&a, &b| {
        samples[b]
            .overall_score
            .total_cmp(&samples[a].overall_score)
    });
    order
}

/// Most frequent value.
///
/// Stable-sorts by ascending frequency and takes the last entry, so among
/// equally frequent values the one appearing last in `values` wins.
pub fn resolve_mode<'a>(values: &[&'a str]) -> Option<&'a str> {
    let mut ranked: Vec<(&'a str, usize)> = values
        .iter()
        .map(|v| (*v, values.iter().filter(|other| *other == v).count()))
        .collect();
    ranked.sort_by_key(|(_, frequency)| *frequency);
    ranked.last().map(|(value, _)| *value)
}

/// Arithmetic mean rounded half-up to a whole number
pub fn rounded_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    round_half_up(sum / count as f64)
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Every sample must carry the same metrics in the same order
fn check_metric_alignment(samples: &[Sample; SAMPLE_COUNT]) -> Result<()> {
    let expected = &samples[0].metrics;

    for (slot, sample) in samples.iter().enumerate().skip(1) {
        if sample.metrics.len() != expected.len() {
            return Err(AnalysisError::AggregationPrecondition(format!(
                "metric count mismatch: sample 0 has {}, sample {} has {}",
                expected.len(),
                slot,
                sample.metrics.len()
            )));
        }

        for (idx, (a, b)) in expected.iter().zip(&sample.metrics).enumerate() {
            if normalize_label(&a.label) != normalize_label(&b.label) {
                return Err(AnalysisError::AggregationPrecondition(format!(
                    "metric {} label mismatch: '{}' vs '{}' (sample {})",
                    idx, a.label, b.label, slot
                )));
            }
        }
    }

    Ok(())
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
