//! Seeded k-means (k-means++ seeding, Lloyd refinement, best of n restarts)
//!
//! Callers guarantee `k >= 1` and at least `k` distinct points.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::standardize::{FeatureVector, N_FEATURES};

/// Outcome of one fit
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<FeatureVector>,
    /// Sum of squared distances to assigned centroids
    pub inertia: f64,
    pub n_iter: usize,
}

/// Parameters for `fit`
#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

/// Run `n_init` seeded restarts and keep the lowest inertia
///
/// Restart seeds are drawn from a master RNG seeded with `params.seed`, so the
/// same points and seed always give the same fit. Ties keep the earlier restart.
pub fn fit(points: &[FeatureVector], params: KMeansParams) -> KMeansFit {
    let mut master = StdRng::seed_from_u64(params.seed);
    let mut best: Option<KMeansFit> = None;

    for _ in 0..params.n_init.max(1) {
        let mut rng = StdRng::seed_from_u64(master.gen());
        let candidate = run_once(points, params.k, params.max_iter, params.tolerance, &mut rng);

        let better = best.as_ref().map_or(true, |b| candidate.inertia < b.inertia);
        if better {
            best = Some(candidate);
        }
    }

    // n_init is clamped to at least one restart above
    best.unwrap_or_else(|| run_once(points, params.k, params.max_iter, params.tolerance, &mut master))
}

fn run_once(
    points: &[FeatureVector],
    k: usize,
    max_iter: usize,
    tolerance: f64,
    rng: &mut StdRng,
) -> KMeansFit {
    let mut centroids = init_plus_plus(points, k, rng);
    let mut labels = vec![0usize; points.len()];
    let mut n_iter = 0;

    for iter in 1..=max_iter.max(1) {
        assign(points, &centroids, &mut labels);
        fill_empty_clusters(points, &centroids, &mut labels, k);
        let updated = means(points, &labels, k);

        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| squared_dist(old, new))
            .sum();

        centroids = updated;
        n_iter = iter;

        if shift <= tolerance {
            break;
        }
    }

    // Final assignment against the converged centroids
    assign(points, &centroids, &mut labels);
    if fill_empty_clusters(points, &centroids, &mut labels, k) {
        centroids = means(points, &labels, k);
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &c)| squared_dist(p, &centroids[c]))
        .sum();

    KMeansFit { labels, centroids, inertia, n_iter }
}

/// k-means++: first centre uniform, the rest weighted by squared distance
fn init_plus_plus(points: &[FeatureVector], k: usize, rng: &mut StdRng) -> Vec<FeatureVector> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..n)]);

    while centroids.len() < k {
        let dists: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_dist(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        let total: f64 = dists.iter().sum();
        if total <= 0.0 {
            // Fewer distinct points than k; excluded by the caller
            centroids.push(points[rng.gen_range(0..n)]);
            continue;
        }

        let threshold = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (i, &d) in dists.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            cumulative += d;
            chosen = Some(i);
            if cumulative > threshold {
                break;
            }
        }
        // chosen is Some: total > 0 means at least one positive distance
        centroids.push(points[chosen.unwrap_or(0)]);
    }

    centroids
}

/// Nearest-centroid assignment, ties to the lower index
fn assign(points: &[FeatureVector], centroids: &[FeatureVector], labels: &mut [usize]) {
    for (label, p) in labels.iter_mut().zip(points) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let d = squared_dist(p, centroid);
            if d < best_dist {
                best = c;
                best_dist = d;
            }
        }
        *label = best;
    }
}

/// Move the worst-fitting point of a multi-member cluster into each empty one
///
/// Returns whether any label changed.
fn fill_empty_clusters(
    points: &[FeatureVector],
    centroids: &[FeatureVector],
    labels: &mut [usize],
    k: usize,
) -> bool {
    let mut counts = vec![0usize; k];
    for &c in labels.iter() {
        counts[c] += 1;
    }

    let mut changed = false;
    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let donor = (0..points.len())
            .filter(|&i| counts[labels[i]] > 1)
            .map(|i| (i, squared_dist(&points[i], &centroids[labels[i]])))
            .fold(None, |acc: Option<(usize, f64)>, (i, d)| match acc {
                Some((_, best)) if best >= d => acc,
                _ => Some((i, d)),
            });

        if let Some((i, _)) = donor {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
            changed = true;
        }
    }
    changed
}

fn means(points: &[FeatureVector], labels: &[usize], k: usize) -> Vec<FeatureVector> {
    let mut sums = vec![[0.0f64; N_FEATURES]; k];
    let mut counts = vec![0usize; k];
    for (p, &c) in points.iter().zip(labels) {
        counts[c] += 1;
        for j in 0..N_FEATURES {
            sums[c][j] += p[j];
        }
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            for v in sum.iter_mut() {
                *v /= count as f64;
            }
        }
    }
    sums
}

pub(crate) fn squared_dist(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
