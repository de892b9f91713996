use rayon::prelude::*;

pub type Point = Vec<f32>;

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt()
}

/// Elkan's pruned k-means: for each point, tracks an upper bound on its
/// distance to its assigned centroid and a lower bound to every other
/// centroid, using the triangle inequality to skip most distance
/// recomputations once centroids move only a little between iterations.
pub struct ElkanKMeans {
    pub k: usize,
    pub max_iters: usize,
    pub tolerance: f32,
}

pub struct Clustering {
    pub assignments: Vec<usize>,
    pub centroids: Vec<Point>,
    pub iterations_run: usize,
}

impl ElkanKMeans {
    pub fn fit(&self, points: &[Point], seed: u64) -> Clustering {
        let dim = points.first().map(|p| p.len()).unwrap_or(0);
        let mut centroids = seed_centroids(points, self.k, seed);
        let n = points.len();
        let mut assignments = vec![0usize; n];
        let mut upper = vec![f32::MAX; n];
        let mut lower = vec![vec![0.0f32; self.k]; n];

        // Initial full assignment phase.
        assign_all(points, &centroids, &mut assignments, &mut upper, &mut lower);

        let mut iterations_run = 0;
        for _ in 0..self.max_iters {
            iterations_run += 1;

            // Pivot-distances phase: half the minimum inter-centroid
            // distance for each centroid, used to prune points whose
            // upper bound already beats it (Elkan's lemma 1).
            let centroid_dists = pairwise_centroid_distances(&centroids);
            let half_min_other: Vec<f32> = (0..self.k)
                .map(|c| {
                    (0..self.k)
                        .filter(|&o| o != c)
                        .map(|o| centroid_dists[c][o])
                        .fold(f32::MAX, f32::min)
                        / 2.0
                })
                .collect();

            // Assign phase: parallel pass, one disjoint slice per point,
            // no shared writable state until this scope returns.
            let updates: Vec<(usize, f32, Vec<f32>)> = points
                .par_iter()
                .enumerate()
                .map(|(i, p)| {
                    let mut a = assignments[i];
                    let mut u = upper[i];
                    let mut l = lower[i].clone();
                    if u > half_min_other[a] {
                        for c in 0..self.k {
                            if c == a {
                                continue;
                            }
                            if u <= l[c] || u <= centroid_dists[a][c] / 2.0 {
                                continue;
                            }
                            let d = euclidean(p, &centroids[c]);
                            l[c] = d;
                            if d < u {
                                u = d;
                                a = c;
                            }
                        }
                    }
                    (a, u, l)
                })
                .collect();

            let mut moved = false;
            for (i, (a, u, l)) in updates.into_iter().enumerate() {
                if assignments[i] != a {
                    moved = true;
                }
                assignments[i] = a;
                upper[i] = u;
                lower[i] = l;
            }

            // Update phase: recompute centroids from current assignment.
            let new_centroids = update_centroids(points, &assignments, self.k, dim);
            let shift: f32 = centroids
                .iter()
                .zip(&new_centroids)
                .map(|(a, b)| euclidean(a, b))
                .sum();
            centroids = new_centroids;

            if !moved || shift < self.tolerance {
                break;
            }
        }

        Clustering { assignments, centroids, iterations_run }
    }
}

fn seed_centroids(points: &[Point], k: usize, seed: u64) -> Vec<Point> {
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    let mut rng = SmallRng::seed_from_u64(seed);
    points.choose_multiple(&mut rng, k.min(points.len())).cloned().collect()
}

fn assign_all(
    points: &[Point],
    centroids: &[Point],
    assignments: &mut [usize],
    upper: &mut [f32],
    lower: &mut [Vec<f32>],
) {
    for (i, p) in points.iter().enumerate() {
        let mut best = 0;
        let mut best_d = f32::MAX;
        for (c, centroid) in centroids.iter().enumerate() {
            let d = euclidean(p, centroid);
            lower[i][c] = d;
            if d < best_d {
                best_d = d;
                best = c;
            }
        }
        assignments[i] = best;
        upper[i] = best_d;
    }
}

fn pairwise_centroid_distances(centroids: &[Point]) -> Vec<Vec<f32>> {
    let k = centroids.len();
    let mut d = vec![vec![0.0f32; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let dist = euclidean(&centroids[i], &centroids[j]);
            d[i][j] = dist;
            d[j][i] = dist;
        }
    }
    d
}

fn update_centroids(points: &[Point], assignments: &[usize], k: usize, dim: usize) -> Vec<Point> {
    let mut sums = vec![vec![0.0f32; dim]; k];
    let mut counts = vec![0u32; k];
    for (p, &a) in points.iter().zip(assignments) {
        for (s, v) in sums[a].iter_mut().zip(p) {
            *s += v;
        }
        counts[a] += 1;
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                sum
            } else {
                sum.into_iter().map(|v| v / count as f32).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_two_obvious_clusters() {
        let points: Vec<Point> = vec![
            vec![0.0, 0.0],
            vec![0.1, -0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
        ];
        let km = ElkanKMeans { k: 2, max_iters: 20, tolerance: 1e-4 };
        let clustering = km.fit(&points, 1);
        assert_eq!(clustering.assignments[0], clustering.assignments[1]);
        assert_eq!(clustering.assignments[2], clustering.assignments[3]);
        assert_ne!(clustering.assignments[0], clustering.assignments[2]);
    }

    #[test]
    fn converges_within_iteration_budget() {
        let points: Vec<Point> = (0..20).map(|i| vec![i as f32, 0.0]).collect();
        let km = ElkanKMeans { k: 3, max_iters: 50, tolerance: 1e-3 };
        let clustering = km.fit(&points, 2);
        assert!(clustering.iterations_run <= 50);
        assert_eq!(clustering.centroids.len(), 3);
    }
}
