#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::cluster::VotingEnsemble;
    use crate::hierarchy::Severity;
    use crate::labels::{members, n_clusters, Label, NOISE};
    use crate::metrics::nmi;
    use crate::strategy::{
        DensityStrategy, EnsembleStrategy, LayeredClustering, PartitionStrategy, Strategy,
    };
    use crate::{ClusterRef, Error, LabelLayer, Result};
    use ndarray::Array2;
    use rand::prelude::*;
    use rand_distr::Normal;

    const CENTERS: [(f32, f32); 5] = [(0.1, 0.1), (0.9, 0.1), (0.5, 0.5), (0.1, 0.9), (0.9, 0.9)];

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Five Gaussian blobs (std 0.05) followed by uniform noise on the unit
    /// square. Ground truth is the blob index, `-1` for noise.
    fn blobs(per_blob: usize, n_noise: usize, seed: u64) -> (Array2<f32>, Vec<Label>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0f32, 0.05).unwrap();
        let n = CENTERS.len() * per_blob + n_noise;

        let mut data = Array2::<f32>::zeros((n, 2));
        let mut truth = Vec::with_capacity(n);
        for (b, &(cx, cy)) in CENTERS.iter().enumerate() {
            for i in 0..per_blob {
                let row = b * per_blob + i;
                data[[row, 0]] = cx + normal.sample(&mut rng);
                data[[row, 1]] = cy + normal.sample(&mut rng);
                truth.push(b as Label);
            }
        }
        for row in CENTERS.len() * per_blob..n {
            data[[row, 0]] = rng.random_range(0.0..1.0);
            data[[row, 1]] = rng.random_range(0.0..1.0);
            truth.push(NOISE);
        }
        (data, truth)
    }

    /// Blobs nested three levels deep: 4 groups 100 apart, each holding 3
    /// subgroups 10 apart, each holding 4 blobs 1 apart. Every blob has 20
    /// points with std 0.05.
    fn nested_blobs(seed: u64) -> Array2<f32> {
        const GROUPS: [(f32, f32); 4] = [(0.0, 0.0), (100.0, 0.0), (0.0, 100.0), (100.0, 100.0)];
        const SUBGROUPS: [(f32, f32); 3] = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        const BLOBS: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
        const PER_BLOB: usize = 20;

        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0f32, 0.05).unwrap();
        let n = GROUPS.len() * SUBGROUPS.len() * BLOBS.len() * PER_BLOB;
        let mut data = Array2::<f32>::zeros((n, 2));
        let mut row = 0;
        for &(gx, gy) in &GROUPS {
            for &(sx, sy) in &SUBGROUPS {
                for &(bx, by) in &BLOBS {
                    for _ in 0..PER_BLOB {
                        data[[row, 0]] = gx + sx + bx + normal.sample(&mut rng);
                        data[[row, 1]] = gy + sy + by + normal.sample(&mut rng);
                        row += 1;
                    }
                }
            }
        }
        data
    }

    fn embeddings(n: usize, seed: u64) -> Array2<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((n, 16), |_| rng.random::<f32>())
    }

    fn label_stack(layers: &[LabelLayer]) -> Vec<Vec<Label>> {
        layers.iter().map(|l| l.labels().to_vec()).collect()
    }

    fn density() -> DensityStrategy {
        DensityStrategy::new().with_min_clusters(4).with_min_samples(5)
    }

    #[test]
    fn density_pipeline_on_noisy_blobs() -> Result<()> {
        init_logging();
        let (points, truth) = blobs(200, 100, 0);
        let embed = embeddings(points.nrows(), 1);

        let (layers, tree) = density().fit_predict(points.view(), embed.view(), LabelLayer::new)?;
        let stack = label_stack(&layers);

        assert!(!layers.is_empty());
        assert_eq!(tree.n_layers(), layers.len());
        for layer in &layers {
            assert!(layer.n_clusters() >= 4);
            assert_eq!(layer.centroids().dim(), (layer.n_clusters(), 16));
        }

        // Finest layer: noise is found, and no cluster mixes two blobs.
        let finest = &stack[0];
        assert!(finest.iter().any(|&l| l == NOISE));
        for k in 0..n_clusters(finest) {
            let mut blobs_seen: Vec<Label> = members(finest, k)
                .into_iter()
                .map(|i| truth[i])
                .filter(|&t| t != NOISE)
                .collect();
            blobs_seen.sort_unstable();
            blobs_seen.dedup();
            assert!(blobs_seen.len() <= 1, "cluster {k} mixes blobs {blobs_seen:?}");
        }

        // Density layers nest, so the tree is clean.
        let report = tree.health_check(&stack);
        assert!(report.validation.is_clean(), "{}", report);

        // Everything in the coarsest layer hangs off the root.
        let top = layers.len() - 1;
        for k in 0..n_clusters(&stack[top]) {
            assert!(tree.top_level().contains(&ClusterRef::new(top, k)));
        }

        // The coarsest layer separates the blobs well.
        let blob_points: Vec<usize> = (0..truth.len()).filter(|&i| truth[i] != NOISE).collect();
        let coarse: Vec<Label> = blob_points.iter().map(|&i| stack[top][i]).collect();
        let expected: Vec<Label> = blob_points.iter().map(|&i| truth[i]).collect();
        assert!(nmi(&coarse, &expected) > 0.5);
        Ok(())
    }

    #[test]
    fn density_pipeline_respects_max_layers() -> Result<()> {
        init_logging();
        let (points, _) = blobs(100, 50, 2);

        let full = density().fit_labels(points.view())?;
        let capped = density().with_max_layers(1).fit_labels(points.view())?;
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0], full[0]);

        let (layers, tree) = density()
            .with_max_layers(1)
            .fit_predict(points.view(), points.view(), LabelLayer::new)?;
        assert_eq!(layers.len(), 1);
        assert_eq!(tree.root().layer, 1);
        assert_eq!(tree.top_level().len(), layers[0].n_clusters());
        Ok(())
    }

    #[test]
    fn density_max_layers_cuts_a_deep_hierarchy() -> Result<()> {
        init_logging();
        let points = nested_blobs(12);

        let full = density().fit_labels(points.view())?;
        let depth = full.len();
        assert!(depth >= 3, "natural depth {depth}");
        assert!(n_clusters(&full[0]) >= 40);

        for k in [2, 3] {
            let capped = density().with_max_layers(k).fit_labels(points.view())?;
            assert_eq!(capped.len(), k);
            assert_eq!(capped.as_slice(), &full[..k]);
        }

        let roomy = density().with_max_layers(depth + 2).fit_labels(points.view())?;
        assert_eq!(roomy, full);

        let (layers, tree) = density()
            .with_max_layers(2)
            .fit_predict(points.view(), points.view(), LabelLayer::new)?;
        assert_eq!(layers.len(), 2);
        assert_eq!(tree.root().layer, 2);
        assert!(tree.health_check(&label_stack(&layers)).validation.is_clean());
        Ok(())
    }

    #[test]
    fn pipeline_is_repeatable() -> Result<()> {
        let (points, _) = blobs(80, 40, 3);
        let embed = embeddings(points.nrows(), 4);

        let strategies: Vec<Strategy> = vec![
            density().into(),
            PartitionStrategy::new()
                .with_base_n_clusters(32)
                .with_min_clusters(4)
                .with_seed(11)
                .into(),
        ];
        for strategy in strategies {
            let a = strategy.fit_predict(points.view(), embed.view(), LabelLayer::new)?;
            let b = strategy.fit_predict(points.view(), embed.view(), LabelLayer::new)?;
            assert_eq!(a, b);
        }
        Ok(())
    }

    #[test]
    fn partition_pipeline_nests_and_sharpens() -> Result<()> {
        init_logging();
        let (points, truth) = blobs(200, 0, 5);
        let embed = embeddings(points.nrows(), 6);
        let strategy = PartitionStrategy::new()
            .with_base_n_clusters(64)
            .with_min_clusters(4)
            .with_seed(0);

        let (layers, tree) = strategy.fit_predict(points.view(), embed.view(), LabelLayer::new)?;
        let stack = label_stack(&layers);
        assert_eq!(layers.len(), 3);
        assert!(stack.iter().flatten().all(|&l| l >= 0));

        let report = tree.health_check(&stack);
        assert!(report.validation.issues_at_level(Severity::Warning).is_empty(), "{}", report);
        // Exact nesting: every finer cluster has a parent one layer up.
        for (parent, children) in tree.iter() {
            if parent != tree.root() {
                assert!(children.iter().all(|c| c.layer + 1 == parent.layer));
            }
        }

        let finest = nmi(&stack[0], &truth);
        let coarsest = nmi(&stack[2], &truth);
        assert!(coarsest > finest);
        assert!(coarsest >= 0.7, "coarsest NMI {coarsest}");
        Ok(())
    }

    #[test]
    fn ensemble_pipeline_recovers_blobs() -> Result<()> {
        init_logging();
        let (points, truth) = blobs(200, 0, 8);
        let ensemble = VotingEnsemble::new()
            .with_k_range(6, 10)
            .with_vote_thresholds(vec![0.9, 0.6, 0.3])
            .with_min_cluster_size(10)
            .with_seed(7);
        let strategy = EnsembleStrategy::with_ensemble(ensemble).with_min_clusters(4);

        let (layers, tree) = strategy.fit_predict(points.view(), points.view(), LabelLayer::new)?;
        let top = layers.last().map(LabelLayer::labels).unwrap_or_default();
        let found = n_clusters(top);
        assert!((5..=7).contains(&found), "coarsest layer has {found} clusters");

        let kept: Vec<usize> = (0..top.len()).filter(|&i| top[i] != NOISE).collect();
        let pred: Vec<Label> = kept.iter().map(|&i| top[i]).collect();
        let expected: Vec<Label> = kept.iter().map(|&i| truth[i]).collect();
        assert!(nmi(&pred, &expected) >= 0.75);

        assert!(tree.health_check(&label_stack(&layers)).is_healthy());
        Ok(())
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let (points, _) = blobs(20, 0, 9);
        let embed = embeddings(points.nrows() - 1, 9);

        let err = density()
            .fit_predict(points.view(), embed.view(), LabelLayer::new)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        let empty = Array2::<f32>::zeros((0, 2));
        let err = PartitionStrategy::new()
            .fit_predict(empty.view(), empty.view(), LabelLayer::new)
            .unwrap_err();
        assert_eq!(err, Error::EmptyInput);
    }
}
