//! Comparison tests between the indexes and brute-force scans over the same data

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use crate::{Coord, Envelope, HilbertRTree, IntervalTree, RTreeOptions, SnapKdTree};

    fn random_boxes(rng: &mut StdRng, count: usize, world: f64, max_size: f64) -> Vec<Envelope> {
        (0..count)
            .map(|_| {
                let min_x = rng.random_range(0.0..world);
                let min_y = rng.random_range(0.0..world);
                let max_x = min_x + rng.random_range(0.0..max_size);
                let max_y = min_y + rng.random_range(0.0..max_size);
                Envelope { min_x, min_y, max_x, max_y }
            })
            .collect()
    }

    fn random_intervals(rng: &mut StdRng, count: usize) -> Vec<(f64, f64)> {
        (0..count)
            .map(|_| {
                let min = rng.random_range(-500.0..500.0);
                (min, min + rng.random_range(0.0..40.0))
            })
            .collect()
    }

    fn brute_force_boxes(boxes: &[Envelope], search: &Envelope) -> Vec<usize> {
        (0..boxes.len()).filter(|&i| boxes[i].intersects(search)).collect()
    }

    fn build_rtree(boxes: &[Envelope], node_capacity: usize) -> HilbertRTree<usize> {
        let options =
            RTreeOptions { node_capacity, capacity: boxes.len(), ..RTreeOptions::default() };
        let mut tree = HilbertRTree::with_options(options).unwrap();
        for (i, env) in boxes.iter().enumerate() {
            tree.insert(*env, i).unwrap();
        }
        tree.build();
        tree
    }

    fn query_sorted(tree: &HilbertRTree<usize>, search: &Envelope) -> Vec<usize> {
        let mut found: Vec<usize> = tree.query(search).into_iter().copied().collect();
        found.sort_unstable();
        found
    }

    // ============================================================================
    // HILBERT R-TREE VS BRUTE FORCE
    // ============================================================================

    #[test]
    fn test_rtree_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let boxes = random_boxes(&mut rng, 2000, 1000.0, 20.0);
        let tree = build_rtree(&boxes, 4);

        for _ in 0..200 {
            let search = random_boxes(&mut rng, 1, 1000.0, 150.0)[0];
            assert_eq!(
                query_sorted(&tree, &search),
                brute_force_boxes(&boxes, &search),
                "query {search:?} differs from brute force"
            );
        }
    }

    #[test]
    fn test_rtree_fan_out_independent() {
        let mut rng = StdRng::seed_from_u64(7);
        let boxes = random_boxes(&mut rng, 777, 100.0, 8.0);
        let trees: Vec<HilbertRTree<usize>> =
            [1, 2, 4, 16].iter().map(|&cap| build_rtree(&boxes, cap)).collect();

        for _ in 0..100 {
            let search = random_boxes(&mut rng, 1, 100.0, 25.0)[0];
            let expected = brute_force_boxes(&boxes, &search);
            for tree in &trees {
                assert_eq!(
                    query_sorted(tree, &search),
                    expected,
                    "fan-out {} gave a different result for {search:?}",
                    tree.node_capacity()
                );
            }
        }
    }

    #[test]
    fn test_rtree_point_boxes_and_point_queries() {
        let mut rng = StdRng::seed_from_u64(99);
        let boxes: Vec<Envelope> = (0..500)
            .map(|_| Envelope::from_point(rng.random_range(0.0..50.0), rng.random_range(0.0..50.0)))
            .collect();
        let tree = build_rtree(&boxes, 16);

        // every stored point finds at least itself
        for (i, env) in boxes.iter().enumerate() {
            assert!(query_sorted(&tree, env).contains(&i), "point {i} not found");
        }
    }

    #[test]
    fn test_rtree_insertion_order_independent() {
        let mut rng = StdRng::seed_from_u64(2024);
        let boxes = random_boxes(&mut rng, 300, 100.0, 10.0);
        let forward = build_rtree(&boxes, 4);

        let mut order: Vec<usize> = (0..boxes.len()).collect();
        order.shuffle(&mut rng);
        let mut shuffled = HilbertRTree::new();
        for &i in &order {
            shuffled.insert(boxes[i], i).unwrap();
        }

        for _ in 0..50 {
            let search = random_boxes(&mut rng, 1, 100.0, 30.0)[0];
            assert_eq!(query_sorted(&forward, &search), query_sorted(&shuffled, &search));
        }
    }

    #[test]
    fn test_rtree_collinear_extent() {
        // all items on one horizontal line: the extent has zero height
        let boxes: Vec<Envelope> =
            (0..64_i32).map(|i| Envelope::from_point(f64::from(i), 3.0)).collect();
        let tree = build_rtree(&boxes, 4);
        let search = Envelope::new(10.0, 0.0, 20.0, 5.0).unwrap();
        assert_eq!(query_sorted(&tree, &search), (10..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_rtree_hilbert_orders_agree() {
        let mut rng = StdRng::seed_from_u64(5);
        let boxes = random_boxes(&mut rng, 400, 10.0, 1.0);
        let coarse = {
            let options = RTreeOptions { hilbert_order: 1, ..RTreeOptions::default() };
            let mut tree = HilbertRTree::with_options(options).unwrap();
            for (i, env) in boxes.iter().enumerate() {
                tree.insert(*env, i).unwrap();
            }
            tree
        };
        let fine = build_rtree(&boxes, 4);

        for _ in 0..50 {
            let search = random_boxes(&mut rng, 1, 10.0, 3.0)[0];
            assert_eq!(query_sorted(&coarse, &search), query_sorted(&fine, &search));
        }
    }

    // ============================================================================
    // INTERVAL TREE VS BRUTE FORCE
    // ============================================================================

    #[test]
    fn test_interval_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(11);
        let intervals = random_intervals(&mut rng, 1500);
        let mut tree = IntervalTree::with_capacity(intervals.len());
        for (i, &(min, max)) in intervals.iter().enumerate() {
            tree.insert(min, max, i).unwrap();
        }

        for _ in 0..200 {
            let q_min = rng.random_range(-550.0..550.0);
            let q_max = q_min + rng.random_range(0.0..60.0);
            let mut found: Vec<usize> = tree.query(q_min, q_max).into_iter().copied().collect();
            found.sort_unstable();
            let expected: Vec<usize> = (0..intervals.len())
                .filter(|&i| !(intervals[i].1 < q_min || intervals[i].0 > q_max))
                .collect();
            assert_eq!(found, expected, "query [{q_min}, {q_max}] differs from brute force");
        }
    }

    #[test]
    fn test_interval_insertion_order_independent() {
        let mut rng = StdRng::seed_from_u64(12);
        let intervals = random_intervals(&mut rng, 400);
        let mut order: Vec<usize> = (0..intervals.len()).collect();
        order.shuffle(&mut rng);

        let mut forward = IntervalTree::new();
        let mut shuffled = IntervalTree::new();
        for (i, &(min, max)) in intervals.iter().enumerate() {
            forward.insert(min, max, i).unwrap();
        }
        for &i in &order {
            shuffled.insert(intervals[i].0, intervals[i].1, i).unwrap();
        }

        for _ in 0..50 {
            let q_min = rng.random_range(-500.0..500.0);
            let q_max = q_min + rng.random_range(0.0..30.0);
            let mut a: Vec<usize> = forward.query(q_min, q_max).into_iter().copied().collect();
            let mut b: Vec<usize> = shuffled.query(q_min, q_max).into_iter().copied().collect();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    // ============================================================================
    // SNAP KD-TREE VS BRUTE FORCE
    // ============================================================================

    #[test]
    fn test_kd_query_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut tree = SnapKdTree::new();
        let mut points = Vec::new();
        for i in 0..1000 {
            // integer grid so exact duplicates occur
            let x = f64::from(rng.random_range(0..60_i32));
            let y = f64::from(rng.random_range(0..60_i32));
            let p = Coord::new(x, y);
            tree.insert(p, Some(i));
            points.push(p);
        }

        let total: usize = tree.nodes().iter().map(|node| node.count()).sum();
        assert_eq!(total, points.len(), "every insert is accounted for");

        for _ in 0..100 {
            let x = rng.random_range(-5.0..60.0);
            let y = rng.random_range(-5.0..60.0);
            let (w, h) = (rng.random_range(0.0..20.0), rng.random_range(0.0..20.0));
            let search = Envelope::new(x, y, x + w, y + h).unwrap();

            let mut found: Vec<(f64, f64)> =
                tree.query(&search).iter().map(|node| (node.x(), node.y())).collect();
            found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

            let mut expected: Vec<(f64, f64)> = points
                .iter()
                .filter(|p| search.contains_coord(p))
                .map(|p| (p.x, p.y))
                .collect();
            expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            expected.dedup();

            assert_eq!(found, expected, "query {search:?} differs from brute force");
        }
    }

    #[test]
    fn test_kd_snapped_nodes_are_separated() {
        let mut rng = StdRng::seed_from_u64(33);
        let tolerance = 1.5;
        let mut tree: SnapKdTree<()> = SnapKdTree::with_tolerance(tolerance).unwrap();
        for _ in 0..2000 {
            let p = Coord::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0));
            tree.insert_point(p);
        }

        let nodes = tree.nodes();
        let total: usize = nodes.iter().map(|node| node.count()).sum();
        assert_eq!(total, 2000);
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                assert!(
                    a.coord().distance(&b.coord()) > tolerance,
                    "nodes {:?} and {:?} should have snapped",
                    a.coord(),
                    b.coord()
                );
            }
        }
    }

    #[test]
    fn test_kd_insertion_order_independent() {
        let mut rng = StdRng::seed_from_u64(44);
        let mut points: Vec<Coord> = (0..500)
            .map(|_| Coord::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();

        let mut forward: SnapKdTree<()> = SnapKdTree::new();
        for p in &points {
            forward.insert_point(*p);
        }
        points.shuffle(&mut rng);
        let mut shuffled: SnapKdTree<()> = SnapKdTree::new();
        for p in &points {
            shuffled.insert_point(*p);
        }

        for _ in 0..50 {
            let x = rng.random_range(0.0..90.0);
            let y = rng.random_range(0.0..90.0);
            let search = Envelope::new(x, y, x + 10.0, y + 10.0).unwrap();
            let mut a = SnapKdTree::to_coords(&forward.query(&search), true);
            let mut b = SnapKdTree::to_coords(&shuffled.query(&search), true);
            a.sort_by(Coord::compare);
            b.sort_by(Coord::compare);
            assert_eq!(a, b);
        }
    }
}
