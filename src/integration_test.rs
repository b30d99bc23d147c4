#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::thread;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::prelude::*;

    #[test]
    fn test_concurrent_first_queries_build_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tree = HilbertRTree::with_capacity(5000);
        for i in 0..5000_usize {
            let x = rng.random_range(0.0..1000.0);
            let y = rng.random_range(0.0..1000.0);
            tree.add(x, y, x + 2.0, y + 2.0, i).unwrap();
        }
        let tree = Arc::new(tree);
        let search = Envelope::new(250.0, 250.0, 500.0, 500.0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tree = Arc::clone(&tree);
                thread::spawn(move || {
                    let mut found: Vec<usize> = tree.query(&search).into_iter().copied().collect();
                    found.sort_unstable();
                    (found, tree.node_bounds())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tree.is_built());
        assert!(!results[0].0.is_empty());
        for (found, bounds) in &results[1..] {
            assert_eq!(found, &results[0].0, "threads saw different query results");
            assert_eq!(bounds, &results[0].1, "threads saw different packed layouts");
        }
    }

    #[test]
    fn test_concurrent_interval_queries() {
        let mut tree = IntervalTree::new();
        for i in 0..2000_i32 {
            let min = f64::from(i) * 0.5;
            tree.insert(min, min + 3.0, i).unwrap();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = (0..6_i32)
                .map(|t| {
                    let tree = &tree;
                    scope.spawn(move || {
                        let q = f64::from(t) * 100.0;
                        let mut found: Vec<i32> =
                            tree.query(q, q + 10.0).into_iter().copied().collect();
                        found.sort_unstable();
                        (t, found)
                    })
                })
                .collect();
            for handle in handles {
                let (t, found) = handle.join().unwrap();
                let q = f64::from(t) * 100.0;
                let expected: Vec<i32> = (0..2000_i32)
                    .filter(|&i| {
                        let min = f64::from(i) * 0.5;
                        min <= q + 10.0 && min + 3.0 >= q
                    })
                    .collect();
                assert_eq!(found, expected);
            }
        });
        assert!(tree.is_built());
    }

    #[test]
    fn test_segment_endpoint_snapping_workflow() {
        // snap noisy segment endpoints, then index the cleaned segments
        let raw = [
            ((0.0, 0.0), (10.0, 0.02)),
            ((10.01, 0.0), (10.0, 10.0)),
            ((9.98, 10.01), (0.0, 10.0)),
            ((0.02, 9.99), (0.01, 0.01)),
        ];

        let mut snapper: SnapKdTree<usize> = SnapKdTree::with_tolerance(0.05).unwrap();
        let mut segments = Vec::new();
        for (i, &(a, b)) in raw.iter().enumerate() {
            let a = snapper.insert(Coord::from(a), Some(2 * i)).coord();
            let b = snapper.insert(Coord::from(b), Some(2 * i + 1)).coord();
            segments.push((a, b));
        }
        assert_eq!(snapper.len(), 4, "square corners");
        assert!(snapper.nodes().iter().all(|node| node.count() == 2));

        let mut boxes = HilbertRTree::new();
        let mut spans = IntervalTree::new();
        for (i, (a, b)) in segments.iter().enumerate() {
            let env =
                Envelope::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y)).unwrap();
            boxes.insert(env, i).unwrap();
            spans.insert(env.min_x, env.max_x, i).unwrap();
        }

        let corner = Envelope::from_point(10.0, 10.0);
        let mut touching: Vec<usize> = boxes.query(&corner).into_iter().copied().collect();
        touching.sort_unstable();
        assert_eq!(touching, vec![1, 2]);

        let mut left_side: Vec<usize> = spans.query(-1.0, 1.0).into_iter().copied().collect();
        left_side.sort_unstable();
        assert_eq!(left_side, vec![0, 2, 3]);

        assert_eq!(boxes.insert(corner, 9), Err(IndexError::UseAfterFreeze));
        assert_eq!(spans.insert(0.0, 1.0, 9), Err(IndexError::UseAfterFreeze));
    }
}
