//! Find boxes that intersect a query rectangle.
//!
//! Run with `RUST_LOG=spindex=debug` to see the packing log.
use spindex::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), IndexError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = HilbertRTree::with_node_capacity(4)?;
    for row in 0..10_i32 {
        for col in 0..10_i32 {
            let (x, y) = (f64::from(col) * 2.0, f64::from(row) * 2.0);
            tree.add(x, y, x + 1.0, y + 1.0, (row, col))?;
        }
    }
    tree.build();
    println!("{} boxes packed into {} layers", tree.len(), tree.layer_count());

    let search = Envelope::new(0.7, 0.7, 3.3, 1.3)?;
    let mut results = tree.query(&search);
    results.sort();
    println!("Intersecting: {:?}", results);

    // the query strip touches the first two boxes of row 0
    assert_eq!(results, vec![&(0, 0), &(0, 1)], "Expected two boxes in row 0");

    let mut count = 0;
    tree.query_with(&Envelope::new(-1.0, -1.0, 100.0, 100.0)?, |_| count += 1);
    assert_eq!(count, 100, "Full-extent query should visit every box");
    Ok(())
}
