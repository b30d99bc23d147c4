//! Find intervals overlapping a query range.
use spindex::prelude::*;

fn main() -> Result<(), IndexError> {
    let mut tree = IntervalTree::with_capacity(3);
    tree.insert(0.0, 10.0, "A")?;
    tree.insert(20.0, 30.0, "B")?; // outside query
    tree.insert(5.0, 25.0, "C")?;

    let mut results = tree.query(9.0, 11.0);
    results.sort();
    println!("Overlapping: {:?}", results);

    // [9, 11] overlaps A and C, but not B
    assert_eq!(results, vec![&"A", &"C"], "Expected A and C");

    // the first query froze the tree
    assert_eq!(tree.insert(40.0, 50.0, "D"), Err(IndexError::UseAfterFreeze));
    Ok(())
}
