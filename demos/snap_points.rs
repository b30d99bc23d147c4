//! Snap noisy points onto shared nodes and count the repeats.
use spindex::prelude::*;

fn main() -> Result<(), IndexError> {
    let mut tree = SnapKdTree::with_tolerance(0.1)?;
    let samples = [
        (0.0, 0.0, "origin"),
        (10.0, 0.0, "east"),
        (0.05, -0.02, "origin again"),
        (10.0, 10.0, "north-east"),
        (9.97, 0.04, "east again"),
        (0.0, 0.0, "origin once more"),
    ];
    for (x, y, label) in samples {
        let node = tree.insert(Coord::new(x, y), Some(label));
        println!("({x}, {y}) -> node at {:?} x{}", node.coord(), node.count());
    }

    // three distinct locations survive
    assert_eq!(tree.len(), 3, "Expected three nodes");
    let origin = tree.find(Coord::new(0.0, 0.0)).map(KdNode::count);
    assert_eq!(origin, Some(3), "Origin should have snapped three points");

    let search = Envelope::new(-1.0, -1.0, 11.0, 1.0)?;
    let nodes = tree.query(&search);
    let coords = SnapKdTree::to_coords(&nodes, true);
    println!("Along the x axis: {:?}", coords);
    assert_eq!(coords.len(), 5, "Two nodes covering five inserts");
    Ok(())
}
