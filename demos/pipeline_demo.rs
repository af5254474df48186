// Example demonstrating lazy pipeline composition and materialization
//
// Shows how intermediate operations assemble an enumerator chain without
// computing anything, how terminals drive the chain in one pass, and how
// registry-driven materialization reproduces the source shape.

use std::collections::HashSet;

use funcoll::prelude::*;

fn main() {
    println!("=== Lazy Pipeline Demo ===\n");

    // A pipeline computes nothing until a terminal operation runs.
    let data: Vec<i32> = (1..=20).collect();
    println!("Source: 20 elements (1..=20)");
    println!("\nPipeline: filter(even) -> map(x * 10) -> flatMap([x, x + 1])");

    let result = coll(data.clone())
        .filter(|x| x % 2 == 0)
        .map(|x| x * 10)
        .flat_map(|x| [*x, x + 1])
        .to_vec()
        .expect("pipeline failed");
    println!("Materialized: {:?}", result);

    // Short-circuiting terminals stop pulling as soon as they can.
    let snapshot = coll(data.clone());
    let first_big = snapshot.find(|x| *x > 10).expect("pipeline failed");
    println!("\nfind(> 10) pulled only until the match: {:?}", first_big);

    // Folding and grouping.
    let sum = snapshot.reduce(0, |acc, x| acc + x).expect("pipeline failed");
    println!("reduce(+): {}", sum);

    let by_residue = snapshot.group_by(|x| x % 3).expect("pipeline failed");
    println!("group_by(x % 3): {} groups", by_residue.len());

    // The registry rebuilds the source's shape: a set source materializes
    // as a set again, collapsing duplicates introduced by the transform.
    let registry: BuilderRegistry<i32> = BuilderRegistry::with_defaults();
    let set_source: HashSet<i32> = (1..=10).collect();
    let materialized = Coll::from(set_source)
        .map(|x| x / 2)
        .materialize_with(&registry)
        .expect("materialization failed");
    println!(
        "\nSet source through map(x / 2): shape {:?}, {} distinct values",
        materialized.shape(),
        materialized.len()
    );

    // String joining over a sliced pipeline.
    let preview = coll(data)
        .slice(0, 5)
        .join(" -> ")
        .expect("pipeline failed");
    println!("\nslice(0, 5) joined: {}", preview);
}
