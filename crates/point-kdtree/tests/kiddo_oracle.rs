use kiddo::{KdTree as KiddoTree, SquaredEuclidean};
use point_kdtree::{KdTree, KdTreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn lidar_like_scan(n: usize, seed: u64) -> Vec<[f32; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            // Mostly ground returns with a few elevated blobs, like a road scene.
            if i % 5 == 0 {
                [
                    rng.random_range(5.0..8.0),
                    rng.random_range(-2.0..2.0),
                    rng.random_range(0.0..1.5),
                ]
            } else {
                [
                    rng.random_range(-10.0..30.0),
                    rng.random_range(-5.0..5.0),
                    rng.random_range(-1.6..-1.4),
                ]
            }
        })
        .collect()
}

fn assert_same_neighbours(tree: &KdTree, oracle: &KiddoTree<f32, 3>, q: [f32; 3], radius: f32) {
    let mut ours = tree.radius_search(q, radius);
    ours.sort_unstable();

    let mut expected: Vec<usize> = oracle
        .within_unsorted::<SquaredEuclidean>(&q, radius * radius)
        .into_iter()
        .map(|nn| nn.item as usize)
        .collect();
    expected.sort_unstable();

    assert_eq!(ours, expected, "query {q:?} radius {radius}");
}

#[test]
fn agrees_with_kiddo_on_road_scene() {
    let points = lidar_like_scan(10_000, 42);
    let tree = KdTree::build(&points).expect("build");
    let oracle: KiddoTree<f32, 3> = (&points).into();

    for (i, q) in points.iter().step_by(97).enumerate() {
        let radius = [0.2_f32, 0.5, 1.0, 2.0][i % 4];
        assert_same_neighbours(&tree, &oracle, *q, radius);
    }
}

#[test]
fn bucket_size_does_not_change_results() {
    let points = lidar_like_scan(3_000, 9);
    let oracle: KiddoTree<f32, 3> = (&points).into();

    for bucket_size in [1, 4, 64, 4_096] {
        let tree = KdTree::build_with(&points, KdTreeParams { bucket_size }).expect("build");
        for q in points.iter().step_by(301) {
            assert_same_neighbours(&tree, &oracle, *q, 0.75);
        }
    }
}
