use lidar_obstacles_cluster::{extract_clusters, fit_aabb, fit_oriented_box, ClusterParams};
use lidar_obstacles_core::{Point, PointSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn blobs(seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = PointSet::new();
    for _ in 0..12 {
        let center = [
            rng.random_range(-8.0..28.0),
            rng.random_range(-4.0..4.0),
            rng.random_range(-1.0..2.0),
        ];
        let count = rng.random_range(1..60);
        for _ in 0..count {
            set.push(Point::new(
                center[0] + rng.random_range(-0.6..0.6),
                center[1] + rng.random_range(-0.6..0.6),
                center[2] + rng.random_range(-0.6..0.6),
            ));
        }
    }
    set
}

/// Connected components of the "within tolerance" graph by exhaustive search.
fn brute_force_components(set: &PointSet, tolerance: f32) -> Vec<Vec<usize>> {
    let n = set.len();
    let mut label = vec![usize::MAX; n];
    let mut components = Vec::new();
    for seed in 0..n {
        if label[seed] != usize::MAX {
            continue;
        }
        let id = components.len();
        let mut members = vec![seed];
        label[seed] = id;
        let mut cursor = 0;
        while cursor < members.len() {
            let a = set[members[cursor]].position;
            cursor += 1;
            for (j, q) in set.iter().enumerate() {
                if label[j] == usize::MAX && (q.position - a).norm_squared() <= tolerance * tolerance {
                    label[j] = id;
                    members.push(j);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

#[test]
fn clusters_match_exhaustive_components() {
    for seed in 0..5 {
        let set = blobs(seed);
        let params = ClusterParams {
            tolerance: 0.4,
            min_size: 5,
            max_size: 80,
        };
        let got: Vec<Vec<usize>> = extract_clusters(&set, &params)
            .expect("cluster")
            .into_iter()
            .map(|c| c.indices().to_vec())
            .collect();
        let expected: Vec<Vec<usize>> = brute_force_components(&set, params.tolerance)
            .into_iter()
            .filter(|c| params.accepts(c.len()))
            .collect();
        assert_eq!(got, expected, "seed {seed}");
    }
}

#[test]
fn clusters_are_disjoint_in_range_and_within_size_bounds() {
    let set = blobs(99);
    let params = ClusterParams {
        tolerance: 0.5,
        min_size: 10,
        max_size: 50,
    };
    let clusters = extract_clusters(&set, &params).expect("cluster");
    assert!(!clusters.is_empty());

    let mut owner = vec![None; set.len()];
    for (ci, cluster) in clusters.iter().enumerate() {
        assert!(params.accepts(cluster.len()));
        assert!(cluster.indices().windows(2).all(|w| w[0] < w[1]));
        for &i in cluster.indices() {
            assert!(i < set.len());
            assert_eq!(owner[i], None, "point {i} in two clusters");
            owner[i] = Some(ci);
        }
    }
}

#[test]
fn boxes_contain_their_clusters() {
    let set = blobs(3);
    let clusters = extract_clusters(
        &set,
        &ClusterParams {
            tolerance: 0.5,
            min_size: 3,
            max_size: 1000,
        },
    )
    .expect("cluster");

    for cluster in &clusters {
        let aabb = fit_aabb(&set, cluster).expect("aabb");
        let obb = fit_oriented_box(&set, cluster).expect("obb");
        for p in cluster.points(&set) {
            assert!(aabb.contains(&p.position));
            assert!(obb.contains(&p.position, 1e-4));
        }
        // Tight: every face of the axis-aligned box touches a member.
        for axis in 0..3 {
            assert!(cluster.points(&set).any(|p| p.position[axis] == aabb.min[axis]));
            assert!(cluster.points(&set).any(|p| p.position[axis] == aabb.max[axis]));
        }
    }
}
