use stridephys_geom::Aabb;

/// Broadphase candidate pairs by a single sweep-and-prune pass over X.
///
/// Boxes with a non-finite X interval are dropped before the sweep, so a
/// body that has gone degenerate cannot poison the pass. The output is
/// index-sorted, which keeps downstream contact solving deterministic.
pub fn pairs_sap(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
    let order = sweep_order(aabbs);

    let mut open: Vec<usize> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (lo, idx) in order {
        open.retain(|&other| aabbs[other].max.x >= lo);
        for &other in &open {
            let key = if other < idx { (other, idx) } else { (idx, other) };
            if aabbs[key.0].overlaps(&aabbs[key.1]) {
                pairs.push(key);
            }
        }
        open.push(idx);
    }

    pairs.sort_unstable();
    pairs
}

/// Finite X lower bounds, sorted with the box index as tie-break.
fn sweep_order(aabbs: &[Aabb]) -> Vec<(f32, usize)> {
    let mut order: Vec<(f32, usize)> = aabbs
        .iter()
        .enumerate()
        .filter_map(|(i, a)| {
            let (lo, hi) = (a.min.x, a.max.x);
            if !lo.is_finite() || !hi.is_finite() {
                return None;
            }
            Some((lo.min(hi), i))
        })
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_geom::Aabb;

    fn aabb(min: [f32; 3], max: [f32; 3]) -> Aabb {
        Aabb::new(min.into(), max.into())
    }

    #[test] fn overlapping_pair_found() {
        let boxes = [
            aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            aabb([0.5, 0.5, 0.5], [1.5, 1.5, 1.5]),
            aabb([5.0, 0.0, 0.0], [6.0, 1.0, 1.0]),
        ];
        assert_eq!(pairs_sap(&boxes), vec![(0, 1)]);
    }

    #[test] fn x_overlap_alone_is_not_a_pair() {
        let boxes = [
            aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            aabb([0.5, 5.0, 0.5], [1.5, 6.0, 1.5]),
        ];
        assert!(pairs_sap(&boxes).is_empty());
    }

    #[test] fn nan_boxes_skipped() {
        let boxes = [
            aabb([f32::NAN, 0.0, 0.0], [1.0, 1.0, 1.0]),
            aabb([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
        ];
        assert!(pairs_sap(&boxes).is_empty());
    }

    #[test] fn pair_order_is_stable() {
        let boxes = [
            aabb([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]),
            aabb([1.0, 0.0, 0.0], [3.0, 1.0, 1.0]),
            aabb([1.5, 0.0, 0.0], [2.5, 1.0, 1.0]),
        ];
        assert_eq!(pairs_sap(&boxes), vec![(0, 1), (0, 2), (1, 2)]);
    }
}
