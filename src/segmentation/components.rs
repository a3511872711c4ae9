use std::collections::{BTreeMap, BTreeSet};

use super::ClassMap;

/// Number of outer regions per non-background label.
///
/// Regions are 8-connected. A region lying inside a hole of another region
/// of the same label is not counted, so each instance is one outer contour
/// of the class mask. Regions of other labels count as background here.
#[must_use]
pub fn count_components(map: &ClassMap) -> BTreeMap<u8, u64> {
    let present: BTreeSet<u8> = map.labels().iter().copied().filter(|&l| l != 0).collect();

    present
        .into_iter()
        .map(|label| (label, count_outer_regions(map, label)))
        .filter(|&(_, n)| n > 0)
        .collect()
}

fn count_outer_regions(map: &ClassMap, label: u8) -> u64 {
    let width = map.width() as usize;
    let height = map.height() as usize;
    let labels = map.labels();
    let outside = outside_background(map, label);

    let on_outer_edge = |idx: usize| {
        let (x, y) = (idx % width, idx / width);
        x == 0
            || y == 0
            || x + 1 == width
            || y + 1 == height
            || outside[idx - 1]
            || outside[idx + 1]
            || outside[idx - width]
            || outside[idx + width]
    };

    let mut visited = vec![false; labels.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut count = 0;

    for start in 0..labels.len() {
        if labels[start] != label || visited[start] {
            continue;
        }

        let mut outer = false;
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            outer = outer || on_outer_edge(idx);
            let (x, y) = (idx % width, idx / width);
            let x_range = x.saturating_sub(1)..=(x + 1).min(width - 1);
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x_range.clone() {
                    let n = ny * width + nx;
                    if !visited[n] && labels[n] == label {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        if outer {
            count += 1;
        }
    }

    count
}

/// Pixels not carrying `label` that the image border reaches through
/// 4-connected steps over other pixels not carrying `label`.
fn outside_background(map: &ClassMap, label: u8) -> Vec<bool> {
    let width = map.width() as usize;
    let height = map.height() as usize;
    let labels = map.labels();

    let mut outside = vec![false; labels.len()];
    let mut stack: Vec<usize> = (0..labels.len())
        .filter(|&idx| {
            let (x, y) = (idx % width, idx / width);
            (x == 0 || y == 0 || x + 1 == width || y + 1 == height) && labels[idx] != label
        })
        .collect();
    for &idx in &stack {
        outside[idx] = true;
    }

    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % width, idx / width);
        let neighbours = [
            if x > 0 { Some(idx - 1) } else { None },
            if x + 1 < width { Some(idx + 1) } else { None },
            if y > 0 { Some(idx - width) } else { None },
            if y + 1 < height { Some(idx + width) } else { None },
        ];
        for n in neighbours.into_iter().flatten() {
            if !outside[n] && labels[n] != label {
                outside[n] = true;
                stack.push(n);
            }
        }
    }

    outside
}
