//! Raster-to-vector conversion of flood masks
//!
//! Regions are labeled with 4-connectivity. Each region's boundary is the
//! set of pixel sides that face a cell outside the region; the sides are
//! chained into closed rings in corner (x = col, y = row) space, collinear
//! corners are dropped and the rings are mapped through the geotransform.
//!
//! Orientation: with the region on the right when walking in image space,
//! exterior rings come out counter-clockwise in lon/lat and holes clockwise.

use std::collections::{HashMap, VecDeque};

use geo_types::{Coord, Geometry, LineString, Polygon};
use ndarray::Array2;
use tracing::debug;

use floodsar_core::vector::Properties;
use floodsar_core::{Algorithm, BoundingBox, Error, Feature, FeatureCollection, GeoTransform, Mask, Result};

/// Pixel corner `(x, y)` = `(col, row)`
type Vertex = (usize, usize);

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
}

impl Edge {
    fn direction(&self) -> (isize, isize) {
        direction(self.from, self.to)
    }
}

fn direction(a: Vertex, b: Vertex) -> (isize, isize) {
    (
        (b.0 as isize - a.0 as isize).signum(),
        (b.1 as isize - a.1 as isize).signum(),
    )
}

/// Mask to polygon features
#[derive(Debug, Clone, Default)]
pub struct VectorExporter;

impl Algorithm for VectorExporter {
    type Input = Mask;
    type Output = FeatureCollection;
    type Params = Properties;
    type Error = Error;

    fn name(&self) -> &'static str {
        "VectorExporter"
    }

    fn description(&self) -> &'static str {
        "Polygonize 4-connected mask regions into features"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(export_features(&input, &params))
    }
}

/// Label 4-connected `true` regions.
///
/// Labels run `1..=count` in row-major order of each region's first cell;
/// background is 0.
pub fn label_regions(mask: &Mask) -> (Array2<u32>, usize) {
    let (rows, cols) = mask.shape();
    let src = mask.data();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut count = 0u32;
    let mut queue = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            if !src[(row, col)] || labels[(row, col)] != 0 {
                continue;
            }
            count += 1;
            labels[(row, col)] = count;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                let neighbors = [
                    (r.wrapping_sub(1), c),
                    (r + 1, c),
                    (r, c.wrapping_sub(1)),
                    (r, c + 1),
                ];
                for (nr, nc) in neighbors {
                    if nr < rows && nc < cols && src[(nr, nc)] && labels[(nr, nc)] == 0 {
                        labels[(nr, nc)] = count;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }

    (labels, count as usize)
}

/// Polygons of every region, georeferenced by the mask's own transform.
pub fn polygonize(mask: &Mask) -> Vec<Polygon<f64>> {
    polygonize_with_transform(mask, mask.transform())
}

fn polygonize_with_transform(mask: &Mask, transform: &GeoTransform) -> Vec<Polygon<f64>> {
    if mask.is_empty() {
        return Vec::new();
    }

    let (labels, count) = label_regions(mask);
    let mut cells: Vec<Vec<(usize, usize)>> = vec![Vec::new(); count];
    for ((row, col), &label) in labels.indexed_iter() {
        if label > 0 {
            cells[label as usize - 1].push((row, col));
        }
    }

    cells
        .iter()
        .enumerate()
        .filter_map(|(i, region)| {
            let rings = trace_rings(region, &labels, i as u32 + 1);
            build_polygon(rings, transform)
        })
        .collect()
}

/// Boundary sides of one region, region on the right in image space.
fn boundary_edges(region: &[(usize, usize)], labels: &Array2<u32>, label: u32) -> Vec<Edge> {
    let (rows, cols) = labels.dim();
    let outside = |r: Option<usize>, c: Option<usize>| match (r, c) {
        (Some(r), Some(c)) if r < rows && c < cols => labels[(r, c)] != label,
        _ => true,
    };

    let mut edges = Vec::with_capacity(region.len() * 2);
    for &(r, c) in region {
        if outside(r.checked_sub(1), Some(c)) {
            edges.push(Edge { from: (c, r), to: (c + 1, r) });
        }
        if outside(Some(r), Some(c + 1)) {
            edges.push(Edge { from: (c + 1, r), to: (c + 1, r + 1) });
        }
        if outside(Some(r + 1), Some(c)) {
            edges.push(Edge { from: (c + 1, r + 1), to: (c, r + 1) });
        }
        if outside(Some(r), c.checked_sub(1)) {
            edges.push(Edge { from: (c, r + 1), to: (c, r) });
        }
    }
    edges
}

/// Chain boundary sides into closed rings (open form, no repeated start).
///
/// A corner shared by two diagonal cells of the same region has two
/// outgoing sides; taking the right turn keeps diagonal-only neighbors
/// apart, matching 4-connectivity.
fn trace_rings(region: &[(usize, usize)], labels: &Array2<u32>, label: u32) -> Vec<Vec<Vertex>> {
    let edges = boundary_edges(region, labels, label);
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut ring = vec![edges[start].from];
        let mut current = start;

        loop {
            let at = edges[current].to;
            let Some(candidates) = outgoing.get(&at) else {
                break;
            };
            let (dx, dy) = edges[current].direction();
            let right = (-dy, dx);
            let next = match candidates.as_slice() {
                [only] => *only,
                many => many
                    .iter()
                    .copied()
                    .find(|&e| edges[e].direction() == right)
                    .unwrap_or(many[0]),
            };
            if next == start || used[next] {
                break;
            }
            ring.push(at);
            used[next] = true;
            current = next;
        }

        rings.push(drop_collinear(&ring));
    }
    rings
}

fn drop_collinear(ring: &[Vertex]) -> Vec<Vertex> {
    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            direction(prev, ring[i]) != direction(ring[i], next)
        })
        .map(|i| ring[i])
        .collect()
}

/// Shoelace area in image space; positive for exterior rings.
fn signed_area(ring: &[Vertex]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % n];
            x0 as f64 * y1 as f64 - x1 as f64 * y0 as f64
        })
        .sum::<f64>()
        / 2.0
}

fn build_polygon(rings: Vec<Vec<Vertex>>, transform: &GeoTransform) -> Option<Polygon<f64>> {
    let mut rings: Vec<(f64, Vec<Vertex>)> = rings
        .into_iter()
        .filter(|r| r.len() >= 4)
        .map(|r| (signed_area(&r), r))
        .collect();
    let exterior_idx = rings
        .iter()
        .enumerate()
        .max_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
        .map(|(i, _)| i)?;
    let (_, exterior) = rings.swap_remove(exterior_idx);

    let to_line = |ring: &[Vertex]| {
        let mut coords: Vec<Coord<f64>> = ring
            .iter()
            .map(|&(x, y)| {
                let (gx, gy) = transform.pixel_to_geo_corner(x, y);
                Coord { x: gx, y: gy }
            })
            .collect();
        coords.push(coords[0]);
        LineString::new(coords)
    };

    let interiors = rings.iter().map(|(_, r)| to_line(r)).collect();
    Some(Polygon::new(to_line(&exterior), interiors))
}

/// Features for every region of `mask`, each carrying a copy of `properties`.
pub fn export_features(mask: &Mask, properties: &Properties) -> FeatureCollection {
    collect_features(polygonize(mask), properties)
}

/// Like [`export_features`] but georeferenced over an explicit `bbox`.
///
/// A degenerate bbox yields an empty collection.
pub fn export_features_with_bbox(mask: &Mask, bbox: &BoundingBox, properties: &Properties) -> FeatureCollection {
    if bbox.is_degenerate() {
        debug!(?bbox, "degenerate bbox, no features exported");
        return FeatureCollection::new();
    }
    let transform = bbox.transform(mask.cols(), mask.rows());
    collect_features(polygonize_with_transform(mask, &transform), properties)
}

fn collect_features(polygons: Vec<Polygon<f64>>, properties: &Properties) -> FeatureCollection {
    let mut fc = FeatureCollection::new();
    for polygon in polygons {
        fc.push(Feature::with_properties(Geometry::Polygon(polygon), properties.clone()));
    }
    debug!(features = fc.len(), "mask polygonized");
    fc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;

    fn unit_mask(rows: usize, cols: usize) -> Mask {
        Mask::new(rows, cols).with_bbox(BoundingBox::new(0.0, 0.0, cols as f64, rows as f64))
    }

    #[test]
    fn test_single_block() {
        let mut mask = unit_mask(10, 10);
        mask.fill_rect(2..5, 3..7);
        let polys = polygonize(&mask);

        assert_eq!(polys.len(), 1);
        // four corners plus the closing coordinate
        assert_eq!(polys[0].exterior().0.len(), 5);
        assert!(polys[0].interiors().is_empty());
        assert_relative_eq!(polys[0].signed_area(), 12.0);
    }

    #[test]
    fn test_exterior_is_counter_clockwise() {
        let mut mask = unit_mask(4, 4);
        mask.set(1, 1, true).unwrap();
        let polys = polygonize(&mask);
        assert!(polys[0].signed_area() > 0.0);
    }

    #[test]
    fn test_hole_becomes_interior_ring() {
        let mut mask = unit_mask(7, 7);
        mask.fill_rect(1..6, 1..6);
        mask.set(3, 3, false).unwrap();
        let polys = polygonize(&mask);

        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 1);
        assert_relative_eq!(polys[0].unsigned_area(), 24.0);
    }

    #[test]
    fn test_diagonal_cells_are_separate_regions() {
        let mut mask = unit_mask(4, 4);
        mask.set(1, 1, true).unwrap();
        mask.set(2, 2, true).unwrap();
        let (_, count) = label_regions(&mask);
        assert_eq!(count, 2);
        assert_eq!(polygonize(&mask).len(), 2);
    }

    #[test]
    fn test_pinched_region_keeps_area() {
        // (1,2) and (2,3) meet only at a corner; (2,2) is a notch open to
        // the outside through that corner
        let mut mask = unit_mask(5, 5);
        mask.fill_rect(1..4, 1..4);
        mask.set(2, 2, false).unwrap();
        mask.set(1, 3, false).unwrap();
        let polys = polygonize(&mask);
        assert_eq!(polys.len(), 1);
        assert_relative_eq!(polys[0].unsigned_area(), 7.0);
    }

    #[test]
    fn test_georeferencing() {
        let mut mask = Mask::new(10, 10).with_bbox(BoundingBox::new(17.0, 51.0, 18.0, 52.0));
        mask.set(0, 0, true).unwrap();
        let polys = polygonize(&mask);
        let xs: Vec<f64> = polys[0].exterior().coords().map(|c| c.x).collect();
        let ys: Vec<f64> = polys[0].exterior().coords().map(|c| c.y).collect();
        assert_relative_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 17.0);
        assert_relative_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 17.1, epsilon = 1e-12);
        assert_relative_eq!(ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 52.0);
        assert_relative_eq!(ys.iter().cloned().fold(f64::INFINITY, f64::min), 51.9, epsilon = 1e-12);
    }

    #[test]
    fn test_export_copies_properties() {
        let mut mask = unit_mask(6, 6);
        mask.fill_rect(0..2, 0..2);
        mask.fill_rect(4..6, 4..6);
        let mut props = Properties::new();
        props.insert("status".into(), "current".into());

        let fc = VectorExporter.execute(mask, props).unwrap();
        assert_eq!(fc.len(), 2);
        assert!(fc.iter().all(|f| f.get_property("status").and_then(|v| v.as_str()) == Some("current")));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(export_features(&Mask::new(0, 0), &Properties::new()).is_empty());
        assert!(export_features(&unit_mask(5, 5), &Properties::new()).is_empty());

        let mut mask = unit_mask(3, 3);
        mask.set(1, 1, true).unwrap();
        let flat = BoundingBox::new(1.0, 1.0, 1.0, 2.0);
        assert!(export_features_with_bbox(&mask, &flat, &Properties::new()).is_empty());
    }
}
