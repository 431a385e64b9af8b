//! Path metadata builder: per-path tile-space bounding boxes, the contiguous per-path Tiles
//! allocation, and the parallel `PathStyles` fill-rule flags.

use crate::flatten::PathDef;
use crate::geometry::FillRule;
use crate::gpu_data::PathRecord;

/// Bit 1 set means even-odd; otherwise non-zero.
pub const STYLE_EVEN_ODD_BIT: u32 = 1 << 1;

/// The output of [`build_path_metadata`]: one record and one style word per path, plus the
/// exact size of the Tiles buffer they index into.
#[derive(Debug, Clone)]
pub struct PathMetadata {
    pub records: Vec<PathRecord>,
    pub styles: Vec<u32>,
    pub total_path_tiles: u32,
}

fn path_bbox_px(path: &PathDef) -> Option<(f32, f32, f32, f32)> {
    let mut iter = path.lines.iter();
    let first = iter.next()?;
    let (mut x0, mut y0) = (first.p0.x.min(first.p1.x), first.p0.y.min(first.p1.y));
    let (mut x1, mut y1) = (first.p0.x.max(first.p1.x), first.p0.y.max(first.p1.y));
    for line in iter {
        x0 = x0.min(line.p0.x).min(line.p1.x);
        y0 = y0.min(line.p0.y).min(line.p1.y);
        x1 = x1.max(line.p0.x).max(line.p1.x);
        y1 = y1.max(line.p0.y).max(line.p1.y);
    }
    Some((x0, y0, x1, y1))
}

/// Builds per-path metadata for one frame.
///
/// Bounding boxes are clamped to the canvas, converted to tile coordinates with
/// `floor(min/tile)`/`ceil(max/tile)`, then clamped again to the tile grid. A degenerate box
/// (`x0 >= x1` or `y0 >= y1` after clamping) contributes zero tiles.
pub fn build_path_metadata(
    paths: &[PathDef],
    canvas_width: u32,
    canvas_height: u32,
    tile_size: u32,
) -> PathMetadata {
    let width_in_tiles = canvas_width.div_ceil(tile_size) as i32;
    let height_in_tiles = canvas_height.div_ceil(tile_size) as i32;

    let mut records = Vec::with_capacity(paths.len());
    let mut styles = Vec::with_capacity(paths.len());
    let mut running_offset: u32 = 0;

    for path in paths {
        let bbox = path_bbox_px(path).map(|(x0, y0, x1, y1)| {
            let x0 = x0.max(0.0).min(canvas_width as f32);
            let y0 = y0.max(0.0).min(canvas_height as f32);
            let x1 = x1.max(0.0).min(canvas_width as f32);
            let y1 = y1.max(0.0).min(canvas_height as f32);
            (x0, y0, x1, y1)
        });

        let (mut tx0, mut ty0, mut tx1, mut ty1) = (0i32, 0i32, 0i32, 0i32);
        if let Some((x0, y0, x1, y1)) = bbox {
            tx0 = (x0 / tile_size as f32).floor() as i32;
            ty0 = (y0 / tile_size as f32).floor() as i32;
            tx1 = (x1 / tile_size as f32).ceil() as i32;
            ty1 = (y1 / tile_size as f32).ceil() as i32;

            tx0 = tx0.clamp(0, width_in_tiles);
            ty0 = ty0.clamp(0, height_in_tiles);
            tx1 = tx1.clamp(0, width_in_tiles);
            ty1 = ty1.clamp(0, height_in_tiles);

            if tx0 >= tx1 || ty0 >= ty1 {
                tx0 = 0;
                ty0 = 0;
                tx1 = 0;
                ty1 = 0;
            }
        }

        let record = PathRecord {
            x0: tx0,
            y0: ty0,
            x1: tx1,
            y1: ty1,
            tiles_offset: running_offset,
        };
        running_offset += record.tile_count();
        records.push(record);

        let mut style = 0u32;
        if path.fill_rule == FillRule::EvenOdd {
            style |= STYLE_EVEN_ODD_BIT;
        }
        styles.push(style);
    }

    PathMetadata {
        records,
        styles,
        total_path_tiles: running_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::flatten::flatten_path_default;
    use crate::geometry::{FillRule, Path, Point};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        let mut path = Path::new();
        path.move_to(Point::new(x0, y0));
        path.line_to(Point::new(x1, y0));
        path.line_to(Point::new(x1, y1));
        path.line_to(Point::new(x0, y1));
        path.close();
        path
    }

    #[test]
    fn tiles_offset_is_exclusive_prefix_sum_of_areas() {
        let defs = vec![
            flatten_path_default(&rect(0.0, 0.0, 16.0, 16.0), Color::BLACK, FillRule::NonZero),
            flatten_path_default(&rect(0.0, 0.0, 32.0, 48.0), Color::BLACK, FillRule::NonZero),
            flatten_path_default(&rect(0.0, 0.0, 16.0, 16.0), Color::BLACK, FillRule::NonZero),
        ];
        let meta = build_path_metadata(&defs, 256, 256, 16);

        let mut running = 0u32;
        for record in &meta.records {
            assert_eq!(record.tiles_offset, running);
            running += record.tile_count();
        }
        assert_eq!(running, meta.total_path_tiles);
    }

    #[test]
    fn empty_path_contributes_zero_tiles() {
        let mut degenerate = Path::new();
        degenerate.move_to(Point::new(5.0, 5.0));
        let defs = vec![flatten_path_default(
            &degenerate,
            Color::BLACK,
            FillRule::NonZero,
        )];
        let meta = build_path_metadata(&defs, 256, 256, 16);
        assert_eq!(meta.total_path_tiles, 0);
        assert_eq!(meta.records[0].tile_count(), 0);
    }

    #[test]
    fn out_of_canvas_path_clamps_to_degenerate_box() {
        let defs = vec![flatten_path_default(
            &rect(-500.0, -500.0, -400.0, -400.0),
            Color::BLACK,
            FillRule::NonZero,
        )];
        let meta = build_path_metadata(&defs, 256, 256, 16);
        assert_eq!(meta.total_path_tiles, 0);
    }

    #[test]
    fn even_odd_style_bit_is_set() {
        let defs = vec![flatten_path_default(
            &rect(0.0, 0.0, 16.0, 16.0),
            Color::BLACK,
            FillRule::EvenOdd,
        )];
        let meta = build_path_metadata(&defs, 256, 256, 16);
        assert_eq!(meta.styles[0] & STYLE_EVEN_ODD_BIT, STYLE_EVEN_ODD_BIT);
    }

    #[test]
    fn bounding_box_covers_all_lines() {
        let defs = vec![flatten_path_default(
            &rect(10.0, 20.0, 100.0, 40.0),
            Color::BLACK,
            FillRule::NonZero,
        )];
        let meta = build_path_metadata(&defs, 256, 256, 16);
        let rec = meta.records[0];
        // floor(10/16)=0, ceil(100/16)=7; floor(20/16)=1, ceil(40/16)=3
        assert_eq!((rec.x0, rec.x1), (0, 7));
        assert_eq!((rec.y0, rec.y1), (1, 3));
    }
}
