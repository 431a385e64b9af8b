//! Scene encoding & packing: serializes a frame's flattened paths into one contiguous byte
//! buffer subdivided into six word-aligned sections, plus a [`SceneLayout`] describing where
//! each section starts.
//!
//! Path tags and path data mirror the *original* per-path element stream (one tag per path
//! element, variable-width coordinate data per tag) rather than the already-flattened line soup:
//! the line soup is uploaded separately as `Lines`, and the path-tag section exists so
//! `pathtag_reduce`/`pathtag_scan` have a real two-level prefix sum to perform, per the
//! algorithmic contract in the compute-stage spec. This is a deliberate normalization of an
//! ambiguity in upstream tile-based renderers, where color premultiplication happens
//! inconsistently across the pipeline: here `PathDef` always holds straight alpha and the scene
//! buffer always holds premultiplied.

use crate::config::DRAW_TAG_COLOR_FILL;
use crate::flatten::PathDef;
use crate::geometry::PathElement;

/// Path-tag constants: one byte-sized tag per original path element, stored one per GPU word.
pub const TAG_MOVE_TO: u32 = 1;
pub const TAG_LINE_TO: u32 = 2;
pub const TAG_QUAD_TO: u32 = 3;
pub const TAG_CUBIC_TO: u32 = 4;
pub const TAG_CLOSE: u32 = 5;

/// Base offsets (in 32-bit words) of each of the six scene sections, plus counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneLayout {
    pub path_tag_base: u32,
    pub path_data_base: u32,
    pub draw_tag_base: u32,
    pub draw_data_base: u32,
    pub transform_base: u32,
    pub style_base: u32,
    pub num_draw_objects: u32,
    pub num_paths: u32,
    pub num_clips: u32,
}

/// The packed scene: one contiguous byte buffer plus its section layout.
#[derive(Debug, Clone)]
pub struct PackedScene {
    pub data: Vec<u8>,
    pub layout: SceneLayout,
}

fn tag_word_count(element: &PathElement) -> u32 {
    match element {
        PathElement::MoveTo(_) | PathElement::LineTo(_) => 2,
        PathElement::QuadTo(_, _) => 4,
        PathElement::CubicTo(_, _, _) => 6,
        PathElement::Close => 0,
    }
}

fn tag_value(element: &PathElement) -> u32 {
    match element {
        PathElement::MoveTo(_) => TAG_MOVE_TO,
        PathElement::LineTo(_) => TAG_LINE_TO,
        PathElement::QuadTo(_, _) => TAG_QUAD_TO,
        PathElement::CubicTo(_, _, _) => TAG_CUBIC_TO,
        PathElement::Close => TAG_CLOSE,
    }
}

fn push_element_data(out: &mut Vec<u32>, element: &PathElement) {
    let push_point = |out: &mut Vec<u32>, x: f64, y: f64| {
        out.push((x as f32).to_bits());
        out.push((y as f32).to_bits());
    };
    match element {
        PathElement::MoveTo(p) | PathElement::LineTo(p) => push_point(out, p.x, p.y),
        PathElement::QuadTo(c, p) => {
            push_point(out, c.x, c.y);
            push_point(out, p.x, p.y);
        }
        PathElement::CubicTo(c1, c2, p) => {
            push_point(out, c1.x, c1.y);
            push_point(out, c2.x, c2.y);
            push_point(out, p.x, p.y);
        }
        PathElement::Close => {}
    }
}

/// Packs one frame's original path element streams plus their paints into the six-section
/// scene buffer. `original_elements` must have the same length and ordering as `paths`: each
/// entry is the pre-flatten element stream for the path at that index (used only to populate
/// the path-tag/path-data sections; the draw data always comes from `paths[i].color`).
///
/// The implicit identity affine transform occupies the single transform slot.
pub fn pack_scene(paths: &[PathDef], original_elements: &[Vec<PathElement>]) -> PackedScene {
    debug_assert_eq!(paths.len(), original_elements.len());

    let mut path_tags: Vec<u32> = Vec::new();
    let mut path_data: Vec<u32> = Vec::new();
    for elements in original_elements {
        for element in elements {
            path_tags.push(tag_value(element));
            push_element_data(&mut path_data, element);
        }
        let _ = tag_word_count; // documents the data/tag relationship used above
    }

    let mut draw_tags: Vec<u32> = Vec::with_capacity(paths.len());
    let mut draw_data: Vec<u32> = Vec::with_capacity(paths.len());
    for path in paths {
        draw_tags.push(DRAW_TAG_COLOR_FILL);
        draw_data.push(path.color.premultiply_to_u32());
    }

    // A single implicit identity affine transform: [a, b, c, d, e, f] with (a,b,c,d) the 2x2
    // linear part and (e,f) the translation, i.e. [1, 0, 0, 1, 0, 0].
    let transforms: Vec<u32> = vec![1.0f32.to_bits(), 0, 0, 1.0f32.to_bits(), 0, 0];

    // Reserved: fill rule lives in the parallel PathStyles buffer, not here.
    let styles: Vec<u32> = vec![0; paths.len()];

    let path_tag_base = 0u32;
    let path_data_base = path_tag_base + path_tags.len() as u32;
    let draw_tag_base = path_data_base + path_data.len() as u32;
    let draw_data_base = draw_tag_base + draw_tags.len() as u32;
    let transform_base = draw_data_base + draw_data.len() as u32;
    let style_base = transform_base + transforms.len() as u32;

    let mut data: Vec<u8> = Vec::with_capacity(
        (style_base as usize + styles.len()) * std::mem::size_of::<u32>(),
    );
    for section in [&path_tags, &path_data, &draw_tags, &draw_data, &transforms, &styles] {
        for word in section {
            data.extend_from_slice(&word.to_le_bytes());
        }
    }

    let layout = SceneLayout {
        path_tag_base,
        path_data_base,
        draw_tag_base,
        draw_data_base,
        transform_base,
        style_base,
        num_draw_objects: paths.len() as u32,
        num_paths: paths.len() as u32,
        num_clips: 0,
    };

    PackedScene { data, layout }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::flatten::flatten_path_default;
    use crate::geometry::{FillRule, Path, Point};

    fn rect_path() -> Path {
        let mut path = Path::new();
        path.move_to(Point::new(50.0, 50.0));
        path.line_to(Point::new(150.0, 50.0));
        path.line_to(Point::new(150.0, 150.0));
        path.line_to(Point::new(50.0, 150.0));
        path.close();
        path
    }

    #[test]
    fn offsets_are_word_aligned_and_monotonic() {
        let path = rect_path();
        let def = flatten_path_default(&path, Color::rgb(255, 0, 0), FillRule::NonZero);
        let scene = pack_scene(&[def], &[path.elements.clone()]);
        let layout = scene.layout;

        assert!(layout.path_tag_base <= layout.path_data_base);
        assert!(layout.path_data_base <= layout.draw_tag_base);
        assert!(layout.draw_tag_base <= layout.draw_data_base);
        assert!(layout.draw_data_base <= layout.transform_base);
        assert!(layout.transform_base <= layout.style_base);
        assert_eq!(scene.data.len() % 4, 0);
    }

    #[test]
    fn one_draw_object_per_path() {
        let path = rect_path();
        let def = flatten_path_default(&path, Color::rgb(0, 255, 0), FillRule::NonZero);
        let scene = pack_scene(&[def], &[path.elements.clone()]);
        assert_eq!(scene.layout.num_draw_objects, 1);
        assert_eq!(scene.layout.num_paths, 1);

        let draw_tag_word_offset = scene.layout.draw_tag_base as usize * 4;
        let tag_bytes = &scene.data[draw_tag_word_offset..draw_tag_word_offset + 4];
        let tag = u32::from_le_bytes(tag_bytes.try_into().unwrap());
        assert_eq!(tag, DRAW_TAG_COLOR_FILL);
    }

    #[test]
    fn draw_data_holds_premultiplied_color() {
        let path = rect_path();
        let color = Color::rgba(200, 100, 50, 128);
        let def = flatten_path_default(&path, color, FillRule::NonZero);
        let scene = pack_scene(&[def], &[path.elements.clone()]);

        let draw_data_word_offset = scene.layout.draw_data_base as usize * 4;
        let bytes = &scene.data[draw_data_word_offset..draw_data_word_offset + 4];
        let packed = u32::from_le_bytes(bytes.try_into().unwrap());
        assert_eq!(packed, color.premultiply_to_u32());
    }
}
