//! GPU-facing data layouts: the plain-old-data structs uploaded to and read back from device
//! buffers, plus the tagged representations the design notes call for in place of pointer
//! punning (an explicit `Command` enum for PTCL words, an explicit `TileEntry` for the
//! count-vs-index-vs-inverted overload of a tile's second word).

use bytemuck::{Pod, Zeroable};

/// One line segment as the GPU sees it: a path index plus two endpoints.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LineGpu {
    pub path_ix: u32,
    pub p0x: f32,
    pub p0y: f32,
    pub p1x: f32,
    pub p1y: f32,
}

/// Five 32-bit words per path: tile-space bounding box plus the start of this path's slice of
/// the global Tiles array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PathRecord {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub tiles_offset: u32,
}

impl PathRecord {
    pub fn width_tiles(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    pub fn height_tiles(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    pub fn tile_count(&self) -> u32 {
        (self.width_tiles() as u32) * (self.height_tiles() as u32)
    }
}

/// A per-draw record produced by `draw_leaf`: which path the k-th draw object refers to, and
/// where its data lives in the scene buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DrawMonoid {
    pub path_ix: u32,
    pub clip_ix: u32,
    pub scene_offset: u32,
    pub info_offset: u32,
}

/// Scratch counters bump-allocated during the compute pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, Default)]
pub struct BumpAlloc {
    pub seg_counts: u32,
    pub segments_allocated: u32,
    pub dbg_active_threads: u32,
    /// Bumped by `coarse` whenever a tile's command list would overflow `PTCL_MAX_PER_TILE`;
    /// such tiles render whatever commands fit, per the non-fatal overflow contract.
    pub ptcl_overflow_count: u32,
}

/// A tile-local line segment as `coarse` hands it to `fine`: endpoints translated into the
/// tile's own 0..TILE_SIZE coordinate space, with `y_edge` preserved unchanged from the source
/// line's vertical delta so `fine` can read off both its extent and winding direction (the sign)
/// without recomputing anything.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Segment {
    pub p0x: f32,
    pub p0y: f32,
    pub p1x: f32,
    pub p1y: f32,
    pub y_edge: f32,
}

/// The uniform configuration header uploaded once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VelloComputeConfig {
    pub width_in_tiles: u32,
    pub height_in_tiles: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub num_draw_obj: u32,
    pub num_paths: u32,
    pub num_clips: u32,
    pub path_tag_base: u32,
    pub path_data_base: u32,
    pub draw_tag_base: u32,
    pub draw_data_base: u32,
    pub transform_base: u32,
    pub style_base: u32,
    pub num_lines: u32,
    pub bg_color: u32,
}

// ---------------------------------------------------------------------------
// PTCL commands
// ---------------------------------------------------------------------------

pub const CMD_END: u32 = 0;
pub const CMD_FILL: u32 = 1;
pub const CMD_SOLID: u32 = 3;
pub const CMD_COLOR: u32 = 5;

/// A decoded PTCL command, used by diagnostics and tests rather than by the kernels themselves
/// (which only ever see raw words).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    End,
    Fill {
        seg_count: u32,
        even_odd: bool,
        seg_start_index: u32,
        backdrop: i32,
    },
    Solid,
    Color(u32),
}

impl Command {
    /// Encodes the command's header word plus any payload words that follow it, appended in
    /// order onto `out`.
    pub fn encode(&self, out: &mut Vec<u32>) {
        match *self {
            Command::End => out.push(CMD_END),
            Command::Fill {
                seg_count,
                even_odd,
                seg_start_index,
                backdrop,
            } => {
                out.push(CMD_FILL);
                out.push((seg_count << 1) | (even_odd as u32));
                out.push(seg_start_index);
                out.push(backdrop as u32);
            }
            Command::Solid => out.push(CMD_SOLID),
            Command::Color(rgba) => {
                out.push(CMD_COLOR);
                out.push(rgba);
            }
        }
    }

    /// Decodes one command starting at `words[pos]`, returning it and the index just past it.
    /// Returns `None` if `pos` is out of range or the stream is malformed.
    pub fn decode(words: &[u32], pos: usize) -> Option<(Command, usize)> {
        let tag = *words.get(pos)?;
        match tag {
            CMD_END => Some((Command::End, pos + 1)),
            CMD_FILL => {
                let packed = *words.get(pos + 1)?;
                let seg_start_index = *words.get(pos + 2)?;
                let backdrop = *words.get(pos + 3)? as i32;
                Some((
                    Command::Fill {
                        seg_count: packed >> 1,
                        even_odd: (packed & 1) != 0,
                        seg_start_index,
                        backdrop,
                    },
                    pos + 4,
                ))
            }
            CMD_SOLID => Some((Command::Solid, pos + 1)),
            CMD_COLOR => {
                let rgba = *words.get(pos + 1)?;
                Some((Command::Color(rgba), pos + 2))
            }
            _ => None,
        }
    }

    /// Decodes an entire PTCL stream until `CMD_END` or the words run out.
    pub fn decode_stream(words: &[u32]) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut pos = 0;
        while pos < words.len() {
            match Self::decode(words, pos) {
                Some((Command::End, _)) => {
                    commands.push(Command::End);
                    break;
                }
                Some((cmd, next)) => {
                    commands.push(cmd);
                    pos = next;
                }
                None => break,
            }
        }
        commands
    }
}

/// Interprets a tile's second word, whose meaning depends on which stage last wrote it: a
/// segment count before `coarse`, a segment-slice start index after, or "fully covered, no
/// segments" via the sign bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSegField {
    Count(u32),
    SegIndex(u32),
    Inverted,
}

/// The two-word tile record: signed backdrop plus the tagged count/index/inverted field above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEntry {
    pub backdrop: i32,
    pub seg: TileSegField,
}

const INVERTED_BIT: u32 = 1 << 31;

impl TileEntry {
    /// Decodes a tile word as it reads between `path_count`/`backdrop` and `coarse`: the sign
    /// bit marks "inverted" (fully covered, no segments), otherwise the word is a segment count.
    pub fn decode_pre_coarse(backdrop: i32, raw: u32) -> Self {
        let seg = if raw & INVERTED_BIT != 0 {
            TileSegField::Inverted
        } else {
            TileSegField::Count(raw)
        };
        Self { backdrop, seg }
    }

    /// Decodes a tile word as `coarse` leaves it: a segment-slice start index into `Segments`.
    pub fn decode_post_coarse(backdrop: i32, raw: u32) -> Self {
        Self {
            backdrop,
            seg: TileSegField::SegIndex(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_command_round_trips() {
        let cmd = Command::Fill {
            seg_count: 7,
            even_odd: true,
            seg_start_index: 42,
            backdrop: -3,
        };
        let mut words = Vec::new();
        cmd.encode(&mut words);
        let (decoded, next) = Command::decode(&words, 0).unwrap();
        assert_eq!(decoded, cmd);
        assert_eq!(next, words.len());
    }

    #[test]
    fn decode_stream_stops_at_end() {
        let mut words = Vec::new();
        Command::Solid.encode(&mut words);
        Command::Color(0xff00ff00).encode(&mut words);
        Command::End.encode(&mut words);
        // Trailing garbage past CMD_END must be ignored.
        words.push(0xdead_beef);

        let commands = Command::decode_stream(&words);
        assert_eq!(
            commands,
            vec![Command::Solid, Command::Color(0xff00ff00), Command::End]
        );
    }

    #[test]
    fn tile_entry_inverted_bit_round_trips() {
        let entry = TileEntry::decode_pre_coarse(5, INVERTED_BIT);
        assert_eq!(entry.seg, TileSegField::Inverted);
        let entry = TileEntry::decode_pre_coarse(5, 12);
        assert_eq!(entry.seg, TileSegField::Count(12));
    }

    #[test]
    fn path_record_tile_count_matches_bbox_area() {
        let rec = PathRecord {
            x0: 2,
            y0: 3,
            x1: 5,
            y1: 4,
            tiles_offset: 10,
        };
        assert_eq!(rec.tile_count(), 3);
    }
}
