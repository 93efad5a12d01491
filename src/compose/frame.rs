//! Single-cell frame composition
//!
//! Draws one (column, row) cell of the target grid by sampling every layer's
//! source sheet back-to-front. The row-fallback rule that aligns sheets with
//! differing animation coverage lives here, in one place, and is applied
//! identically to every layer.

use crate::assets::RasterSheet;
use crate::avatar::layers::{Layer, Tint};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use tracing::debug;

/// First rows of the run, idle and sit four-row blocks; walk starts at 0.
const RUN_BLOCK: u32 = 4;
const IDLE_BLOCK: u32 = 8;
const SIT_BLOCK: u32 = 12;

/// A layer paired with its fetched sheet, ready to draw.
#[derive(Debug, Clone)]
pub(crate) struct PreparedLayer {
    pub layer: Layer,
    pub sheet: Arc<RasterSheet>,
}

/// Frames actually authored for the row's animation block. Cells beyond the
/// clip length stay transparent.
pub(crate) fn row_frame_count(row: u32) -> u32 {
    match row {
        r if r < RUN_BLOCK => 9,  // walk
        r if r < IDLE_BLOCK => 8, // run
        r if r < SIT_BLOCK => 2,  // idle
        _ => 3,                   // sit
    }
}

/// Walk-cycle row for the same facing direction as `row`.
fn walk_fallback_row(row: u32) -> u32 {
    match row {
        r if r < RUN_BLOCK => r,
        r if r < IDLE_BLOCK => r - RUN_BLOCK,
        r if r < SIT_BLOCK => r - IDLE_BLOCK,
        r => r - SIT_BLOCK,
    }
}

/// Source row a layer actually samples for a requested target row.
///
/// A sheet samples its native row when it has one, otherwise the walk
/// fallback for the same direction. Sit rows are the exception: every layer
/// falls back to its walk row even when a native sit row exists, so layers
/// with and without sit poses stay aligned.
pub(crate) fn effective_source_row(requested: u32, sheet_rows: u32) -> u32 {
    if requested >= SIT_BLOCK {
        return walk_fallback_row(requested);
    }
    if requested < sheet_rows {
        requested
    } else {
        walk_fallback_row(requested)
    }
}

/// Composite every layer's frame for one grid cell into `target`.
///
/// `scratch` must be a `frame_size` square buffer; tinted frames are staged
/// there so the multiply never touches the main sheet's alpha.
pub(crate) fn draw_cell(
    target: &mut RgbaImage,
    prepared: &[PreparedLayer],
    col: u32,
    row: u32,
    frame_size: u32,
    scratch: &mut RgbaImage,
) {
    let dest_x = col * frame_size;
    let dest_y = row * frame_size;

    for entry in prepared {
        let sheet = entry.sheet.as_ref();
        if !sheet.has_column(col) {
            debug!(
                identity = %entry.layer.identity,
                col,
                cols = sheet.cols,
                "layer sheet lacks column, cell skipped"
            );
            continue;
        }
        let src_row = effective_source_row(row, sheet.rows);
        if src_row >= sheet.rows {
            debug!(
                identity = %entry.layer.identity,
                row,
                rows = sheet.rows,
                "layer sheet lacks walk fallback row, cell skipped"
            );
            continue;
        }
        let src_x = col * frame_size;
        let src_y = src_row * frame_size;

        match entry.layer.tint {
            None => blit_region(
                target,
                dest_x,
                dest_y,
                &sheet.image,
                src_x,
                src_y,
                frame_size,
            ),
            Some(tint) => {
                stage_tinted_frame(scratch, &sheet.image, src_x, src_y, frame_size, tint);
                blit_region(target, dest_x, dest_y, scratch, 0, 0, frame_size);
            }
        }
    }
}

/// Source-over blit of a square region; later calls occlude earlier ones.
fn blit_region(
    target: &mut RgbaImage,
    dest_x: u32,
    dest_y: u32,
    source: &RgbaImage,
    src_x: u32,
    src_y: u32,
    size: u32,
) {
    for y in 0..size {
        for x in 0..size {
            let src = source.get_pixel(src_x + x, src_y + y);
            if src[3] == 0 {
                continue;
            }
            if src[3] == 255 {
                target.put_pixel(dest_x + x, dest_y + y, *src);
                continue;
            }
            let dst = *target.get_pixel(dest_x + x, dest_y + y);
            target.put_pixel(dest_x + x, dest_y + y, source_over(*src, dst));
        }
    }
}

/// Copy one frame into the scratch buffer with the tint multiplied in.
///
/// Every scratch pixel is written, so stale content from a previous cell
/// never leaks. Alpha is carried over untouched; the recolor applies to RGB
/// only.
fn stage_tinted_frame(
    scratch: &mut RgbaImage,
    source: &RgbaImage,
    src_x: u32,
    src_y: u32,
    size: u32,
    tint: Tint,
) {
    for y in 0..size {
        for x in 0..size {
            let px = source.get_pixel(src_x + x, src_y + y);
            scratch.put_pixel(
                x,
                y,
                Rgba([
                    multiply_channel(px[0], tint[0]),
                    multiply_channel(px[1], tint[1]),
                    multiply_channel(px[2], tint[2]),
                    px[3],
                ]),
            );
        }
    }
}

fn multiply_channel(channel: u8, tint: u8) -> u8 {
    ((channel as u16 * tint as u16) / 255) as u8
}

/// Porter-Duff source over, per channel in f32.
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let src_alpha = src[3] as f32 / 255.0;
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let composite = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let out = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (out.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    Rgba([
        composite(src[0], dst[0]),
        composite(src[1], dst[1]),
        composite(src[2], dst[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
