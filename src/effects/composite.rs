use crate::foundation::error::{RetouchError, RetouchResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel with an extra opacity multiplier.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite `src` over `dst` (equal-size premultiplied buffers) in place.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> RetouchResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(RetouchError::validation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite a `src_w`x`src_h` buffer over the region of `dst` whose top-left corner is `(x, y)`.
///
/// The region must lie inside `dst`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn over_region_in_place(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    x: u32,
    y: u32,
    opacity: f32,
) -> RetouchResult<()> {
    if dst.len() != (dst_w as usize) * (dst_h as usize) * 4
        || src.len() != (src_w as usize) * (src_h as usize) * 4
    {
        return Err(RetouchError::validation(
            "over_region_in_place expects buffers matching their sizes",
        ));
    }
    if u64::from(x) + u64::from(src_w) > u64::from(dst_w)
        || u64::from(y) + u64::from(src_h) > u64::from(dst_h)
    {
        return Err(RetouchError::validation("region does not fit inside dst"));
    }
    if src_w == 0 || src_h == 0 {
        return Ok(());
    }
    let row = (src_w as usize) * 4;
    for (sy, src_row) in src.chunks_exact(row).enumerate() {
        let start = (((y as usize) + sy) * (dst_w as usize) + x as usize) * 4;
        let dst_row = &mut dst[start..start + row];
        for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Composite `dst` over an opaque background colour in place, leaving every pixel opaque.
pub(crate) fn flatten_onto(dst: &mut [u8], background: [u8; 3]) {
    let bg = [background[0], background[1], background[2], 255];
    for d in dst.chunks_exact_mut(4) {
        let out = over(bg, [d[0], d[1], d[2], d[3]], 1.0);
        d.copy_from_slice(&out);
    }
}

/// Tile a `tile_w`x`tile_h` premultiplied tile over `dst` starting at the origin.
pub(crate) fn tile_over_in_place(
    dst: &mut [u8],
    width: u32,
    height: u32,
    tile: &[u8],
    tile_w: u32,
    tile_h: u32,
) -> RetouchResult<()> {
    if tile_w == 0 || tile_h == 0 || tile.len() != (tile_w as usize) * (tile_h as usize) * 4 {
        return Err(RetouchError::validation("tile buffer does not match tile size"));
    }
    if dst.len() != (width as usize) * (height as usize) * 4 {
        return Err(RetouchError::validation(
            "tile_over_in_place expects dst matching width*height*4",
        ));
    }
    for y in 0..height {
        let ty = y % tile_h;
        for x in 0..width {
            let tx = x % tile_w;
            let ti = ((ty * tile_w + tx) as usize) * 4;
            let di = ((y * width + x) as usize) * 4;
            let s = [tile[ti], tile[ti + 1], tile[ti + 2], tile[ti + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s, 1.0));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
